//! Cycle orchestration: snapshot, aggregate, decide, render, commit.
//!
//! [`CycleRunner`] owns the cross-cycle state ([`TrayState`]) behind a
//! single async mutex, so at most one cycle touches it at a time.
//! [`BuildwatchService`] is the single consumer of a trigger queue; triggers
//! that pile up while a cycle runs are merged into one pending batch, so no
//! trigger kind is ever lost and memory stays bounded.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::aggregator::{AggregationResult, Aggregator};
use crate::error::{BuildwatchError, Result};
use crate::history::StatusHistory;
use crate::notify::{Decision, Notification, NotificationDecider};
use crate::obs;
use crate::ports::{ConfigurationSource, PresentationSink, UpdateSource};
use crate::status::BuildStatus;

/// State carried from one cycle to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrayState {
    pub history: StatusHistory,
    pub last_displayed: BuildStatus,
}

/// Result of a committed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub cycle_id: Uuid,
    pub result: AggregationResult,
    pub decision: Decision,
}

/// Why a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The configured servers or projects changed.
    ConfigurationChanged,
    /// The update source finished a poll.
    ProjectsUpdated,
    /// The user asked for a refresh now.
    RefreshRequested,
    /// The user asked for the status summary.
    ShowStatus,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::ConfigurationChanged => "configuration_changed",
            Trigger::ProjectsUpdated => "projects_updated",
            Trigger::RefreshRequested => "refresh_requested",
            Trigger::ShowStatus => "show_status",
        };
        f.write_str(name)
    }
}

/// Runs cycles against the collaborators and owns [`TrayState`].
pub struct CycleRunner {
    configuration: Arc<dyn ConfigurationSource>,
    updates: Arc<dyn UpdateSource>,
    sink: Arc<dyn PresentationSink>,
    state: Mutex<TrayState>,
}

impl CycleRunner {
    pub fn new(
        configuration: Arc<dyn ConfigurationSource>,
        updates: Arc<dyn UpdateSource>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            configuration,
            updates,
            sink,
            state: Mutex::new(TrayState::default()),
        }
    }

    /// Run one full cycle.
    ///
    /// Aggregation works on a copy of the history; the copy and the new
    /// displayed status are committed only once rendering succeeded. On
    /// error the cycle is abandoned and the previous state kept.
    pub async fn run_cycle(&self, reason: &str) -> Result<CycleOutcome> {
        let cycle_id = Uuid::new_v4();
        let span = obs::cycle_span(&cycle_id, reason);
        async {
            obs::emit_cycle_started(reason);
            let started = Instant::now();
            let outcome = self.cycle(cycle_id).await;
            match &outcome {
                Ok(o) => obs::emit_cycle_finished(
                    &o.result,
                    &o.decision,
                    started.elapsed().as_millis() as u64,
                ),
                Err(e) => obs::emit_cycle_abandoned(e),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn cycle(&self, cycle_id: Uuid) -> Result<CycleOutcome> {
        let mut state = self.state.lock().await;
        let servers = self.configuration.servers().await?;

        let mut history = state.history.clone();
        let result = Aggregator::aggregate(&servers, &mut history);
        let decision = NotificationDecider::decide(&result, state.last_displayed);
        self.render(&decision)?;

        state.history = history;
        state.last_displayed = decision.new_icon;
        Ok(CycleOutcome {
            cycle_id,
            result,
            decision,
        })
    }

    fn render(&self, decision: &Decision) -> Result<()> {
        match self.sink.show_icon(decision.new_icon) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => obs::emit_icon_missing(&e),
            Err(e) => return Err(e.into()),
        }
        if let Some(notification) = &decision.notification {
            self.sink.show_notification(notification)?;
            obs::emit_notification(notification);
        }
        Ok(())
    }

    /// Ask the update source for fresh data, then run a cycle.
    pub async fn refresh(&self) -> Result<CycleOutcome> {
        self.updates.refresh().await;
        self.run_cycle(&Trigger::RefreshRequested.to_string()).await
    }

    /// Show the grouped status of every known project.
    pub async fn show_status_summary(&self) -> Result<Notification> {
        let state = self.state.lock().await;
        let summary = NotificationDecider::status_summary(&state.history);
        self.sink.show_notification(&summary)?;
        obs::emit_notification(&summary);
        Ok(summary)
    }

    /// Forget all recorded project history.
    pub async fn reset_history(&self) {
        self.state.lock().await.history.reset();
    }

    /// Copy of the current cross-cycle state.
    pub async fn state(&self) -> TrayState {
        self.state.lock().await.clone()
    }

    pub async fn last_displayed(&self) -> BuildStatus {
        self.state.lock().await.last_displayed
    }
}

/// Triggers drained from the queue in one go.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TriggerBatch {
    refresh: bool,
    cycle: bool,
    show_status: bool,
}

impl TriggerBatch {
    fn add(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::RefreshRequested => self.refresh = true,
            Trigger::ConfigurationChanged | Trigger::ProjectsUpdated => self.cycle = true,
            Trigger::ShowStatus => self.show_status = true,
        }
    }

    fn is_empty(&self) -> bool {
        !(self.refresh || self.cycle || self.show_status)
    }
}

/// Pending batch shared between the handles and the consumer loop.
#[derive(Debug, Default)]
struct TriggerQueue {
    pending: std::sync::Mutex<TriggerBatch>,
    wake: Notify,
    senders: AtomicUsize,
    stopped: AtomicBool,
}

impl TriggerQueue {
    fn push(&self, trigger: Trigger) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(trigger);
        self.wake.notify_one();
    }

    fn take(&self) -> TriggerBatch {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Cloneable sender side of the trigger queue.
pub struct TriggerHandle {
    queue: Arc<TriggerQueue>,
}

impl TriggerHandle {
    fn new(queue: Arc<TriggerQueue>) -> Self {
        queue.senders.fetch_add(1, Ordering::SeqCst);
        Self { queue }
    }

    /// Queue a trigger without waiting.
    ///
    /// A trigger already pending for the next batch absorbs duplicates.
    /// Fails only once the service has stopped.
    pub fn send(&self, trigger: Trigger) -> Result<()> {
        if self.queue.stopped.load(Ordering::SeqCst) {
            return Err(BuildwatchError::ServiceStopped);
        }
        debug!(trigger = %trigger, "trigger queued");
        self.queue.push(trigger);
        Ok(())
    }

    pub fn configuration_changed(&self) -> Result<()> {
        self.send(Trigger::ConfigurationChanged)
    }

    pub fn projects_updated(&self) -> Result<()> {
        self.send(Trigger::ProjectsUpdated)
    }

    pub fn refresh_now(&self) -> Result<()> {
        self.send(Trigger::RefreshRequested)
    }

    pub fn show_status(&self) -> Result<()> {
        self.send(Trigger::ShowStatus)
    }
}

impl Clone for TriggerHandle {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.queue))
    }
}

impl Drop for TriggerHandle {
    fn drop(&mut self) {
        if self.queue.senders.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.queue.wake.notify_one();
        }
    }
}

/// Single-consumer loop draining the trigger queue.
pub struct BuildwatchService {
    runner: Arc<CycleRunner>,
    queue: Arc<TriggerQueue>,
}

impl BuildwatchService {
    pub fn new(runner: Arc<CycleRunner>) -> (Self, TriggerHandle) {
        let queue = Arc::new(TriggerQueue::default());
        let handle = TriggerHandle::new(Arc::clone(&queue));
        (Self { runner, queue }, handle)
    }

    pub fn runner(&self) -> Arc<CycleRunner> {
        Arc::clone(&self.runner)
    }

    /// Process triggers until every [`TriggerHandle`] is dropped.
    ///
    /// Triggers still pending at that point are processed first. Returns
    /// the number of batches processed. Cycle failures, including panics,
    /// are logged and never end the loop.
    pub async fn run(self) -> usize {
        let mut batches = 0;
        loop {
            // Read before taking: no trigger can follow the last handle drop.
            let closed = self.queue.senders.load(Ordering::SeqCst) == 0;
            let batch = self.queue.take();
            if batch.is_empty() {
                if closed {
                    break;
                }
                self.queue.wake.notified().await;
                continue;
            }
            batches += 1;

            let runner = Arc::clone(&self.runner);
            let handled = tokio::spawn(async move { Self::handle(&runner, batch).await }).await;
            if let Err(join_error) = handled {
                obs::emit_cycle_abandoned(&join_error);
            }
        }
        debug!(batches = batches, "trigger queue closed, service stopping");
        batches
    }

    async fn handle(runner: &CycleRunner, batch: TriggerBatch) {
        // Errors were already reported through `obs` by the runner.
        if batch.refresh {
            let _ = runner.refresh().await;
        } else if batch.cycle {
            let _ = runner
                .run_cycle(&Trigger::ProjectsUpdated.to_string())
                .await;
        }
        if batch.show_status {
            if let Err(e) = runner.show_status_summary().await {
                obs::emit_cycle_abandoned(&e);
            }
        }
    }
}

impl Drop for BuildwatchService {
    fn drop(&mut self) {
        self.queue.stopped.store(true, Ordering::SeqCst);
    }
}
