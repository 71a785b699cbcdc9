//! In-memory fakes for collaborator ports (testing only)
//!
//! Provides `MemoryConfigurationSource`, `CountingUpdateSource`, and
//! `RecordingSink` that satisfy the port contracts without touching disk.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{BuildwatchError, PresentationError, Result};
use crate::model::Server;
use crate::notify::Notification;
use crate::ports::{ConfigurationSource, PresentationSink, UpdateSource};
use crate::status::BuildStatus;

// ---------------------------------------------------------------------------
// MemoryConfigurationSource
// ---------------------------------------------------------------------------

/// Configuration source serving whatever servers were last set.
#[derive(Debug, Default)]
pub struct MemoryConfigurationSource {
    servers: Mutex<Vec<Server>>,
    fail: AtomicBool,
}

impl MemoryConfigurationSource {
    pub fn new(servers: Vec<Server>) -> Self {
        Self {
            servers: Mutex::new(servers),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_servers(&self, servers: Vec<Server>) {
        *self.servers.lock().unwrap() = servers;
    }

    /// Make subsequent `servers()` calls fail until reset.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigurationSource for MemoryConfigurationSource {
    async fn servers(&self) -> Result<Vec<Server>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BuildwatchError::ConfigurationSource(
                "configuration unavailable".to_string(),
            ));
        }
        Ok(self.servers.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// CountingUpdateSource
// ---------------------------------------------------------------------------

/// Update source that only counts refresh requests.
#[derive(Debug, Default)]
pub struct CountingUpdateSource {
    refreshes: AtomicUsize,
}

impl CountingUpdateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateSource for CountingUpdateSource {
    async fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// One rendered item, in the order the sink received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Icon(BuildStatus),
    Notification(Notification),
}

/// Sink that records everything it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingSink {
    rendered: Mutex<Vec<Rendered>>,
    missing_icons: Mutex<HashSet<BuildStatus>>,
    unavailable: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend no asset exists for `status`.
    pub fn without_icon(self, status: BuildStatus) -> Self {
        self.missing_icons.lock().unwrap().insert(status);
        self
    }

    /// Make every render call fail with a non-recoverable error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn rendered(&self) -> Vec<Rendered> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn icons(&self) -> Vec<BuildStatus> {
        self.rendered()
            .into_iter()
            .filter_map(|r| match r {
                Rendered::Icon(status) => Some(status),
                Rendered::Notification(_) => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.rendered()
            .into_iter()
            .filter_map(|r| match r {
                Rendered::Notification(n) => Some(n),
                Rendered::Icon(_) => None,
            })
            .collect()
    }

    fn check_available(&self) -> std::result::Result<(), PresentationError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PresentationError::Unavailable("sink closed".to_string()));
        }
        Ok(())
    }
}

impl PresentationSink for RecordingSink {
    fn show_icon(&self, status: BuildStatus) -> std::result::Result<(), PresentationError> {
        self.check_available()?;
        if self.missing_icons.lock().unwrap().contains(&status) {
            return Err(PresentationError::MissingIcon {
                status,
                path: format!("{}.gif", status.key()),
            });
        }
        self.rendered.lock().unwrap().push(Rendered::Icon(status));
        Ok(())
    }

    fn show_notification(
        &self,
        notification: &Notification,
    ) -> std::result::Result<(), PresentationError> {
        self.check_available()?;
        self.rendered
            .lock()
            .unwrap()
            .push(Rendered::Notification(notification.clone()));
        Ok(())
    }
}
