//! Structured observability hooks for buildwatch cycle events.
//!
//! This module provides:
//! - Cycle-scoped tracing spans via [`cycle_span`]
//! - Emission functions for key lifecycle events: start, finish, abandon,
//!   notification, and missing icon assets
//!
//! Events are emitted at `info!` level unless noted (configurable via
//! `RUST_LOG`).

use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::aggregator::AggregationResult;
use crate::error::PresentationError;
use crate::notify::{Decision, Notification};

/// Span tagging everything inside one cycle with its `cycle_id`.
///
/// Attach with `tracing::Instrument` so it survives `.await` points.
pub fn cycle_span(cycle_id: &Uuid, reason: &str) -> Span {
    tracing::info_span!("buildwatch.cycle", cycle_id = %cycle_id, reason = %reason)
}

/// Emit event: cycle started for a trigger.
pub fn emit_cycle_started(reason: &str) {
    info!(event = "cycle.started", reason = %reason);
}

/// Emit event: cycle completed and its state committed.
pub fn emit_cycle_finished(result: &AggregationResult, decision: &Decision, duration_ms: u64) {
    info!(
        event = "cycle.finished",
        overall = %result.overall,
        build_in_progress = result.build_in_progress,
        projects = result.project_count,
        errors = result.error_projects.len(),
        regressions = result.regressing_projects.len(),
        notified = decision.notification.is_some(),
        duration_ms = duration_ms,
    );
}

/// Emit event: cycle abandoned, prior state kept (error level).
pub fn emit_cycle_abandoned(error: &dyn std::fmt::Display) {
    tracing::error!(event = "cycle.abandoned", error = %error);
}

/// Emit event: a balloon message was handed to the sink.
pub fn emit_notification(notification: &Notification) {
    info!(
        event = "notification.emitted",
        kind = ?notification.kind,
        caption = %notification.caption,
        projects = notification.projects.len(),
    );
}

/// Emit event: icon asset missing; icon left unchanged (warning level).
pub fn emit_icon_missing(error: &PresentationError) {
    warn!(event = "icon.missing", error = %error);
}
