//! Collaborator interfaces around the aggregation core.
//!
//! - [`ConfigurationSource`]: the configured servers with their latest
//!   project snapshots
//! - [`UpdateSource`]: on-demand refresh of those snapshots
//! - [`PresentationSink`]: renders icon changes and balloon messages
//!
//! In-memory implementations for tests live in [`crate::fakes`].

use async_trait::async_trait;

use crate::error::{PresentationError, Result};
use crate::model::Server;
use crate::notify::Notification;
use crate::status::BuildStatus;

/// Supplies the current list of servers and their projects.
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    /// Current servers. Called once at the start of each cycle.
    async fn servers(&self) -> Result<Vec<Server>>;
}

/// Polls CI servers for fresh project statuses.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Request a refresh now.
    ///
    /// Never fails from the caller's point of view: transient errors are
    /// handled inside the source, which simply keeps its last snapshot.
    async fn refresh(&self);
}

/// Renders decisions to the user.
pub trait PresentationSink: Send + Sync {
    /// Switch the tray icon. [`PresentationError::MissingIcon`] leaves the
    /// current icon in place.
    fn show_icon(&self, status: BuildStatus) -> std::result::Result<(), PresentationError>;

    /// Show a balloon message.
    fn show_notification(
        &self,
        notification: &Notification,
    ) -> std::result::Result<(), PresentationError>;
}
