//! Presentation sink that renders through `tracing`.
//!
//! Stands in for a desktop tray: icon switches and balloon messages are
//! logged, and the icon asset is resolved from an [`IconSet`] so missing
//! assets surface exactly as they would in a graphical tray.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::PresentationError;
use crate::icons::IconSet;
use crate::notify::{Notification, NotificationKind};
use crate::ports::PresentationSink;
use crate::status::BuildStatus;

/// Logs decisions and tracks the icon currently shown.
pub struct LogSink {
    icons: IconSet,
    balloon_timeout: Duration,
    current_icon: Mutex<Option<(BuildStatus, PathBuf)>>,
}

impl LogSink {
    pub fn new(icons: IconSet, balloon_timeout: Duration) -> Self {
        Self {
            icons,
            balloon_timeout,
            current_icon: Mutex::new(None),
        }
    }

    /// Status whose icon is currently shown, if any was ever resolved.
    pub fn current_icon(&self) -> Option<BuildStatus> {
        self.current_icon
            .lock()
            .ok()
            .and_then(|icon| icon.as_ref().map(|(status, _)| *status))
    }
}

impl PresentationSink for LogSink {
    fn show_icon(&self, status: BuildStatus) -> Result<(), PresentationError> {
        let path = self.icons.resolve(status)?;
        let mut current = self
            .current_icon
            .lock()
            .map_err(|_| PresentationError::Unavailable("icon state poisoned".to_string()))?;
        if current.as_ref().map(|(s, _)| *s) != Some(status) {
            info!(status = %status, icon = %path.display(), "tray icon changed");
        }
        *current = Some((status, path));
        Ok(())
    }

    fn show_notification(&self, notification: &Notification) -> Result<(), PresentationError> {
        let timeout_ms = self.balloon_timeout.as_millis() as u64;
        match notification.kind {
            NotificationKind::Error => error!(
                caption = %notification.caption,
                timeout_ms = timeout_ms,
                "{}",
                notification.body
            ),
            NotificationKind::Regression => warn!(
                caption = %notification.caption,
                timeout_ms = timeout_ms,
                "{}",
                notification.body
            ),
            NotificationKind::Info => info!(
                caption = %notification.caption,
                timeout_ms = timeout_ms,
                "{}",
                notification.body
            ),
        }
        Ok(())
    }
}
