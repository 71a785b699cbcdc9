//! Error types for buildwatch.

use thiserror::Error;

use crate::status::BuildStatus;

/// Errors raised while rendering a decision.
#[derive(Debug, Error)]
pub enum PresentationError {
    /// No icon asset exists for the status. Recoverable: the icon is left
    /// as it was and the cycle continues.
    #[error("no icon asset for status {status}: {path}")]
    MissingIcon { status: BuildStatus, path: String },

    /// The sink cannot render at all.
    #[error("presentation sink unavailable: {0}")]
    Unavailable(String),
}

impl PresentationError {
    /// `true` when the error can be logged and ignored.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PresentationError::MissingIcon { .. })
    }
}

/// Buildwatch errors.
#[derive(Debug, Error)]
pub enum BuildwatchError {
    /// A status rank outside the known scale.
    #[error("invalid build status rank: {0}")]
    InvalidStatusRank(u8),

    #[error("configuration source error: {0}")]
    ConfigurationSource(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("presentation error: {0}")]
    Presentation(#[from] PresentationError),

    /// The trigger queue consumer has shut down.
    #[error("buildwatch service stopped")]
    ServiceStopped,

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for buildwatch operations.
pub type Result<T> = std::result::Result<T, BuildwatchError>;
