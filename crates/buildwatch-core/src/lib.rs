//! Buildwatch Core Library
//!
//! Aggregates CI build statuses into a single worst-case tray status and
//! decides which notifications to show:
//! - [`status`]: the build severity scale
//! - [`aggregator`]: worst status, in-progress flag, error and regression sets
//! - [`notify`]: icon choice and at most one balloon message per cycle
//! - [`service`]: serialized cycles driven by a trigger queue

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fakes;
pub mod history;
pub mod icons;
pub mod model;
pub mod notify;
pub mod obs;
pub mod ports;
pub mod service;
pub mod sink;
pub mod snapshot;
pub mod status;
pub mod telemetry;

pub use aggregator::{AggregationResult, Aggregator};
pub use config::{BuildwatchConfig, ConfigError, ConfigLoader, LogFormat, LoggingConfig};
pub use error::{BuildwatchError, PresentationError, Result};
pub use history::StatusHistory;
pub use icons::IconSet;
pub use model::{AllBuildDetails, BuildDetails, Project, ProjectKey, Server};
pub use notify::{Decision, Notification, NotificationDecider, NotificationKind};
pub use ports::{ConfigurationSource, PresentationSink, UpdateSource};
pub use service::{BuildwatchService, CycleOutcome, CycleRunner, TrayState, Trigger, TriggerHandle};
pub use sink::LogSink;
pub use snapshot::{FileSnapshotSource, Snapshot};
pub use status::BuildStatus;
pub use telemetry::{init_from_config, init_tracing};

/// Buildwatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
