//! Daemon configuration.
//!
//! Loaded with `figment`, lowest to highest precedence:
//! 1. Programmatic defaults
//! 2. A TOML file (optional; missing files are skipped)
//! 3. `BUILDWATCH_*` environment variables, `__` separating nested keys
//!    (e.g. `BUILDWATCH_LOGGING__LEVEL=debug`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "BUILDWATCH_";

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("snapshot_path cannot be empty")]
    EmptySnapshotPath,

    #[error("invalid poll_interval_secs: {0}. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("invalid balloon_timeout_secs: {0}. Must be at least 1")]
    InvalidBalloonTimeout(u64),

    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Top-level buildwatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildwatchConfig {
    /// JSON snapshot of servers and project statuses.
    pub snapshot_path: PathBuf,
    /// Seconds between refresh requests.
    pub poll_interval_secs: u64,
    /// Directory holding `<Status>.gif` tray icons.
    pub icons_dir: PathBuf,
    /// How long balloon messages stay visible.
    pub balloon_timeout_secs: u64,
    pub logging: LoggingConfig,
}

impl Default for BuildwatchConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("buildwatch-snapshot.json"),
            poll_interval_secs: 60,
            icons_dir: PathBuf::from("icons"),
            balloon_timeout_secs: 10,
            logging: LoggingConfig::default(),
        }
    }
}

impl BuildwatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn balloon_timeout(&self) -> Duration {
        Duration::from_secs(self.balloon_timeout_secs)
    }
}

/// Loads and validates [`BuildwatchConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, then `path` (if given), then the environment.
    pub fn load(path: Option<&Path>) -> Result<BuildwatchConfig, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`ConfigLoader::load`] with a custom environment prefix.
    pub fn load_with_prefix(
        path: Option<&Path>,
        env_prefix: &str,
    ) -> Result<BuildwatchConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(BuildwatchConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: BuildwatchConfig = figment
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .map_err(Box::new)?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &BuildwatchConfig) -> Result<(), ConfigError> {
        if config.snapshot_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptySnapshotPath);
        }
        if config.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(config.poll_interval_secs));
        }
        if config.balloon_timeout_secs == 0 {
            return Err(ConfigError::InvalidBalloonTimeout(
                config.balloon_timeout_secs,
            ));
        }
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        Ok(())
    }
}
