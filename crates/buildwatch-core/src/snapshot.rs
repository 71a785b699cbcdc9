//! File-backed snapshot source.
//!
//! Reads a JSON document of the form `{ "servers": [...] }`, written by an
//! external poller. Serves both as the [`ConfigurationSource`] and the
//! [`UpdateSource`]: a refresh re-reads the file and keeps the previous
//! snapshot if the read fails.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{BuildwatchError, Result};
use crate::model::Server;
use crate::ports::{ConfigurationSource, UpdateSource};

/// On-disk snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub servers: Vec<Server>,
}

impl Snapshot {
    /// Read and parse a snapshot file.
    pub async fn read(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            BuildwatchError::Snapshot(format!("failed to read {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        Ok(snapshot)
    }
}

/// Snapshot source reading from a JSON file.
pub struct FileSnapshotSource {
    path: PathBuf,
    current: RwLock<Vec<Server>>,
}

impl FileSnapshotSource {
    /// Open `path` and load the initial snapshot.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = Snapshot::read(&path).await?;
        Ok(Self {
            path,
            current: RwLock::new(snapshot.servers),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, replacing the cached servers on success.
    pub async fn reload(&self) -> Result<usize> {
        let snapshot = Snapshot::read(&self.path).await?;
        let count = snapshot.servers.len();
        *self.current.write().await = snapshot.servers;
        Ok(count)
    }
}

#[async_trait]
impl ConfigurationSource for FileSnapshotSource {
    async fn servers(&self) -> Result<Vec<Server>> {
        Ok(self.current.read().await.clone())
    }
}

#[async_trait]
impl UpdateSource for FileSnapshotSource {
    async fn refresh(&self) {
        match self.reload().await {
            Ok(count) => debug!(path = %self.path.display(), servers = count, "snapshot reloaded"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "snapshot refresh failed, keeping previous snapshot"
            ),
        }
    }
}
