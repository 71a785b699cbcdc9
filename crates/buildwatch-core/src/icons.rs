//! Tray icon asset lookup.

use std::path::{Path, PathBuf};

use crate::error::PresentationError;
use crate::status::BuildStatus;

/// Default asset extension.
pub const ICON_EXTENSION: &str = "gif";

/// Directory of per-status icon files named `<Status>.<ext>`,
/// e.g. `Failed_BuildInProgress.gif`.
#[derive(Debug, Clone)]
pub struct IconSet {
    dir: PathBuf,
    extension: String,
}

impl IconSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: ICON_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the asset for `status` would live at.
    pub fn path_for(&self, status: BuildStatus) -> PathBuf {
        self.dir
            .join(format!("{}.{}", status.key(), self.extension))
    }

    /// Resolve the asset for `status`, failing if the file does not exist.
    pub fn resolve(&self, status: BuildStatus) -> Result<PathBuf, PresentationError> {
        let path = self.path_for(status);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PresentationError::MissingIcon {
                status,
                path: path.display().to_string(),
            })
        }
    }
}
