//! Snapshot model: servers, projects, and their build details.
//!
//! These are read-only views as delivered by the update source. The
//! aggregation core never mutates them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::BuildStatus;

/// Identifies a monitored project: its name on a given server.
///
/// Ordering is by project name first, then server URL, which is the order
/// used when listing projects to the user.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectKey {
    pub name: String,
    pub server: String,
}

impl ProjectKey {
    pub fn new(server: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
        }
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Metadata for a single build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDetails {
    /// Build number as reported by the CI server.
    pub number: u64,
    pub time: DateTime<Utc>,
    /// Users whose changes went into the build.
    #[serde(default)]
    pub users: Vec<String>,
}

/// Everything known about a project's builds.
///
/// Treated as opaque by the core, except for `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllBuildDetails {
    pub status: BuildStatus,
    #[serde(default)]
    pub last_build: Option<BuildDetails>,
    #[serde(default)]
    pub last_successful_build: Option<BuildDetails>,
    #[serde(default)]
    pub last_failed_build: Option<BuildDetails>,
}

impl AllBuildDetails {
    pub fn new(status: BuildStatus) -> Self {
        Self {
            status,
            last_build: None,
            last_successful_build: None,
            last_failed_build: None,
        }
    }

    /// Set the most recent build.
    pub fn with_last_build(mut self, build: BuildDetails) -> Self {
        self.last_build = Some(build);
        self
    }

    /// Set the most recent successful build.
    pub fn with_last_successful_build(mut self, build: BuildDetails) -> Self {
        self.last_successful_build = Some(build);
        self
    }

    /// Set the most recent failed build.
    pub fn with_last_failed_build(mut self, build: BuildDetails) -> Self {
        self.last_failed_build = Some(build);
        self
    }
}

/// A monitored project in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub key: ProjectKey,
    pub status: BuildStatus,
    /// `None` means the server returned no build data.
    #[serde(default)]
    pub all_build_details: Option<AllBuildDetails>,
}

impl Project {
    /// Project whose status mirrors its build details.
    pub fn new(key: ProjectKey, details: AllBuildDetails) -> Self {
        Self {
            key,
            status: details.status,
            all_build_details: Some(details),
        }
    }

    /// Project with no build data available.
    pub fn without_details(key: ProjectKey, status: BuildStatus) -> Self {
        Self {
            key,
            status,
            all_build_details: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }
}

/// A CI server and the projects monitored on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: None,
            projects: Vec::new(),
        }
    }

    /// Add a project with full build details, keyed under this server.
    pub fn with_project(mut self, name: &str, details: AllBuildDetails) -> Self {
        let key = ProjectKey::new(self.url.clone(), name);
        self.projects.push(Project::new(key, details));
        self
    }

    /// Add a project that has no build data.
    pub fn with_bare_project(mut self, name: &str, status: BuildStatus) -> Self {
        let key = ProjectKey::new(self.url.clone(), name);
        self.projects.push(Project::without_details(key, status));
        self
    }

    /// Name shown to users; falls back to the URL.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.url)
    }
}

/// Iterate every project of every server.
pub fn all_projects(servers: &[Server]) -> impl Iterator<Item = &Project> {
    servers.iter().flat_map(|s| s.projects.iter())
}
