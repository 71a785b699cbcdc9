//! Build status severity scale.
//!
//! [`BuildStatus`] is a closed, totally ordered enumeration. Every completed
//! status is immediately followed by its "build in progress" twin, so the
//! in-progress variant of a status always sits at `rank + 1`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BuildwatchError, Result};

/// Severity of a project's build, ordered by ascending badness.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// No build information could be determined.
    #[default]
    Indeterminate,
    IndeterminateBuildInProgress,
    Successful,
    SuccessfulBuildInProgress,
    Unstable,
    UnstableBuildInProgress,
    Failed,
    FailedBuildInProgress,
}

impl BuildStatus {
    /// Lowest severity.
    pub const MIN: BuildStatus = BuildStatus::Indeterminate;

    /// Highest severity.
    pub const MAX: BuildStatus = BuildStatus::FailedBuildInProgress;

    /// All statuses in rank order.
    pub const ALL: [BuildStatus; 8] = [
        BuildStatus::Indeterminate,
        BuildStatus::IndeterminateBuildInProgress,
        BuildStatus::Successful,
        BuildStatus::SuccessfulBuildInProgress,
        BuildStatus::Unstable,
        BuildStatus::UnstableBuildInProgress,
        BuildStatus::Failed,
        BuildStatus::FailedBuildInProgress,
    ];

    /// Severity rank; higher is worse.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Look up a status by rank.
    ///
    /// Ranks outside the known scale are a contract violation and are
    /// reported as [`BuildwatchError::InvalidStatusRank`], never clamped.
    pub fn from_rank(rank: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(rank))
            .copied()
            .ok_or(BuildwatchError::InvalidStatusRank(rank))
    }

    /// Total order by severity rank.
    pub fn compare(self, other: BuildStatus) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    /// `true` iff `self` is strictly worse than `other`.
    pub fn is_worse(self, other: BuildStatus) -> bool {
        self.rank() > other.rank()
    }

    /// `true` for the designated in-progress variants.
    pub fn is_build_in_progress(self) -> bool {
        matches!(
            self,
            BuildStatus::IndeterminateBuildInProgress
                | BuildStatus::SuccessfulBuildInProgress
                | BuildStatus::UnstableBuildInProgress
                | BuildStatus::FailedBuildInProgress
        )
    }

    /// Map an in-progress variant to its base status.
    ///
    /// Only meant for display grouping; aggregation always works on the
    /// undegraded value.
    pub fn degrade(self) -> BuildStatus {
        match self {
            BuildStatus::IndeterminateBuildInProgress => BuildStatus::Indeterminate,
            BuildStatus::SuccessfulBuildInProgress => BuildStatus::Successful,
            BuildStatus::UnstableBuildInProgress => BuildStatus::Unstable,
            BuildStatus::FailedBuildInProgress => BuildStatus::Failed,
            other => other,
        }
    }

    /// The paired in-progress variant (`rank + 1` for completed statuses).
    pub fn in_progress(self) -> BuildStatus {
        match self {
            BuildStatus::Indeterminate => BuildStatus::IndeterminateBuildInProgress,
            BuildStatus::Successful => BuildStatus::SuccessfulBuildInProgress,
            BuildStatus::Unstable => BuildStatus::UnstableBuildInProgress,
            BuildStatus::Failed => BuildStatus::FailedBuildInProgress,
            other => other,
        }
    }

    /// `true` for `Failed` and anything ranked above it.
    pub fn is_error(self) -> bool {
        self >= BuildStatus::Failed
    }

    /// Canonical key, also used to name icon assets.
    pub fn key(self) -> &'static str {
        match self {
            BuildStatus::Indeterminate => "Indeterminate",
            BuildStatus::IndeterminateBuildInProgress => "Indeterminate_BuildInProgress",
            BuildStatus::Successful => "Successful",
            BuildStatus::SuccessfulBuildInProgress => "Successful_BuildInProgress",
            BuildStatus::Unstable => "Unstable",
            BuildStatus::UnstableBuildInProgress => "Unstable_BuildInProgress",
            BuildStatus::Failed => "Failed",
            BuildStatus::FailedBuildInProgress => "Failed_BuildInProgress",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl TryFrom<u8> for BuildStatus {
    type Error = BuildwatchError;

    fn try_from(rank: u8) -> Result<Self> {
        Self::from_rank(rank)
    }
}
