//! Worst-case status aggregation across all monitored projects.
//!
//! [`Aggregator::aggregate`] folds a snapshot into an [`AggregationResult`]
//! and advances the [`StatusHistory`] baseline as it goes.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::StatusHistory;
use crate::model::{all_projects, ProjectKey, Server};
use crate::status::BuildStatus;

/// Outcome of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Worst status, promoted to its in-progress variant when anything is
    /// building. `Indeterminate` when there are no projects.
    pub overall: BuildStatus,
    /// `true` if at least one project is building.
    pub build_in_progress: bool,
    /// Projects at `Failed` or worse.
    pub error_projects: BTreeSet<ProjectKey>,
    /// Projects worse than at their previous observation.
    pub regressing_projects: BTreeSet<ProjectKey>,
    /// Number of projects observed.
    pub project_count: usize,
    pub computed_at: DateTime<Utc>,
}

impl AggregationResult {
    /// Result for a snapshot with no projects.
    pub fn empty() -> Self {
        Self {
            overall: BuildStatus::Indeterminate,
            build_in_progress: false,
            error_projects: BTreeSet::new(),
            regressing_projects: BTreeSet::new(),
            project_count: 0,
            computed_at: Utc::now(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.error_projects.is_empty()
    }

    pub fn has_regressions(&self) -> bool {
        !self.regressing_projects.is_empty()
    }
}

/// Aggregates project snapshots into a single headline status.
pub struct Aggregator;

impl Aggregator {
    /// Aggregate every project of every server.
    ///
    /// Each project's regression check reads its own history entry before
    /// the entry is overwritten with the current details. Iteration order
    /// does not affect the result.
    pub fn aggregate(servers: &[Server], history: &mut StatusHistory) -> AggregationResult {
        let mut worst: Option<BuildStatus> = None;
        let mut result = AggregationResult::empty();

        for project in all_projects(servers) {
            result.project_count += 1;

            worst = Some(match worst {
                Some(w) if !project.status.is_worse(w) => w,
                _ => project.status,
            });
            if project.status.is_error() {
                result.error_projects.insert(project.key.clone());
            }
            if project.status.is_build_in_progress() {
                result.build_in_progress = true;
            }
            if history.is_regressing(project) {
                result.regressing_projects.insert(project.key.clone());
            }
            history.record(project.key.clone(), project.all_build_details.clone());
        }

        let mut overall = worst.unwrap_or(BuildStatus::Indeterminate);
        // Anything building shows motion, even under a worse completed status.
        if result.build_in_progress && !overall.is_build_in_progress() {
            overall = overall.in_progress();
        }
        result.overall = overall;

        tracing::debug!(
            overall = %result.overall,
            projects = result.project_count,
            errors = result.error_projects.len(),
            regressions = result.regressing_projects.len(),
            "aggregated snapshot"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AllBuildDetails;

    fn server(projects: &[(&str, BuildStatus)]) -> Server {
        projects.iter().fold(Server::new("http://ci"), |s, (name, status)| {
            s.with_project(name, AllBuildDetails::new(*status))
        })
    }

    fn names(keys: &BTreeSet<ProjectKey>) -> Vec<&str> {
        keys.iter().map(|k| k.name.as_str()).collect()
    }

    #[test]
    fn test_no_servers_is_indeterminate() {
        let mut history = StatusHistory::new();
        let result = Aggregator::aggregate(&[], &mut history);
        assert_eq!(result.overall, BuildStatus::Indeterminate);
        assert!(!result.build_in_progress);
        assert!(result.error_projects.is_empty());
        assert!(result.regressing_projects.is_empty());
        assert_eq!(result.project_count, 0);
    }

    #[test]
    fn test_servers_without_projects_is_indeterminate() {
        let mut history = StatusHistory::new();
        let result = Aggregator::aggregate(
            &[Server::new("http://a"), Server::new("http://b")],
            &mut history,
        );
        assert_eq!(result.overall, BuildStatus::Indeterminate);
    }

    #[test]
    fn test_worst_status_wins() {
        let mut history = StatusHistory::new();
        let servers = vec![
            server(&[("a", BuildStatus::Successful), ("b", BuildStatus::Unstable)]),
            server(&[("c", BuildStatus::Indeterminate)]),
        ];
        let result = Aggregator::aggregate(&servers, &mut history);
        assert_eq!(result.overall, BuildStatus::Unstable);
        assert!(!result.build_in_progress);
        assert!(result.error_projects.is_empty());
        assert_eq!(result.project_count, 3);
    }

    #[test]
    fn test_failed_plus_successful_building_promotes_failed() {
        let mut history = StatusHistory::new();
        let servers = vec![server(&[
            ("a", BuildStatus::Failed),
            ("b", BuildStatus::SuccessfulBuildInProgress),
        ])];
        let result = Aggregator::aggregate(&servers, &mut history);
        assert_eq!(result.overall, BuildStatus::FailedBuildInProgress);
        assert!(result.build_in_progress);
        assert_eq!(names(&result.error_projects), vec!["a"]);
    }

    #[test]
    fn test_worst_in_progress_is_kept_unchanged() {
        let mut history = StatusHistory::new();
        let servers = vec![server(&[
            ("a", BuildStatus::Successful),
            ("b", BuildStatus::UnstableBuildInProgress),
        ])];
        let result = Aggregator::aggregate(&servers, &mut history);
        assert_eq!(result.overall, BuildStatus::UnstableBuildInProgress);
    }

    #[test]
    fn test_error_set_includes_failed_in_progress() {
        let mut history = StatusHistory::new();
        let servers = vec![server(&[
            ("a", BuildStatus::FailedBuildInProgress),
            ("b", BuildStatus::UnstableBuildInProgress),
            ("c", BuildStatus::Failed),
        ])];
        let result = Aggregator::aggregate(&servers, &mut history);
        assert_eq!(names(&result.error_projects), vec!["a", "c"]);
        assert_eq!(result.overall, BuildStatus::FailedBuildInProgress);
    }

    #[test]
    fn test_regression_across_cycles() {
        let mut history = StatusHistory::new();

        let passing = [server(&[("p", BuildStatus::Successful)])];
        let failing = [server(&[("p", BuildStatus::Failed)])];

        let first = Aggregator::aggregate(&passing, &mut history);
        assert!(first.regressing_projects.is_empty());

        let second = Aggregator::aggregate(&failing, &mut history);
        assert_eq!(names(&second.regressing_projects), vec!["p"]);

        let third = Aggregator::aggregate(&failing, &mut history);
        assert!(third.regressing_projects.is_empty());
    }

    #[test]
    fn test_history_reflects_immediately_preceding_cycle() {
        let mut history = StatusHistory::new();
        let p = ProjectKey::new("http://ci", "p");
        for status in [BuildStatus::Successful, BuildStatus::Unstable, BuildStatus::Successful] {
            Aggregator::aggregate(&[server(&[("p", status)])], &mut history);
            assert_eq!(
                history.previous(&p).flatten().map(|d| d.status),
                Some(status)
            );
        }
    }

    #[test]
    fn test_lost_details_count_as_regression() {
        let mut history = StatusHistory::new();
        Aggregator::aggregate(&[server(&[("p", BuildStatus::Successful)])], &mut history);
        let bare = Server::new("http://ci").with_bare_project("p", BuildStatus::Indeterminate);
        let result = Aggregator::aggregate(&[bare], &mut history);
        assert_eq!(names(&result.regressing_projects), vec!["p"]);
        assert_eq!(
            history.previous(&ProjectKey::new("http://ci", "p")),
            Some(None)
        );
    }

    #[test]
    fn test_same_name_on_two_servers_is_tracked_separately() {
        let mut history = StatusHistory::new();
        let core_on = |url: &str, status| {
            Server::new(url).with_project("core", AllBuildDetails::new(status))
        };
        let servers = vec![
            core_on("http://a", BuildStatus::Successful),
            core_on("http://b", BuildStatus::Failed),
        ];
        Aggregator::aggregate(&servers, &mut history);
        assert_eq!(history.len(), 2);

        let servers = vec![
            core_on("http://a", BuildStatus::Unstable),
            core_on("http://b", BuildStatus::Failed),
        ];
        let result = Aggregator::aggregate(&servers, &mut history);
        let regressing: Vec<_> = result.regressing_projects.iter().collect();
        assert_eq!(regressing, vec![&ProjectKey::new("http://a", "core")]);
    }

    #[test]
    fn test_result_independent_of_order() {
        let forward = vec![server(&[
            ("a", BuildStatus::Unstable),
            ("b", BuildStatus::SuccessfulBuildInProgress),
            ("c", BuildStatus::Failed),
        ])];
        let mut reversed = forward.clone();
        reversed[0].projects.reverse();

        let mut h1 = StatusHistory::new();
        let mut h2 = StatusHistory::new();
        let r1 = Aggregator::aggregate(&forward, &mut h1);
        let r2 = Aggregator::aggregate(&reversed, &mut h2);
        assert_eq!(r1.overall, r2.overall);
        assert_eq!(r1.error_projects, r2.error_projects);
        assert_eq!(h1, h2);
    }
}
