//! Last observed build details per project.
//!
//! [`StatusHistory`] is the baseline used to detect regressions. It is only
//! written by the aggregator, one entry per project per cycle, and entries
//! outlive the project's presence in the configuration until
//! [`StatusHistory::reset`] is called.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{AllBuildDetails, Project, ProjectKey};
use crate::status::BuildStatus;

/// Mapping from project identity to the build details seen last cycle.
///
/// A present key with a `None` value means the project was observed but had
/// no build data; an absent key means it was never observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusHistory {
    entries: HashMap<ProjectKey, Option<AllBuildDetails>>,
}

impl StatusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous entry for `key`: `None` if never observed.
    pub fn previous(&self, key: &ProjectKey) -> Option<Option<&AllBuildDetails>> {
        self.entries.get(key).map(Option::as_ref)
    }

    /// Overwrite the entry for `key`.
    pub fn record(&mut self, key: ProjectKey, details: Option<AllBuildDetails>) {
        self.entries.insert(key, details);
    }

    /// Whether `project` is worse now than at its last observation.
    ///
    /// No baseline (never seen, or seen without data) is never a regression.
    /// Losing build data after having some counts as one.
    pub fn is_regressing(&self, project: &Project) -> bool {
        let previous = match self.previous(&project.key) {
            Some(Some(previous)) => previous,
            _ => return false,
        };
        match &project.all_build_details {
            None => true,
            Some(current) => current.status.is_worse(previous.status),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every project.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Group projects by display status.
    ///
    /// In-progress statuses are folded into their base status and projects
    /// without build data land in `Indeterminate`. Groups iterate in
    /// ascending severity, projects by name.
    pub fn projects_by_status(&self) -> BTreeMap<BuildStatus, BTreeSet<ProjectKey>> {
        let mut groups: BTreeMap<BuildStatus, BTreeSet<ProjectKey>> = BTreeMap::new();
        for (key, details) in &self.entries {
            let status = details
                .as_ref()
                .map(|d| d.status.degrade())
                .unwrap_or(BuildStatus::Indeterminate);
            groups.entry(status).or_default().insert(key.clone());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ProjectKey {
        ProjectKey::new("http://ci", name)
    }

    fn project(name: &str, status: BuildStatus) -> Project {
        Project::new(key(name), AllBuildDetails::new(status))
    }

    #[test]
    fn test_unknown_project_is_not_regressing() {
        let history = StatusHistory::new();
        assert!(!history.is_regressing(&project("p", BuildStatus::Failed)));
    }

    #[test]
    fn test_null_baseline_is_not_regressing() {
        let mut history = StatusHistory::new();
        history.record(key("p"), None);
        assert_eq!(history.previous(&key("p")), Some(None));
        assert!(!history.is_regressing(&project("p", BuildStatus::Failed)));
    }

    #[test]
    fn test_losing_details_is_regressing() {
        let mut history = StatusHistory::new();
        history.record(key("p"), Some(AllBuildDetails::new(BuildStatus::Successful)));
        let bare = Project::without_details(key("p"), BuildStatus::Indeterminate);
        assert!(history.is_regressing(&bare));
    }

    #[test]
    fn test_worse_status_is_regressing() {
        let mut history = StatusHistory::new();
        history.record(key("p"), Some(AllBuildDetails::new(BuildStatus::Successful)));
        assert!(history.is_regressing(&project("p", BuildStatus::Unstable)));
        assert!(!history.is_regressing(&project("p", BuildStatus::Successful)));
        assert!(!history.is_regressing(&project("p", BuildStatus::Indeterminate)));
    }

    #[test]
    fn test_in_progress_of_same_base_counts_as_worse() {
        let mut history = StatusHistory::new();
        history.record(key("p"), Some(AllBuildDetails::new(BuildStatus::Failed)));
        assert!(history.is_regressing(&project("p", BuildStatus::FailedBuildInProgress)));
    }

    #[test]
    fn test_record_overwrites_and_reset_clears() {
        let mut history = StatusHistory::new();
        history.record(key("p"), Some(AllBuildDetails::new(BuildStatus::Successful)));
        history.record(key("p"), Some(AllBuildDetails::new(BuildStatus::Failed)));
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.previous(&key("p")).flatten().map(|d| d.status),
            Some(BuildStatus::Failed)
        );
        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.previous(&key("p")), None);
    }

    #[test]
    fn test_projects_by_status_degrades_and_sorts() {
        let mut history = StatusHistory::new();
        history.record(key("zeta"), Some(AllBuildDetails::new(BuildStatus::FailedBuildInProgress)));
        history.record(key("alpha"), Some(AllBuildDetails::new(BuildStatus::Failed)));
        history.record(key("docs"), None);
        history.record(key("web"), Some(AllBuildDetails::new(BuildStatus::Successful)));

        let groups = history.projects_by_status();
        let statuses: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            statuses,
            vec![
                BuildStatus::Indeterminate,
                BuildStatus::Successful,
                BuildStatus::Failed
            ]
        );
        let failed: Vec<_> = groups[&BuildStatus::Failed]
            .iter()
            .map(|k| k.name.as_str())
            .collect();
        assert_eq!(failed, vec!["alpha", "zeta"]);
    }
}
