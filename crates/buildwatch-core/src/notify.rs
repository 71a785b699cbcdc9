//! Icon and balloon-message decisions.
//!
//! [`NotificationDecider::decide`] is a pure function of an
//! [`AggregationResult`] and the status shown last cycle. The caller keeps
//! the displayed status and threads it back in on the next call.

use serde::{Deserialize, Serialize};

use crate::aggregator::AggregationResult;
use crate::history::StatusHistory;
use crate::model::ProjectKey;
use crate::status::BuildStatus;

pub const BUILD_FAILED_CAPTION: &str = "Build failed";
pub const BUILD_REGRESSIONS_CAPTION: &str = "Build regressions";
pub const BUILD_STATUS_CAPTION: &str = "Build status";
pub const NO_PROJECTS_TEXT: &str = "No projects are being monitored";

/// Kind of balloon message, which also selects its icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Overall state just turned to failing.
    Error,
    /// Some projects got worse since last cycle.
    Regression,
    /// On-demand status summary.
    Info,
}

/// A single balloon message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub caption: String,
    /// Projects mentioned, in display order.
    pub projects: Vec<ProjectKey>,
    pub body: String,
}

impl Notification {
    fn listing<'a>(
        kind: NotificationKind,
        caption: &str,
        projects: impl IntoIterator<Item = &'a ProjectKey>,
    ) -> Self {
        let projects: Vec<ProjectKey> = projects.into_iter().cloned().collect();
        let body = projects
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            kind,
            caption: caption.to_string(),
            projects,
            body,
        }
    }

    /// Error message listing the failing projects.
    pub fn error<'a>(projects: impl IntoIterator<Item = &'a ProjectKey>) -> Self {
        Self::listing(NotificationKind::Error, BUILD_FAILED_CAPTION, projects)
    }

    /// Warning message listing the regressing projects.
    pub fn regression<'a>(projects: impl IntoIterator<Item = &'a ProjectKey>) -> Self {
        Self::listing(
            NotificationKind::Regression,
            BUILD_REGRESSIONS_CAPTION,
            projects,
        )
    }
}

/// What the presentation layer should show after a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub new_icon: BuildStatus,
    pub notification: Option<Notification>,
}

/// Decides the icon and at most one notification per cycle.
pub struct NotificationDecider;

impl NotificationDecider {
    /// Decide what to show for `result`.
    ///
    /// An error message fires only on the transition from a displayed
    /// status below `Failed`. Regression messages are not gated and repeat
    /// whenever new regressions are found. Errors take priority.
    pub fn decide(result: &AggregationResult, last_displayed: BuildStatus) -> Decision {
        let notification = if !last_displayed.is_error() && result.has_errors() {
            Some(Notification::error(&result.error_projects))
        } else if result.has_regressions() {
            Some(Notification::regression(&result.regressing_projects))
        } else {
            None
        };

        Decision {
            new_icon: result.overall,
            notification,
        }
    }

    /// Summary of every known project, grouped by display status.
    ///
    /// `Successful` projects are left out unless they are the only group.
    pub fn status_summary(history: &StatusHistory) -> Notification {
        let groups = history.projects_by_status();
        let only_group = groups.len() == 1;

        let mut sections = Vec::new();
        let mut projects = Vec::new();
        for (status, keys) in &groups {
            if *status == BuildStatus::Successful && !only_group {
                continue;
            }
            let mut section = status.key().to_string();
            for key in keys {
                section.push_str("\n  - ");
                section.push_str(&key.name);
                projects.push(key.clone());
            }
            sections.push(section);
        }

        let body = if sections.is_empty() {
            NO_PROJECTS_TEXT.to_string()
        } else {
            sections.join("\n")
        };

        Notification {
            kind: NotificationKind::Info,
            caption: BUILD_STATUS_CAPTION.to_string(),
            projects,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AllBuildDetails;

    fn key(name: &str) -> ProjectKey {
        ProjectKey::new("http://ci", name)
    }

    fn result(
        overall: BuildStatus,
        errors: &[&str],
        regressions: &[&str],
    ) -> AggregationResult {
        let mut r = AggregationResult::empty();
        r.overall = overall;
        r.error_projects = errors.iter().map(|n| key(n)).collect();
        r.regressing_projects = regressions.iter().map(|n| key(n)).collect();
        r
    }

    #[test]
    fn test_icon_is_overall_verbatim() {
        let r = result(BuildStatus::UnstableBuildInProgress, &[], &[]);
        let d = NotificationDecider::decide(&r, BuildStatus::Successful);
        assert_eq!(d.new_icon, BuildStatus::UnstableBuildInProgress);
        assert!(d.notification.is_none());
    }

    #[test]
    fn test_error_fires_on_transition_into_failure() {
        let r = result(BuildStatus::Failed, &["p"], &[]);
        let d = NotificationDecider::decide(&r, BuildStatus::Successful);
        let n = d.notification.expect("error notification");
        assert_eq!(n.kind, NotificationKind::Error);
        assert_eq!(n.caption, BUILD_FAILED_CAPTION);
        assert_eq!(n.projects, vec![key("p")]);
    }

    #[test]
    fn test_error_not_repeated_when_already_failed() {
        let r = result(BuildStatus::Failed, &["p"], &[]);
        assert!(NotificationDecider::decide(&r, BuildStatus::Failed)
            .notification
            .is_none());
        assert!(NotificationDecider::decide(&r, BuildStatus::FailedBuildInProgress)
            .notification
            .is_none());
    }

    #[test]
    fn test_error_takes_priority_over_regression() {
        let r = result(BuildStatus::Failed, &["a"], &["b"]);
        let n = NotificationDecider::decide(&r, BuildStatus::Unstable)
            .notification
            .unwrap();
        assert_eq!(n.kind, NotificationKind::Error);
    }

    #[test]
    fn test_regression_fires_when_error_is_gated() {
        let r = result(BuildStatus::Failed, &["a"], &["b"]);
        let n = NotificationDecider::decide(&r, BuildStatus::Failed)
            .notification
            .unwrap();
        assert_eq!(n.kind, NotificationKind::Regression);
        assert_eq!(n.caption, BUILD_REGRESSIONS_CAPTION);
        assert_eq!(n.body, "b");
    }

    #[test]
    fn test_error_listing_is_sorted_by_name() {
        let r = result(BuildStatus::Failed, &["zeta", "alpha", "mid"], &[]);
        let n = NotificationDecider::decide(&r, BuildStatus::Indeterminate)
            .notification
            .unwrap();
        assert_eq!(n.body, "alpha\nmid\nzeta");
    }

    #[test]
    fn test_status_summary_hides_successful_among_others() {
        let mut history = StatusHistory::new();
        history.record(key("ok"), Some(AllBuildDetails::new(BuildStatus::Successful)));
        history.record(key("bad"), Some(AllBuildDetails::new(BuildStatus::FailedBuildInProgress)));
        history.record(key("meh"), Some(AllBuildDetails::new(BuildStatus::Unstable)));

        let n = NotificationDecider::status_summary(&history);
        assert_eq!(n.kind, NotificationKind::Info);
        assert_eq!(n.caption, BUILD_STATUS_CAPTION);
        assert_eq!(n.body, "Unstable\n  - meh\nFailed\n  - bad");
        assert_eq!(n.projects, vec![key("meh"), key("bad")]);
    }

    #[test]
    fn test_status_summary_shows_successful_when_alone() {
        let mut history = StatusHistory::new();
        history.record(key("b"), Some(AllBuildDetails::new(BuildStatus::Successful)));
        history.record(
            key("a"),
            Some(AllBuildDetails::new(BuildStatus::SuccessfulBuildInProgress)),
        );
        let n = NotificationDecider::status_summary(&history);
        assert_eq!(n.body, "Successful\n  - a\n  - b");
    }

    #[test]
    fn test_status_summary_without_projects() {
        let n = NotificationDecider::status_summary(&StatusHistory::new());
        assert_eq!(n.body, NO_PROJECTS_TEXT);
        assert!(n.projects.is_empty());
    }
}
