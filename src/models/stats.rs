use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{IssueStatus, Severity};
use crate::entities::daily_stats;

/// Aggregated counts for the dashboard, keyed by enum wire names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_issues: u64,
    pub open_issues: u64,
    pub in_progress_issues: u64,
    pub closed_issues: u64,
    pub issues_by_severity: BTreeMap<String, u64>,
    pub issues_by_status: BTreeMap<String, u64>,
}

impl DashboardStats {
    #[must_use]
    pub fn from_counts(by_status: &[(IssueStatus, u64)], by_severity: &[(Severity, u64)]) -> Self {
        let count_of = |wanted: IssueStatus| {
            by_status
                .iter()
                .find(|(status, _)| *status == wanted)
                .map_or(0, |(_, n)| *n)
        };

        Self {
            total_issues: by_status.iter().map(|(_, n)| n).sum(),
            open_issues: count_of(IssueStatus::Open),
            in_progress_issues: count_of(IssueStatus::InProgress),
            closed_issues: count_of(IssueStatus::Done),
            issues_by_status: by_status
                .iter()
                .map(|(status, n)| (status.as_str().to_string(), *n))
                .collect(),
            issues_by_severity: by_severity
                .iter()
                .map(|(severity, n)| (severity.as_str().to_string(), *n))
                .collect(),
        }
    }
}

/// One materialized day of issue counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySnapshot {
    pub date: String,
    pub total_issues: i32,
    pub open_issues: i32,
    pub triaged_issues: i32,
    pub in_progress_issues: i32,
    pub done_issues: i32,
    pub critical_count: i32,
    pub high_count: i32,
    pub medium_count: i32,
    pub low_count: i32,
    pub created_at: String,
}

impl From<daily_stats::Model> for DailySnapshot {
    fn from(model: daily_stats::Model) -> Self {
        Self {
            date: model.date,
            total_issues: model.total_issues,
            open_issues: model.open_issues,
            triaged_issues: model.triaged_issues,
            in_progress_issues: model.in_progress_issues,
            done_issues: model.done_issues,
            critical_count: model.critical_count,
            high_count: model.high_count,
            medium_count: model.medium_count,
            low_count: model.low_count,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_totals_derive_from_status_counts() {
        let stats = DashboardStats::from_counts(
            &[
                (IssueStatus::Open, 3),
                (IssueStatus::Triaged, 1),
                (IssueStatus::InProgress, 2),
                (IssueStatus::Done, 4),
            ],
            &[(Severity::Low, 6), (Severity::Critical, 4)],
        );

        assert_eq!(stats.total_issues, 10);
        assert_eq!(stats.open_issues, 3);
        assert_eq!(stats.in_progress_issues, 2);
        assert_eq!(stats.closed_issues, 4);
        assert_eq!(stats.issues_by_status["TRIAGED"], 1);
        assert_eq!(stats.issues_by_severity["CRITICAL"], 4);
    }
}
