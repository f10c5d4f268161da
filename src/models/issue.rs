use serde::{Deserialize, Deserializer, Serialize};

use super::{IssueFile, User};
use crate::domain::{IssueId, IssueStatus, Severity, UserId};

/// An issue with its reporter, assignee and attachments resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IssueStatus,
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub reporter: User,
    pub assignee: Option<User>,
    pub files: Vec<IssueFile>,
}

/// Input for creating an issue. Status and ownership are never taken from input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of an issue. `None` means "leave as is".
///
/// `assignee_id` distinguishes an absent field (`None`) from an explicit
/// `null` (`Some(None)`, which clears the assignee).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IssueStatus>,
    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<UserId>>,
    pub tags: Option<Vec<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Equality filters for listing issues; all present filters are ANDed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub severity: Option<Severity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_assignee_is_untouched_and_null_clears() {
        let absent: IssueChanges = serde_json::from_str(r#"{"status":"DONE"}"#).unwrap();
        assert_eq!(absent.assignee_id, None);
        assert_eq!(absent.status, Some(IssueStatus::Done));

        let cleared: IssueChanges = serde_json::from_str(r#"{"assignee_id":null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let set: IssueChanges = serde_json::from_str(r#"{"assignee_id":5}"#).unwrap();
        assert_eq!(set.assignee_id, Some(Some(UserId::new(5))));
    }

    #[test]
    fn new_issue_ignores_status_and_defaults_severity() {
        let input: NewIssue = serde_json::from_str(
            r#"{"title":"t","description":"d","status":"DONE","reporter_id":99}"#,
        )
        .unwrap();
        assert_eq!(input.severity, Severity::Low);
        assert!(input.tags.is_empty());
    }
}
