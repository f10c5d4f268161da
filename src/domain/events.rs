//! Domain events for the application.
//!
//! Lifecycle events produced by the issue service and consumed by the
//! notification fan-out, plus the payload pushed to live-update clients.

use serde::Serialize;

use crate::models::issue::Issue;

/// What happened to an issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    Created,
    Updated,
    Deleted,
}

impl IssueAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// A lifecycle event handed to the notification fan-out.
#[derive(Clone, Debug)]
pub enum IssueEvent {
    Created(Issue),
    Updated {
        issue: Issue,
        /// Set only when the update moved the issue to a different status.
        previous_status: Option<crate::domain::IssueStatus>,
    },
    Deleted(Issue),
}

impl IssueEvent {
    #[must_use]
    pub const fn action(&self) -> IssueAction {
        match self {
            Self::Created(_) => IssueAction::Created,
            Self::Updated { .. } => IssueAction::Updated,
            Self::Deleted(_) => IssueAction::Deleted,
        }
    }

    #[must_use]
    pub const fn issue(&self) -> &Issue {
        match self {
            Self::Created(issue) | Self::Deleted(issue) | Self::Updated { issue, .. } => issue,
        }
    }
}

/// Events sent to connected clients over the live-update channel.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    IssueUpdate { action: IssueAction, issue: Issue },
}

impl From<&IssueEvent> for LiveEvent {
    fn from(event: &IssueEvent) -> Self {
        Self::IssueUpdate {
            action: event.action(),
            issue: event.issue().clone(),
        }
    }
}
