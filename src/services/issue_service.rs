//! Domain service for the issue lifecycle.
//!
//! Every operation takes the calling [`Actor`] and applies the permission
//! matrix before touching the store. Successful mutations are handed to the
//! notification fan-out.

use thiserror::Error;

use crate::domain::{Actor, IssueId};
use crate::models::{Issue, IssueChanges, IssueFilter, NewIssue};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Issue not found: {0}")]
    NotFound(IssueId),

    #[error("Not enough permissions")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for IssueError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for IssueError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait IssueService: Send + Sync {
    /// Creates an OPEN, unassigned issue reported by `actor`.
    ///
    /// # Errors
    ///
    /// - [`IssueError::Forbidden`] if the role may not create issues
    /// - [`IssueError::Validation`] on an empty title
    async fn create(&self, input: NewIssue, actor: &Actor) -> Result<Issue, IssueError>;

    async fn get(&self, id: IssueId, actor: &Actor) -> Result<Issue, IssueError>;

    /// Staff see every issue; everyone else only their own.
    async fn list(&self, filter: IssueFilter, actor: &Actor) -> Result<Vec<Issue>, IssueError>;

    /// Applies the present fields of `changes`. An assignee change from an
    /// actor who cannot assign is dropped, not rejected.
    async fn update(
        &self,
        id: IssueId,
        changes: IssueChanges,
        actor: &Actor,
    ) -> Result<Issue, IssueError>;

    /// Allowed for admins and for the reporter. Attachments go with the issue.
    async fn delete(&self, id: IssueId, actor: &Actor) -> Result<(), IssueError>;
}

/// Trims the title and rejects it when nothing is left.
pub fn normalize_title(title: &str) -> Result<String, IssueError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(IssueError::Validation("Title cannot be empty".to_string()));
    }
    if trimmed.chars().count() > 200 {
        return Err(IssueError::Validation(
            "Title must be 200 characters or less".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
