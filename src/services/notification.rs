//! Notification fan-out.
//!
//! Turns issue lifecycle events into queued email jobs and live-update
//! broadcasts. Nothing here can fail the request that produced the event.

use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::email::{EmailError, EmailQueue};
use super::live::LiveUpdates;
use super::templates;
use crate::db::Store;
use crate::domain::Role;
use crate::domain::events::{IssueEvent, LiveEvent};
use crate::models::{Issue, User};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Admin-initiated message to explicit addresses and/or whole roles.
#[derive(Debug, Clone, Default)]
pub struct BulkEmail {
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
    pub emails: Vec<String>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkReceipt {
    pub task_id: Uuid,
    pub recipients_count: usize,
}

#[derive(Clone)]
pub struct NotificationFanout {
    store: Store,
    emails: EmailQueue,
    live: LiveUpdates,
    frontend_base_url: String,
}

impl NotificationFanout {
    #[must_use]
    pub const fn new(
        store: Store,
        emails: EmailQueue,
        live: LiveUpdates,
        frontend_base_url: String,
    ) -> Self {
        Self {
            store,
            emails,
            live,
            frontend_base_url,
        }
    }

    /// Queues the email side in the background, then broadcasts to live clients.
    pub async fn publish(&self, event: IssueEvent) {
        debug!(
            issue_id = %event.issue().id,
            action = event.action().as_str(),
            "Publishing issue event"
        );

        let fanout = self.clone();
        let for_email = event.clone();
        tokio::spawn(async move {
            if let Err(e) = fanout.queue_issue_emails(&for_email).await {
                error!(
                    event = "notification_failed",
                    issue_id = %for_email.issue().id,
                    error = %e,
                    "Could not resolve email recipients"
                );
            }
        });

        self.broadcast(&event).await;
    }

    async fn broadcast(&self, event: &IssueEvent) {
        match serde_json::to_string(&LiveEvent::from(event)) {
            Ok(payload) => {
                self.live.broadcast(&payload).await;
            }
            Err(e) => warn!(error = %e, "Failed to serialize live update"),
        }
    }

    async fn queue_issue_emails(&self, event: &IssueEvent) -> anyhow::Result<()> {
        match event {
            IssueEvent::Created(issue) => {
                let staff = self
                    .store
                    .list_active_users_with_roles(&[Role::Admin, Role::Maintainer])
                    .await?;
                let recipients = dedup_emails(staff.iter().map(|u| u.email.as_str()));
                self.queue_issue_mail("issue_created", issue, "created", &recipients);
            }
            IssueEvent::Updated {
                issue,
                previous_status: Some(_),
            } => {
                let recipients = status_change_recipients(issue);
                let action = format!("status changed to {}", issue.status);
                self.queue_issue_mail("issue_status_changed", issue, &action, &recipients);
            }
            IssueEvent::Updated { .. } | IssueEvent::Deleted(_) => {}
        }
        Ok(())
    }

    fn queue_issue_mail(
        &self,
        kind: &'static str,
        issue: &Issue,
        action: &str,
        recipients: &[String],
    ) {
        let messages = recipients
            .iter()
            .map(|to| templates::issue_notification(to, issue, action, &self.frontend_base_url))
            .collect();
        self.emails.enqueue(kind, messages);
    }

    pub fn welcome(&self, user: &User) {
        let message = templates::welcome(user, &self.frontend_base_url);
        self.emails.enqueue("welcome", vec![message]);
    }

    /// Resolves recipients and queues the job. Explicit addresses are expected
    /// to be validated by the caller.
    pub async fn send_bulk(&self, request: BulkEmail) -> Result<BulkReceipt, NotificationError> {
        if request.subject.trim().is_empty() {
            return Err(NotificationError::Validation(
                "Subject cannot be empty".to_string(),
            ));
        }

        let role_members = self.store.list_active_users_with_roles(&request.roles).await?;
        let recipients = dedup_emails(
            request
                .emails
                .iter()
                .map(String::as_str)
                .chain(role_members.iter().map(|u| u.email.as_str())),
        );

        if recipients.is_empty() {
            return Err(NotificationError::Validation(
                "No recipients specified".to_string(),
            ));
        }

        let messages = recipients
            .iter()
            .map(|to| templates::bulk(to, &request.subject, &request.body, request.html_body.as_deref()))
            .collect();
        let task_id = self.emails.enqueue("bulk", messages);

        Ok(BulkReceipt {
            task_id,
            recipients_count: recipients.len(),
        })
    }

    /// Synchronous delivery to one address; errors reach the caller.
    pub async fn send_test(&self, to: &str) -> Result<(), NotificationError> {
        self.emails.send_now(&templates::test_message(to)).await?;
        Ok(())
    }
}

fn status_change_recipients(issue: &Issue) -> Vec<String> {
    dedup_emails(
        std::iter::once(issue.reporter.email.as_str())
            .chain(issue.assignee.as_ref().map(|a| a.email.as_str())),
    )
}

/// Case-insensitive, order-stable de-duplication.
fn dedup_emails<'a>(emails: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    emails
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .filter(|e| seen.insert(e.to_lowercase()))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_spelling_and_order() {
        let out = dedup_emails(
            ["b@x.io", "A@x.io", "a@x.io", " b@x.io ", ""].into_iter(),
        );
        assert_eq!(out, vec!["b@x.io", "A@x.io"]);
    }
}
