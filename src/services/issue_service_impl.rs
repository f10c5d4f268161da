//! `SeaORM` implementation of the `IssueService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::domain::events::IssueEvent;
use crate::domain::permissions::{
    can_assign_issues, can_create_issue, can_delete_any_issue, can_edit_issue,
    can_view_all_issues, can_view_issue,
};
use crate::domain::{Actor, IssueId};
use crate::models::{Issue, IssueChanges, IssueFilter, NewIssue};
use crate::services::file_service::FileStorage;
use crate::services::issue_service::{IssueError, IssueService, normalize_title};
use crate::services::notification::NotificationFanout;

pub struct SeaOrmIssueService {
    store: Store,
    notifications: NotificationFanout,
    storage: FileStorage,
}

impl SeaOrmIssueService {
    #[must_use]
    pub const fn new(store: Store, notifications: NotificationFanout, storage: FileStorage) -> Self {
        Self {
            store,
            notifications,
            storage,
        }
    }

    async fn load(&self, id: IssueId) -> Result<Issue, IssueError> {
        self.store
            .get_issue(id)
            .await?
            .ok_or(IssueError::NotFound(id))
    }
}

#[async_trait]
impl IssueService for SeaOrmIssueService {
    async fn create(&self, mut input: NewIssue, actor: &Actor) -> Result<Issue, IssueError> {
        if !can_create_issue(actor.role) {
            return Err(IssueError::Forbidden);
        }
        input.title = normalize_title(&input.title)?;

        let issue = self.store.create_issue(&input, actor.id).await?;
        info!(issue_id = %issue.id, reporter = %actor.id, "Issue created");

        self.notifications
            .publish(IssueEvent::Created(issue.clone()))
            .await;
        Ok(issue)
    }

    async fn get(&self, id: IssueId, actor: &Actor) -> Result<Issue, IssueError> {
        let issue = self.load(id).await?;
        if !can_view_issue(actor.role, issue.reporter_id, actor.id) {
            return Err(IssueError::Forbidden);
        }
        Ok(issue)
    }

    async fn list(&self, filter: IssueFilter, actor: &Actor) -> Result<Vec<Issue>, IssueError> {
        let scope = (!can_view_all_issues(actor.role)).then_some(actor.id);
        Ok(self.store.list_issues(filter, scope).await?)
    }

    async fn update(
        &self,
        id: IssueId,
        mut changes: IssueChanges,
        actor: &Actor,
    ) -> Result<Issue, IssueError> {
        let before = self.load(id).await?;
        if !can_edit_issue(actor.role, before.reporter_id, actor.id) {
            return Err(IssueError::Forbidden);
        }

        if changes.assignee_id.is_some() && !can_assign_issues(actor.role) {
            info!(issue_id = %id, actor = %actor.id, "Dropping assignee change from non-assigner");
            changes.assignee_id = None;
        }

        if let Some(title) = &changes.title {
            changes.title = Some(normalize_title(title)?);
        }

        if let Some(Some(assignee)) = changes.assignee_id {
            let exists = self.store.get_user(assignee).await?.is_some();
            if !exists {
                return Err(IssueError::Validation(format!(
                    "Assignee {assignee} does not exist"
                )));
            }
        }

        let issue = self
            .store
            .update_issue(id, &changes)
            .await?
            .ok_or(IssueError::NotFound(id))?;

        let previous_status = (issue.status != before.status).then_some(before.status);
        self.notifications
            .publish(IssueEvent::Updated {
                issue: issue.clone(),
                previous_status,
            })
            .await;

        Ok(issue)
    }

    async fn delete(&self, id: IssueId, actor: &Actor) -> Result<(), IssueError> {
        let issue = self.load(id).await?;
        if !(can_delete_any_issue(actor.role) || actor.owns(issue.reporter_id)) {
            return Err(IssueError::Forbidden);
        }

        let removed = self
            .store
            .delete_issue(id)
            .await?
            .ok_or(IssueError::NotFound(id))?;

        for file in &removed {
            self.storage.remove(&file.file_path).await;
        }
        info!(issue_id = %id, actor = %actor.id, attachments = removed.len(), "Issue deleted");

        self.notifications.publish(IssueEvent::Deleted(issue)).await;
        Ok(())
    }
}
