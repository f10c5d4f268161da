use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::domain::{IssueId, IssueStatus, Severity, UserId};
use crate::entities::{issue_files, issues, users};
use crate::models::{Issue, IssueChanges, IssueFile, IssueFilter, NewIssue, User};

pub struct IssueRepository {
    conn: DatabaseConnection,
}

impl IssueRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts an OPEN, unassigned issue owned by `reporter`.
    pub async fn create(&self, input: &NewIssue, reporter: UserId) -> Result<Issue> {
        let txn = self.conn.begin().await?;

        let now = chrono::Utc::now().to_rfc3339();
        let active = issues::ActiveModel {
            title: Set(input.title.clone()),
            description: Set(input.description.clone()),
            severity: Set(input.severity),
            status: Set(IssueStatus::Open),
            reporter_id: Set(reporter.value()),
            assignee_id: Set(None),
            tags: Set(encode_tags(&input.tags)?),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert issue")?;
        let issue = hydrate_one(&txn, model).await?;

        txn.commit().await?;
        Ok(issue)
    }

    pub async fn get(&self, id: IssueId) -> Result<Option<Issue>> {
        let Some(model) = issues::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query issue")?
        else {
            return Ok(None);
        };

        Ok(Some(hydrate_one(&self.conn, model).await?))
    }

    /// Issues matching `filter`, newest first. `reporter` restricts to one owner.
    pub async fn list(&self, filter: IssueFilter, reporter: Option<UserId>) -> Result<Vec<Issue>> {
        let mut query = issues::Entity::find().order_by_desc(issues::Column::Id);

        if let Some(reporter) = reporter {
            query = query.filter(issues::Column::ReporterId.eq(reporter.value()));
        }
        if let Some(status) = filter.status {
            query = query.filter(issues::Column::Status.eq(status));
        }
        if let Some(severity) = filter.severity {
            query = query.filter(issues::Column::Severity.eq(severity));
        }

        let models = query
            .all(&self.conn)
            .await
            .context("Failed to list issues")?;

        hydrate(&self.conn, models).await
    }

    /// Writes every present field of `changes` and bumps `updated_at`.
    /// Returns `None` when the issue does not exist.
    pub async fn update(&self, id: IssueId, changes: &IssueChanges) -> Result<Option<Issue>> {
        let txn = self.conn.begin().await?;

        let Some(model) = issues::Entity::find_by_id(id.value())
            .one(&txn)
            .await
            .context("Failed to query issue for update")?
        else {
            return Ok(None);
        };

        let mut active: issues::ActiveModel = model.into();
        if let Some(title) = &changes.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &changes.description {
            active.description = Set(description.clone());
        }
        if let Some(severity) = changes.severity {
            active.severity = Set(severity);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(assignee) = changes.assignee_id {
            active.assignee_id = Set(assignee.map(|a| a.value()));
        }
        if let Some(tags) = &changes.tags {
            active.tags = Set(encode_tags(tags)?);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&txn)
            .await
            .context("Failed to update issue")?;
        let issue = hydrate_one(&txn, model).await?;

        txn.commit().await?;
        Ok(Some(issue))
    }

    /// Removes the issue and its attachment records in one transaction.
    /// Returns the removed attachment records so their bytes can be cleaned up.
    pub async fn delete(&self, id: IssueId) -> Result<Option<Vec<IssueFile>>> {
        let txn = self.conn.begin().await?;

        let files = issue_files::Entity::find()
            .filter(issue_files::Column::IssueId.eq(id.value()))
            .all(&txn)
            .await
            .context("Failed to query attachments for deletion")?;

        issue_files::Entity::delete_many()
            .filter(issue_files::Column::IssueId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete attachments")?;

        let result = issues::Entity::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete issue")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        txn.commit().await?;
        Ok(Some(files.into_iter().map(IssueFile::from).collect()))
    }

    pub async fn count_by_status(&self, reporter: Option<UserId>) -> Result<Vec<(IssueStatus, u64)>> {
        count_by_status(&self.conn, reporter).await
    }

    pub async fn count_by_severity(&self, reporter: Option<UserId>) -> Result<Vec<(Severity, u64)>> {
        count_by_severity(&self.conn, reporter).await
    }
}

pub(super) async fn count_by_status<C: ConnectionTrait>(
    db: &C,
    reporter: Option<UserId>,
) -> Result<Vec<(IssueStatus, u64)>> {
    let mut counts = Vec::with_capacity(IssueStatus::ALL.len());
    for status in IssueStatus::ALL {
        let mut query = issues::Entity::find().filter(issues::Column::Status.eq(status));
        if let Some(reporter) = reporter {
            query = query.filter(issues::Column::ReporterId.eq(reporter.value()));
        }
        let n = query
            .count(db)
            .await
            .with_context(|| format!("Failed to count {status} issues"))?;
        counts.push((status, n));
    }
    Ok(counts)
}

pub(super) async fn count_by_severity<C: ConnectionTrait>(
    db: &C,
    reporter: Option<UserId>,
) -> Result<Vec<(Severity, u64)>> {
    let mut counts = Vec::with_capacity(Severity::ALL.len());
    for severity in Severity::ALL {
        let mut query = issues::Entity::find().filter(issues::Column::Severity.eq(severity));
        if let Some(reporter) = reporter {
            query = query.filter(issues::Column::ReporterId.eq(reporter.value()));
        }
        let n = query
            .count(db)
            .await
            .with_context(|| format!("Failed to count {severity} issues"))?;
        counts.push((severity, n));
    }
    Ok(counts)
}

fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).context("Failed to encode tags")
}

fn decode_tags(raw: &str) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("Stored tags are not a JSON array")
}

async fn hydrate_one<C: ConnectionTrait>(db: &C, model: issues::Model) -> Result<Issue> {
    hydrate(db, vec![model])
        .await?
        .pop()
        .context("Hydration dropped an issue")
}

/// Resolves reporter, assignee and attachments for a batch of rows with two queries.
async fn hydrate<C: ConnectionTrait>(db: &C, models: Vec<issues::Model>) -> Result<Vec<Issue>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: HashSet<i32> = models
        .iter()
        .flat_map(|m| std::iter::once(m.reporter_id).chain(m.assignee_id))
        .collect();
    let issue_ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let people: HashMap<i32, User> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await
        .context("Failed to load issue participants")?
        .into_iter()
        .map(|u| (u.id, User::from(u)))
        .collect();

    let mut files: HashMap<i32, Vec<IssueFile>> = HashMap::new();
    for file in issue_files::Entity::find()
        .filter(issue_files::Column::IssueId.is_in(issue_ids))
        .order_by_asc(issue_files::Column::Id)
        .all(db)
        .await
        .context("Failed to load issue attachments")?
    {
        files
            .entry(file.issue_id)
            .or_default()
            .push(IssueFile::from(file));
    }

    models
        .into_iter()
        .map(|m| {
            let reporter = people
                .get(&m.reporter_id)
                .cloned()
                .with_context(|| format!("Issue {} references missing reporter", m.id))?;
            let assignee = m.assignee_id.and_then(|id| people.get(&id).cloned());

            Ok(Issue {
                id: IssueId::new(m.id),
                tags: decode_tags(&m.tags)?,
                title: m.title,
                description: m.description,
                severity: m.severity,
                status: m.status,
                reporter_id: UserId::new(m.reporter_id),
                assignee_id: m.assignee_id.map(UserId::new),
                created_at: m.created_at,
                updated_at: m.updated_at,
                reporter,
                assignee,
                files: files.remove(&m.id).unwrap_or_default(),
            })
        })
        .collect()
}
