use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, TryIntoModel,
};

use super::issue::{count_by_severity, count_by_status};
use crate::domain::{IssueStatus, Severity};
use crate::entities::daily_stats;
use crate::models::DailySnapshot;

pub struct StatsRepository {
    conn: DatabaseConnection,
}

impl StatsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Counts every issue and writes the row for `date`, replacing its counts if
    /// one already exists. Nothing is persisted unless the whole snapshot succeeds.
    pub async fn snapshot(&self, date: &str) -> Result<DailySnapshot> {
        let txn = self.conn.begin().await?;

        let by_status = count_by_status(&txn, None).await?;
        let by_severity = count_by_severity(&txn, None).await?;

        let status = |wanted: IssueStatus| count_of(&by_status, wanted);
        let severity = |wanted: Severity| count_of(&by_severity, wanted);
        let total: u64 = by_status.iter().map(|(_, n)| n).sum();

        let existing = daily_stats::Entity::find()
            .filter(daily_stats::Column::Date.eq(date))
            .one(&txn)
            .await
            .context("Failed to query daily stats")?;

        let mut active = match existing {
            Some(row) => row.into(),
            None => daily_stats::ActiveModel {
                date: Set(date.to_string()),
                created_at: Set(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            },
        };

        active.total_issues = Set(narrow(total)?);
        active.open_issues = Set(narrow(status(IssueStatus::Open))?);
        active.triaged_issues = Set(narrow(status(IssueStatus::Triaged))?);
        active.in_progress_issues = Set(narrow(status(IssueStatus::InProgress))?);
        active.done_issues = Set(narrow(status(IssueStatus::Done))?);
        active.critical_count = Set(narrow(severity(Severity::Critical))?);
        active.high_count = Set(narrow(severity(Severity::High))?);
        active.medium_count = Set(narrow(severity(Severity::Medium))?);
        active.low_count = Set(narrow(severity(Severity::Low))?);

        let model = active
            .save(&txn)
            .await
            .context("Failed to write daily stats")?
            .try_into_model()
            .context("Failed to read back daily stats")?;

        txn.commit().await?;
        Ok(DailySnapshot::from(model))
    }

    /// Most recent `limit` rows, newest date first.
    pub async fn recent(&self, limit: u64) -> Result<Vec<DailySnapshot>> {
        let rows = daily_stats::Entity::find()
            .order_by_desc(daily_stats::Column::Date)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list daily stats")?;

        Ok(rows.into_iter().map(DailySnapshot::from).collect())
    }
}

fn count_of<K: PartialEq + Copy>(counts: &[(K, u64)], wanted: K) -> u64 {
    counts
        .iter()
        .find(|(key, _)| *key == wanted)
        .map_or(0, |(_, n)| *n)
}

fn narrow(n: u64) -> Result<i32> {
    i32::try_from(n).context("Issue count does not fit the stats column")
}
