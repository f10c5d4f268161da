//! `SeaORM` implementation of the `StatsService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::constants::limits::{DEFAULT_DAILY_STATS_DAYS, MAX_DAILY_STATS_DAYS};
use crate::db::Store;
use crate::domain::Actor;
use crate::domain::permissions::can_view_all_issues;
use crate::models::{DailySnapshot, DashboardStats};
use crate::services::stats_service::{StatsError, StatsService};

pub struct SeaOrmStatsService {
    store: Store,
}

impl SeaOrmStatsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// `YYYY-MM-DD` for the current UTC day.
#[must_use]
pub fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

#[async_trait]
impl StatsService for SeaOrmStatsService {
    async fn dashboard(&self, actor: &Actor) -> Result<DashboardStats, StatsError> {
        let scope = (!can_view_all_issues(actor.role)).then_some(actor.id);

        let (by_status, by_severity) = tokio::try_join!(
            self.store.count_issues_by_status(scope),
            self.store.count_issues_by_severity(scope),
        )?;

        Ok(DashboardStats::from_counts(&by_status, &by_severity))
    }

    async fn daily(
        &self,
        days: Option<u64>,
        actor: &Actor,
    ) -> Result<Vec<DailySnapshot>, StatsError> {
        if !can_view_all_issues(actor.role) {
            return Err(StatsError::Forbidden);
        }

        let days = days.unwrap_or(DEFAULT_DAILY_STATS_DAYS);
        if days == 0 || days > MAX_DAILY_STATS_DAYS {
            return Err(StatsError::Validation(format!(
                "days must be between 1 and {MAX_DAILY_STATS_DAYS}"
            )));
        }

        Ok(self.store.recent_daily_stats(days).await?)
    }

    async fn aggregate_today(&self) -> Result<DailySnapshot, StatsError> {
        let date = today();
        let snapshot = self.store.snapshot_daily_stats(&date).await?;
        info!(
            date = %snapshot.date,
            total = snapshot.total_issues,
            "Daily stats snapshot stored"
        );
        Ok(snapshot)
    }
}
