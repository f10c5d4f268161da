//! Domain service for dashboard statistics and the materialized daily history.

use thiserror::Error;

use crate::domain::Actor;
use crate::models::{DailySnapshot, DashboardStats};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Not enough permissions")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StatsError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for StatsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait StatsService: Send + Sync {
    /// Live counts over the issues `actor` is allowed to list.
    async fn dashboard(&self, actor: &Actor) -> Result<DashboardStats, StatsError>;

    /// The newest `days` materialized rows. Staff only.
    ///
    /// # Errors
    ///
    /// - [`StatsError::Forbidden`] for reporters
    /// - [`StatsError::Validation`] when `days` is outside `1..=365`
    async fn daily(&self, days: Option<u64>, actor: &Actor)
    -> Result<Vec<DailySnapshot>, StatsError>;

    /// Counts every issue and upserts the row for today's UTC date.
    async fn aggregate_today(&self) -> Result<DailySnapshot, StatsError>;
}
