use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::Actor;
use crate::models::{DailySnapshot, DashboardStats};
use crate::services::StatsError;

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Forbidden => Self::forbidden(),
            StatsError::Validation(msg) => Self::validation(msg),
            StatsError::Database(msg) => Self::database(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u64>,
}

/// `GET /api/stats/dashboard`, scoped like the issue list.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let stats = state.shared.stats_service.dashboard(&actor).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// `GET /api/stats/daily?days=N`, newest first.
pub async fn daily(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<ApiResponse<Vec<DailySnapshot>>>, ApiError> {
    let rows = state
        .shared
        .stats_service
        .daily(query.days, &actor)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}
