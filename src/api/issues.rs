//! Issue endpoints. Permission checks live in the issue service; these
//! handlers only translate HTTP to service calls.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::{Actor, IssueId};
use crate::models::{Issue, IssueChanges, IssueFilter, NewIssue};
use crate::services::IssueError;

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::NotFound(id) => Self::not_found("Issue", id),
            IssueError::Forbidden => Self::forbidden(),
            IssueError::Validation(msg) => Self::validation(msg),
            IssueError::Database(msg) => Self::database(msg),
        }
    }
}

/// `POST /api/issues`
pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<NewIssue>,
) -> Result<Json<ApiResponse<Issue>>, ApiError> {
    let issue = state.shared.issue_service.create(payload, &actor).await?;
    Ok(Json(ApiResponse::success(issue)))
}

/// `GET /api/issues?status=&severity=`
pub async fn list_issues(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<IssueFilter>,
) -> Result<Json<ApiResponse<Vec<Issue>>>, ApiError> {
    let issues = state.shared.issue_service.list(filter, &actor).await?;
    Ok(Json(ApiResponse::success(issues)))
}

/// `GET /api/issues/{id}`
pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Issue>>, ApiError> {
    let id = IssueId::new(validate_id(id, "issue")?);
    let issue = state.shared.issue_service.get(id, &actor).await?;
    Ok(Json(ApiResponse::success(issue)))
}

/// `PUT /api/issues/{id}`: fields left out of the body are untouched.
pub async fn update_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    Json(changes): Json<IssueChanges>,
) -> Result<Json<ApiResponse<Issue>>, ApiError> {
    let id = IssueId::new(validate_id(id, "issue")?);
    let issue = state
        .shared
        .issue_service
        .update(id, changes, &actor)
        .await?;
    Ok(Json(ApiResponse::success(issue)))
}

/// `DELETE /api/issues/{id}`
pub async fn delete_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = IssueId::new(validate_id(id, "issue")?);
    state.shared.issue_service.delete(id, &actor).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Issue deleted successfully",
    ))))
}
