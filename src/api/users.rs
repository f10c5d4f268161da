use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::{Actor, UserId};
use crate::models::User;
use crate::models::user::UserChanges;
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::NotFound(err.to_string()),
            UserError::Forbidden => Self::forbidden(),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Database(msg) => Self::database(msg),
        }
    }
}

/// `GET /api/users/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.shared.user_service.me(&actor).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `GET /api/users` (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.shared.user_service.list(&actor).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// `GET /api/users/{id}` (admin or self)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = UserId::new(validate_id(id, "user")?);
    let user = state.shared.user_service.get(id, &actor).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `PUT /api/users/{id}` (admin or self)
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    Json(changes): Json<UserChanges>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = UserId::new(validate_id(id, "user")?);
    let user = state
        .shared
        .user_service
        .update(id, changes, &actor)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
