use axum::{
    Extension, Json,
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::validate_email;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::{Actor, UserId};
use crate::models::User;
use crate::services::{AuthError, LoginResult, Registration};

const SESSION_USER_KEY: &str = "user_id";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Inactive => Self::Forbidden(err.to_string()),
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::Forbidden => Self::Forbidden("Cannot register as ADMIN".to_string()),
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) => Self::database(msg),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct AuthQuery {
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
/// 4. `?api_key=` query parameter (browsers cannot set headers on `WebSocket`s)
///
/// The resolved [`Actor`] is stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let user = match resolve_user(&state, &query, &headers, &session).await? {
        Some(user) => user,
        None => return Err(ApiError::unauthorized()),
    };

    if !user.is_active {
        return Err(ApiError::Forbidden("Inactive user".to_string()));
    }

    tracing::Span::current().record("user_id", user.id.value());
    request.extensions_mut().insert(user.as_actor());
    Ok(next.run(request).await)
}

async fn resolve_user(
    state: &AppState,
    query: &AuthQuery,
    headers: &HeaderMap,
    session: &Session,
) -> Result<Option<User>, ApiError> {
    let auth = &state.shared.auth_service;

    // Session first: the web UI path
    if let Ok(Some(id)) = session.get::<i32>(SESSION_USER_KEY).await
        && let Some(user) = auth.find_user(UserId::new(id)).await?
    {
        return Ok(Some(user));
    }

    match extract_api_key(query, headers) {
        Some(key) => Ok(auth.verify_api_key(&key).await?),
        None => Ok(None),
    }
}

fn extract_api_key(query: &AuthQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    query.api_key.clone().filter(|k| !k.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<Registration>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    payload.email = validate_email(&payload.email)?.to_string();

    let user = state.shared.auth_service.register(payload).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/login
/// Authenticate with email and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .shared
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, result.user.id.value())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = %result.user.id, "User logged in");
    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth_service
        .change_password(&actor, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.shared.auth_service.get_api_key(&actor).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
/// Generate a new random API key
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.shared.auth_service.regenerate_api_key(&actor).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
