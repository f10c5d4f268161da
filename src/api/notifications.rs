//! Admin bulk email and the SMTP self-test.

use axum::{
    Extension, Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::validation::validate_email;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::permissions::can_manage_users;
use crate::domain::{Actor, Role};
use crate::services::{BulkEmail, NotificationError};

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Validation(msg) => Self::validation(msg),
            NotificationError::Email(e) => Self::internal(format!("Failed to send email: {e}")),
            NotificationError::Database(msg) => Self::database(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkEmailRequest {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub html_message: Option<String>,
    #[serde(default)]
    pub recipient_emails: Vec<String>,
    #[serde(default)]
    pub recipient_roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct BulkEmailResponse {
    pub message: String,
    pub task_id: Uuid,
    pub recipients_count: usize,
}

/// `POST /api/notifications/send-bulk` (admin)
pub async fn send_bulk(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<BulkEmailRequest>,
) -> Result<Json<ApiResponse<BulkEmailResponse>>, ApiError> {
    if !can_manage_users(actor.role) {
        return Err(ApiError::forbidden());
    }

    let emails = payload
        .recipient_emails
        .iter()
        .map(|e| validate_email(e).map(ToString::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    let receipt = state
        .shared
        .notifications
        .send_bulk(BulkEmail {
            subject: payload.subject,
            body: payload.message,
            html_body: payload.html_message,
            emails,
            roles: payload.recipient_roles,
        })
        .await?;

    tracing::info!(
        task_id = %receipt.task_id,
        recipients = receipt.recipients_count,
        by = %actor.id,
        "Bulk email queued"
    );

    Ok(Json(ApiResponse::success(BulkEmailResponse {
        message: format!(
            "Notification queued for {} recipients",
            receipt.recipients_count
        ),
        task_id: receipt.task_id,
        recipients_count: receipt.recipients_count,
    })))
}

/// `POST /api/notifications/test-email`: delivers synchronously to the caller.
pub async fn test_email(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.shared.notifications.send_test(&actor.email).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Test email sent successfully",
    ))))
}
