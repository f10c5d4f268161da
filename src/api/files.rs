//! Attachment upload, download and removal.

use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::{Actor, FileId, IssueId};
use crate::models::IssueFile;
use crate::services::{FileError, Upload};

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::IssueNotFound(id) => Self::not_found("Issue", id),
            FileError::NotFound | FileError::MissingOnDisk => Self::NotFound(err.to_string()),
            FileError::Forbidden => Self::forbidden(),
            FileError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            FileError::Validation(msg) => Self::validation(msg),
            FileError::Storage(e) => Self::internal(format!("Storage error: {e}")),
            FileError::Database(msg) => Self::database(msg),
        }
    }
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File too large".to_string())
    } else {
        ApiError::validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// `POST /api/files/upload/{issue_id}` with a multipart `file` field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(issue_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<IssueFile>>, ApiError> {
    let issue_id = IssueId::new(validate_id(issue_id, "issue")?);

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;

        upload = Some(Upload {
            original_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::validation("Missing 'file' field"))?;
    let file = state
        .shared
        .file_service
        .upload(issue_id, upload, &actor)
        .await?;

    Ok(Json(ApiResponse::success(file)))
}

/// `GET /api/files/{id}` streams the bytes back under the original name.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let id = FileId::new(validate_id(id, "file")?);
    let download = state.shared.file_service.download(id, &actor).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_header(&download.file.content_type))
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&download.file.original_name),
        )
        .header(header::CONTENT_LENGTH, download.bytes.len())
        .body(Body::from(download.bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// `DELETE /api/files/{id}`
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = FileId::new(validate_id(id, "file")?);
    state.shared.file_service.delete(id, &actor).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "File deleted successfully",
    ))))
}

/// Stored types come from the uploading client; anything that is not a valid
/// header value is served as octet-stream.
fn content_type_header(content_type: &str) -> HeaderValue {
    HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

/// Quotes and backslashes are dropped, non-ASCII is replaced, so the value is
/// always a valid header.
fn content_disposition(original_name: &str) -> String {
    let safe: String = original_name
        .chars()
        .filter(|c| *c != '"' && *c != '\\')
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
