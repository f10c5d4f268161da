use serde::Serialize;

use crate::domain::{FileId, IssueId, UserId};
use crate::entities::issue_files;

/// Attachment metadata. The storage path never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueFile {
    pub id: FileId,
    pub filename: String,
    pub original_name: String,
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub issue_id: IssueId,
    pub uploaded_by: UserId,
    pub created_at: String,
}

impl From<issue_files::Model> for IssueFile {
    fn from(model: issue_files::Model) -> Self {
        Self {
            id: FileId::new(model.id),
            filename: model.filename,
            original_name: model.original_name,
            file_path: model.file_path,
            file_size: model.file_size,
            content_type: model.content_type,
            issue_id: IssueId::new(model.issue_id),
            uploaded_by: UserId::new(model.uploaded_by),
            created_at: model.created_at,
        }
    }
}
