use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::domain::{FileId, IssueId, UserId};
use crate::entities::issue_files;
use crate::models::IssueFile;

/// Metadata of bytes that already sit on disk.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
}

pub struct FileRepository {
    conn: DatabaseConnection,
}

impl FileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        issue_id: IssueId,
        uploaded_by: UserId,
        stored: StoredFile,
    ) -> Result<IssueFile> {
        let active = issue_files::ActiveModel {
            filename: Set(stored.filename),
            original_name: Set(stored.original_name),
            file_path: Set(stored.file_path),
            file_size: Set(stored.file_size),
            content_type: Set(stored.content_type),
            issue_id: Set(issue_id.value()),
            uploaded_by: Set(uploaded_by.value()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert attachment")?;

        Ok(IssueFile::from(model))
    }

    pub async fn get(&self, id: FileId) -> Result<Option<IssueFile>> {
        let file = issue_files::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query attachment")?;

        Ok(file.map(IssueFile::from))
    }

    pub async fn delete(&self, id: FileId) -> Result<bool> {
        let result = issue_files::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete attachment")?;

        Ok(result.rows_affected > 0)
    }
}
