//! `SeaORM` implementation of the `FileService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{StoredFile, Store};
use crate::domain::permissions::{can_edit_issue, can_view_issue};
use crate::domain::{Actor, FileId, IssueId, UserId};
use crate::models::IssueFile;
use crate::services::file_service::{Download, FileError, FileService, FileStorage, Upload};

pub struct SeaOrmFileService {
    store: Store,
    storage: FileStorage,
    max_file_size: u64,
}

impl SeaOrmFileService {
    #[must_use]
    pub const fn new(store: Store, storage: FileStorage, max_file_size: u64) -> Self {
        Self {
            store,
            storage,
            max_file_size,
        }
    }

    /// Reporter of the issue that owns `file`.
    async fn owner_of(&self, file: &IssueFile) -> Result<UserId, FileError> {
        let issue = self
            .store
            .get_issue(file.issue_id)
            .await?
            .ok_or(FileError::IssueNotFound(file.issue_id))?;
        Ok(issue.reporter_id)
    }

    async fn load(&self, id: FileId) -> Result<IssueFile, FileError> {
        self.store.get_file(id).await?.ok_or(FileError::NotFound)
    }
}

#[async_trait]
impl FileService for SeaOrmFileService {
    async fn upload(
        &self,
        issue_id: IssueId,
        upload: Upload,
        actor: &Actor,
    ) -> Result<IssueFile, FileError> {
        let issue = self
            .store
            .get_issue(issue_id)
            .await?
            .ok_or(FileError::IssueNotFound(issue_id))?;
        if !can_view_issue(actor.role, issue.reporter_id, actor.id) {
            return Err(FileError::Forbidden);
        }

        let size = upload.bytes.len() as u64;
        if size > self.max_file_size {
            return Err(FileError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        let original_name = upload.original_name.trim().to_string();
        if original_name.is_empty() {
            return Err(FileError::Validation("File name is required".to_string()));
        }

        let content_type = upload.content_type.unwrap_or_else(|| {
            mime_guess::from_path(&original_name)
                .first_or_octet_stream()
                .to_string()
        });

        let filename = FileStorage::storage_name(&original_name);
        let path = self.storage.write(&filename, &upload.bytes).await?;
        let file_path = path.to_string_lossy().to_string();

        let stored = StoredFile {
            filename,
            original_name,
            file_path: file_path.clone(),
            file_size: i64::try_from(size).unwrap_or(i64::MAX),
            content_type,
        };

        match self.store.add_file(issue_id, actor.id, stored).await {
            Ok(file) => {
                info!(file_id = %file.id, issue_id = %issue_id, size, "Attachment stored");
                Ok(file)
            }
            Err(e) => {
                warn!(path = %file_path, "Attachment record failed, removing written bytes");
                self.storage.remove(&file_path).await;
                Err(e.into())
            }
        }
    }

    async fn download(&self, id: FileId, actor: &Actor) -> Result<Download, FileError> {
        let file = self.load(id).await?;
        let owner = self.owner_of(&file).await?;
        if !can_view_issue(actor.role, owner, actor.id) {
            return Err(FileError::Forbidden);
        }

        let bytes = self
            .storage
            .read(&file.file_path)
            .await?
            .ok_or(FileError::MissingOnDisk)?;

        Ok(Download { file, bytes })
    }

    async fn delete(&self, id: FileId, actor: &Actor) -> Result<(), FileError> {
        let file = self.load(id).await?;
        let owner = self.owner_of(&file).await?;
        if !can_edit_issue(actor.role, owner, actor.id) {
            return Err(FileError::Forbidden);
        }

        self.storage.remove(&file.file_path).await;
        if !self.store.delete_file(id).await? {
            return Err(FileError::NotFound);
        }

        info!(file_id = %id, actor = %actor.id, "Attachment deleted");
        Ok(())
    }
}
