//! Attachment handling: the disk side lives in [`FileStorage`], the
//! permission and record side in [`FileService`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Actor, FileId, IssueId};
use crate::models::IssueFile;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    #[error("File not found")]
    NotFound,

    #[error("File not found on disk")]
    MissingOnDisk,

    #[error("Not enough permissions")]
    Forbidden,

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for FileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// An upload as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Attachment bytes ready to be streamed back.
#[derive(Debug, Clone)]
pub struct Download {
    pub file: IssueFile,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait FileService: Send + Sync {
    /// Stores `upload` against an issue the actor can view.
    ///
    /// # Errors
    ///
    /// - [`FileError::IssueNotFound`] if the issue does not exist
    /// - [`FileError::Forbidden`] without view rights on the issue
    /// - [`FileError::TooLarge`] before anything is written to disk
    async fn upload(
        &self,
        issue_id: IssueId,
        upload: Upload,
        actor: &Actor,
    ) -> Result<IssueFile, FileError>;

    /// Reads back an attachment. The record and the bytes on disk are checked
    /// separately and each reports its own not-found.
    async fn download(&self, id: FileId, actor: &Actor) -> Result<Download, FileError>;

    /// Needs edit rights on the owning issue. Missing bytes on disk are not an error.
    async fn delete(&self, id: FileId, actor: &Actor) -> Result<(), FileError>;
}

/// Flat directory of uploaded bytes, named by generated ids.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collision-resistant storage name keeping the original extension.
    #[must_use]
    pub fn storage_name(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()));

        match ext {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        }
    }

    pub async fn write(&self, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// `None` when nothing exists at `path`.
    pub async fn read(&self, path: &str) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Best-effort removal; a missing file is fine, other failures are logged.
    pub async fn remove(&self, path: &str) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path, error = %e, "Failed to remove attachment from disk"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_keep_safe_extensions() {
        let name = FileStorage::storage_name("report.PDF");
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 36 + 4);

        assert_ne!(
            FileStorage::storage_name("a.txt"),
            FileStorage::storage_name("a.txt")
        );

        let bare = FileStorage::storage_name("Makefile");
        assert_eq!(bare.len(), 36);

        let sneaky = FileStorage::storage_name("x./../etc");
        assert!(!sneaky.contains('/'));
    }

    #[tokio::test]
    async fn read_reports_missing_files_as_none() {
        let dir = std::env::temp_dir().join(format!("bugdesk-storage-{}", Uuid::new_v4()));
        let storage = FileStorage::new(&dir);

        let path = storage.write("a.bin", b"abc").await.unwrap();
        let path = path.to_string_lossy().to_string();
        assert_eq!(storage.read(&path).await.unwrap(), Some(b"abc".to_vec()));

        storage.remove(&path).await;
        storage.remove(&path).await;
        assert_eq!(storage.read(&path).await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }
}
