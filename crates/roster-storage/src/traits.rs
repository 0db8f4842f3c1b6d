//! Storage abstraction trait
//!
//! Every backend implements the raw object operations. Key generation and
//! read-time resolution are provided on top of them so all backends share one
//! key layout and one failure policy.

use crate::keys::{self, KeyContext, StorageFolder};
use crate::StorageBackend;
use async_trait::async_trait;
use roster_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under an exact key, replacing any previous object.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Backend-specific URL for a key. Remote backends sign a fresh URL on
    /// every call.
    async fn url_for(&self, storage_key: &str) -> StorageResult<String>;

    fn backend_type(&self) -> StorageBackend;

    /// Persist an upload and return its key.
    ///
    /// With a `context` the key is derived from the owner, so uploading again
    /// for the same owner overwrites the previous file.
    async fn store(
        &self,
        folder: StorageFolder,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
        context: Option<&KeyContext>,
    ) -> StorageResult<String> {
        let key = keys::generate_key(folder, filename, context)?;
        self.upload_with_key(&key, data, content_type).await?;
        Ok(key)
    }

    /// Resolve a persisted key into a URL.
    ///
    /// Never fails: blank input and backend errors both yield `None`, which
    /// callers render as "no image".
    async fn resolve(&self, storage_key: Option<&str>) -> Option<String> {
        let key = keys::normalize_key(storage_key?)?;
        match self.url_for(&key).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %key,
                    backend = %self.backend_type(),
                    "Failed to resolve storage key"
                );
                None
            }
        }
    }
}
