//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use folio_core::StorageBackend;
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

impl From<StorageError> for folio_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => folio_core::AppError::Config(msg),
            StorageError::NotFound(msg) => folio_core::AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => folio_core::AppError::InvalidInput(msg),
            other => folio_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// This allows the asset pipeline to work with any storage backend without
/// coupling to specific implementation details.
///
/// **Key format:** `uploads/{category}/{uuid}.{ext}`. See the crate root
/// documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a binary under a logical category and return (storage_key, public_url).
    ///
    /// The original filename contributes only its extension; the stored name
    /// is generated to be collision-resistant. The returned URL is
    /// immediately readable.
    async fn store(
        &self,
        category: &str,
        original_filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key.
    ///
    /// Idempotent: deleting a key that does not correspond to an existing
    /// object is a no-op, not an error. Callers delete speculatively during
    /// cleanup after partial failures.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Map a public URL produced by this backend back to its storage key.
    ///
    /// Returns `None` for URLs that do not belong to this backend; callers
    /// treat that as nothing-to-delete.
    fn key_for_url(&self, public_url: &str) -> Option<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
