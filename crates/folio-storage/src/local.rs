use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use folio_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "public")
    /// * `base_url` - Base URL for serving files; empty produces
    ///   site-relative URLs (e.g., "/uploads/projects/x.png")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// This function validates that the storage key doesn't contain path
    /// traversal sequences that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        keys::validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // The file itself may not exist yet (e.g. before a write); canonicalize
        // what does exist and verify it stays under the base directory.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Generate public URL for a storage key
    fn generate_url(&self, key: &str) -> String {
        if self.base_url.is_empty() {
            format!("/{}", key)
        } else {
            format!("{}/{}", self.base_url, key)
        }
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(
        &self,
        category: &str,
        original_filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = keys::generate_storage_key(category, original_filename)?;
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage store successful"
        );

        Ok((key, url))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(data)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn key_for_url(&self, public_url: &str) -> Option<String> {
        let key = if self.base_url.is_empty() {
            public_url.strip_prefix('/')?
        } else {
            public_url.strip_prefix(&self.base_url)?.strip_prefix('/')?
        };
        if keys::validate_key(key).is_err() || !key.starts_with("uploads/") {
            return None;
        }
        Some(key.to_string())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_store_download() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), String::new()).await.unwrap();

        let data = b"test data".to_vec();
        let (key, url) = storage
            .store("projects", "test.txt", "text/plain", data.clone())
            .await
            .unwrap();

        assert!(key.starts_with("uploads/projects/"));
        assert_eq!(url, format!("/{}", key));

        let downloaded = storage.download(&key).await.unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), String::new()).await.unwrap();

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), String::new()).await.unwrap();

        let (key, _) = storage
            .store("projects", "gone.txt", "text/plain", b"x".to_vec())
            .await
            .unwrap();

        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());

        // Second delete of the same key is a no-op, not an error.
        storage.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), String::new()).await.unwrap();

        let result = storage.delete("uploads/projects/does-not-exist.png").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_key_for_url_round_trip() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), String::new()).await.unwrap();

        let (key, url) = storage
            .store("projects", "a.png", "image/png", b"x".to_vec())
            .await
            .unwrap();

        assert_eq!(storage.key_for_url(&url), Some(key));
        assert_eq!(storage.key_for_url("https://elsewhere.example/x.png"), None);
        assert_eq!(storage.key_for_url("/other/a.png"), None);
    }

    #[tokio::test]
    async fn test_key_for_url_with_base_url() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000".to_string())
            .await
            .unwrap();

        let (key, url) = storage
            .store("projects", "a.png", "image/png", b"x".to_vec())
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:3000/uploads/projects/"));
        assert_eq!(storage.key_for_url(&url), Some(key));
    }
}
