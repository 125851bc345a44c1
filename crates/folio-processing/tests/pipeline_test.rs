//! End-to-end tests for the asset pipeline against a tempdir-backed local
//! storage, including failure injection for the replacement ordering
//! guarantee.

use async_trait::async_trait;
use folio_core::Asset;
use folio_processing::{AssetPipeline, PlaceholderGenerator};
use folio_storage::{LocalStorage, Storage, StorageBackend, StorageError, StorageResult};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

fn red_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

async fn local_pipeline() -> (TempDir, Arc<dyn Storage>, AssetPipeline) {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(dir.path(), String::new()).await.unwrap(),
    );
    let pipeline = AssetPipeline::new(storage.clone(), PlaceholderGenerator::default());
    (dir, storage, pipeline)
}

/// Storage double whose writes always fail; reads and deletes pass through.
struct FailingStore {
    inner: Arc<dyn Storage>,
}

#[async_trait]
impl Storage for FailingStore {
    async fn store(
        &self,
        _category: &str,
        _original_filename: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        Err(StorageError::UploadFailed("injected failure".to_string()))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn key_for_url(&self, public_url: &str) -> Option<String> {
        self.inner.key_for_url(public_url)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

#[tokio::test]
async fn test_create_stores_binary_and_placeholder() {
    let (_dir, storage, pipeline) = local_pipeline().await;

    let asset = pipeline
        .create(red_png(10, 10), "red.png", "projects")
        .await
        .unwrap();

    assert!(asset.public_url.starts_with("/uploads/projects/"));
    assert!(asset.public_url.ends_with(".png"));
    assert!(asset.placeholder.is_some());

    // The returned URL is immediately readable.
    let key = storage.key_for_url(&asset.public_url).unwrap();
    let data = storage.download(&key).await.unwrap();
    assert_eq!(data, red_png(10, 10));
}

#[tokio::test]
async fn test_create_with_non_image_stores_without_placeholder() {
    let (_dir, storage, pipeline) = local_pipeline().await;

    let asset = pipeline
        .create(b"plain text".to_vec(), "notes.txt", "projects")
        .await
        .unwrap();

    // Placeholder failure is non-fatal: the asset is stored and usable.
    assert!(asset.placeholder.is_none());
    let key = storage.key_for_url(&asset.public_url).unwrap();
    assert!(storage.exists(&key).await.unwrap());
}

#[tokio::test]
async fn test_replace_retires_old_binary() {
    let (_dir, storage, pipeline) = local_pipeline().await;

    let old = pipeline
        .create(red_png(10, 10), "red.png", "projects")
        .await
        .unwrap();
    let new = pipeline
        .replace(red_png(20, 20), "red2.png", "projects", &old.public_url)
        .await
        .unwrap();

    assert_ne!(old.public_url, new.public_url);

    let old_key = storage.key_for_url(&old.public_url).unwrap();
    let new_key = storage.key_for_url(&new.public_url).unwrap();
    assert!(!storage.exists(&old_key).await.unwrap());
    assert!(storage.exists(&new_key).await.unwrap());
}

#[tokio::test]
async fn test_failed_replacement_leaves_old_asset_serving() {
    let (_dir, storage, pipeline) = local_pipeline().await;

    let old = pipeline
        .create(red_png(10, 10), "red.png", "projects")
        .await
        .unwrap();

    let failing = AssetPipeline::new(
        Arc::new(FailingStore {
            inner: storage.clone(),
        }),
        PlaceholderGenerator::default(),
    );

    let result = failing
        .replace(red_png(20, 20), "red2.png", "projects", &old.public_url)
        .await;
    assert!(result.is_err());

    // The old binary must not have been removed and its URL still serves.
    let old_key = storage.key_for_url(&old.public_url).unwrap();
    assert!(storage.exists(&old_key).await.unwrap());
    assert!(storage.download(&old_key).await.is_ok());
}

#[tokio::test]
async fn test_update_without_new_binary_is_a_passthrough() {
    let (_dir, _storage, pipeline) = local_pipeline().await;

    let current = Asset::new(
        "/uploads/projects/existing.png".to_string(),
        Some("token".to_string()),
    );
    let result = pipeline
        .update(None, "projects", current.clone())
        .await
        .unwrap();

    assert_eq!(result, current);
}

#[tokio::test]
async fn test_update_with_new_binary_replaces() {
    let (_dir, storage, pipeline) = local_pipeline().await;

    let current = pipeline
        .create(red_png(10, 10), "red.png", "projects")
        .await
        .unwrap();
    let updated = pipeline
        .update(
            Some((red_png(12, 12), "blue.png".to_string())),
            "projects",
            current.clone(),
        )
        .await
        .unwrap();

    assert_ne!(updated.public_url, current.public_url);
    let old_key = storage.key_for_url(&current.public_url).unwrap();
    assert!(!storage.exists(&old_key).await.unwrap());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (_dir, storage, pipeline) = local_pipeline().await;

    let asset = pipeline
        .create(red_png(10, 10), "red.png", "projects")
        .await
        .unwrap();
    let key = storage.key_for_url(&asset.public_url).unwrap();

    pipeline.delete(&asset.public_url).await;
    assert!(!storage.exists(&key).await.unwrap());

    // Deleting again, or deleting something that never existed, is a no-op.
    pipeline.delete(&asset.public_url).await;
    pipeline.delete("/uploads/projects/does-not-exist.png").await;
    pipeline.delete("").await;
}

#[tokio::test]
async fn test_placeholder_decodes_on_the_rendering_side() {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let (_dir, _storage, pipeline) = local_pipeline().await;

    let asset = pipeline
        .create(red_png(64, 48), "red.png", "projects")
        .await
        .unwrap();

    let blob = BASE64.decode(asset.placeholder.unwrap()).unwrap();
    assert!(blob.len() <= 25);

    let (w, h, rgba) = folio_processing::placeholder::thumb_hash_to_rgba(&blob).unwrap();
    assert!(w >= h, "landscape source should decode landscape");
    // Red-dominant everywhere, matching the solid source color.
    for px in rgba.chunks_exact(4) {
        assert!(px[0] > px[1] && px[0] > px[2]);
    }
}
