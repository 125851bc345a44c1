//! Asset lifecycle operations: sequencing storage and placeholder derivation
//! for create / replace / delete of a content entity's image.
//!
//! The pipeline does not persist entity state; callers store the returned
//! [`Asset`] on the owning record. What the pipeline does guarantee is that
//! no orphaned binary remains reachable after an operation, on success or
//! failure:
//!
//! - create: a failed store returns an error and nothing referenced by a URL
//!   is left behind;
//! - replace: the new binary is fully stored before the old one is removed,
//!   so a failure leaves the old URL serving;
//! - stale-object removal failures are logged and swallowed - a minor leak,
//!   not a correctness violation.
//!
//! All steps run in strict sequence within one request. Concurrent updates
//! to the same entity are not coordinated here; the last writer to persist
//! the entity record wins.

use folio_core::{Asset, AppError};
use folio_storage::Storage;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::placeholder::PlaceholderGenerator;

/// Sequences storage and placeholder operations for a content entity's image.
pub struct AssetPipeline {
    storage: Arc<dyn Storage>,
    placeholder: PlaceholderGenerator,
}

impl AssetPipeline {
    pub fn new(storage: Arc<dyn Storage>, placeholder: PlaceholderGenerator) -> Self {
        AssetPipeline {
            storage,
            placeholder,
        }
    }

    /// Store a new binary and derive its placeholder.
    ///
    /// The placeholder is derived from a scratch copy of the upload; the
    /// scratch file is removed on every exit path. Placeholder derivation
    /// failure is non-fatal (`Asset.placeholder` is `None`); a store failure
    /// is fatal and leaves nothing behind.
    pub async fn create(
        &self,
        data: Vec<u8>,
        original_filename: &str,
        category: &str,
    ) -> Result<Asset, AppError> {
        let placeholder = self.stage_and_derive(&data, original_filename).await;

        let content_type = content_type_for(original_filename);
        let (key, url) = self
            .storage
            .store(category, original_filename, content_type, data)
            .await?;

        tracing::info!(
            key = %key,
            category = %category,
            has_placeholder = placeholder.is_some(),
            "Asset stored"
        );

        Ok(Asset::new(url, placeholder))
    }

    /// Replace an entity's binary: store the new asset, then retire the old.
    ///
    /// The new asset is fully stored before `old_url` is touched, so a
    /// failure while writing leaves the old asset valid and serving. Failure
    /// to remove the old binary afterwards does not fail the replacement.
    pub async fn replace(
        &self,
        data: Vec<u8>,
        original_filename: &str,
        category: &str,
        old_url: &str,
    ) -> Result<Asset, AppError> {
        let asset = self.create(data, original_filename, category).await?;
        self.retire(old_url).await;
        Ok(asset)
    }

    /// Apply an update that may or may not carry a new binary.
    ///
    /// Without a new binary this is a passthrough: the current asset is
    /// returned unchanged.
    pub async fn update(
        &self,
        new_binary: Option<(Vec<u8>, String)>,
        category: &str,
        current: Asset,
    ) -> Result<Asset, AppError> {
        match new_binary {
            None => Ok(current),
            Some((data, original_filename)) => {
                self.replace(data, &original_filename, category, &current.public_url)
                    .await
            }
        }
    }

    /// Delete the binary behind a public URL when the owning entity goes away.
    ///
    /// Idempotent: an already-gone object (or a URL this backend never
    /// produced) never fails the entity deletion.
    pub async fn delete(&self, public_url: &str) {
        self.retire(public_url).await;
    }

    /// Write the upload to a scratch file and derive the placeholder from it.
    ///
    /// The scratch file is scoped to this invocation: `tempfile` unlinks it
    /// on drop, covering error paths; the explicit close on the success path
    /// lets us log a failed cleanup without failing the upload.
    async fn stage_and_derive(&self, data: &[u8], original_filename: &str) -> Option<String> {
        let suffix = std::path::Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let scratch = match tempfile::Builder::new()
            .prefix("folio-staging-")
            .suffix(&suffix)
            .tempfile()
        {
            Ok(scratch) => scratch,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create scratch file, skipping placeholder");
                return None;
            }
        };

        if let Err(e) = write_scratch(scratch.path(), data).await {
            tracing::warn!(error = %e, "Failed to write scratch file, skipping placeholder");
            return None;
        }

        let placeholder = self.placeholder.generate(scratch.path()).await;

        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "Failed to remove scratch file");
        }

        placeholder
    }

    /// Best-effort removal of the binary behind a public URL.
    async fn retire(&self, public_url: &str) {
        if public_url.is_empty() {
            return;
        }

        let Some(key) = self.storage.key_for_url(public_url) else {
            tracing::warn!(
                url = %public_url,
                "URL does not belong to the active storage backend, skipping removal"
            );
            return;
        };

        if let Err(e) = self.storage.delete(&key).await {
            tracing::warn!(
                error = %e,
                url = %public_url,
                key = %key,
                "Failed to remove stale asset binary"
            );
        }
    }
}

async fn write_scratch(path: &std::path::Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

fn content_type_for(filename: &str) -> &'static str {
    match std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
