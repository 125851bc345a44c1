//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{category}/{uuid}.{ext}`. The UUID makes stored
//! names collision-resistant so concurrent uploads into the same category
//! never overwrite each other; the caller-supplied filename is used only to
//! infer an extension.

use crate::traits::{StorageError, StorageResult};
use uuid::Uuid;

const UPLOADS_PREFIX: &str = "uploads";
const DEFAULT_EXTENSION: &str = "jpg";

/// Generate a storage key for the given category and original filename.
///
/// All backends must use this format for consistency.
pub fn generate_storage_key(category: &str, original_filename: &str) -> StorageResult<String> {
    let category = sanitize_category(category)?;
    let ext = infer_extension(original_filename);
    Ok(format!(
        "{}/{}/{}.{}",
        UPLOADS_PREFIX,
        category,
        Uuid::new_v4(),
        ext
    ))
}

/// Infer a file extension from the original filename, falling back to `jpg`
/// when none is present.
pub fn infer_extension(filename: &str) -> String {
    let ext: String = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Validate a storage key before it touches a backend.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn sanitize_category(category: &str) -> StorageResult<String> {
    let sanitized: String = category
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "Invalid storage category: {:?}",
            category
        )));
    }
    Ok(sanitized)
}
