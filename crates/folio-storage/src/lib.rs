//! Folio Storage Library
//!
//! This crate decides where an uploaded binary physically lives (local
//! filesystem or remote object storage) and produces its stable public URL.
//! It includes the Storage trait and implementations for S3 and the local
//! filesystem.
//!
//! # Storage key format
//!
//! All backends use the same key layout for consistency:
//!
//! - `uploads/{category}/{uuid}.{ext}`
//!
//! The caller-supplied filename contributes only its extension; the stored
//! name is freshly generated so concurrent uploads into the same category
//! can never overwrite each other. Keys must not contain `..` or a leading
//! `/`. Key generation is centralized in the `keys` module so all backends
//! stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use folio_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
