//! Folio Core Library
//!
//! This crate provides the domain model, error types, and configuration
//! shared across the Folio asset pipeline components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::Asset;
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in folio-storage.
// Import them directly from folio-storage instead of folio-core.
