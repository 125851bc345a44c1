//! Folio Processing Library
//!
//! This crate derives blur-up placeholders from uploaded images and
//! sequences the asset lifecycle (create / replace / delete) so that no
//! orphaned binaries remain behind a content entity.

pub mod lifecycle;
pub mod placeholder;

// Re-export commonly used types
pub use lifecycle::AssetPipeline;
pub use placeholder::PlaceholderGenerator;
