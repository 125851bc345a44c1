//! Placeholder derivation
//!
//! This module turns an arbitrary-size source image into a tiny, fixed-budget
//! perceptual placeholder suitable for embedding directly in a page response:
//! - ThumbHash encoding and decoding (thumbhash)
//! - file-to-token generation (generator)

pub mod generator;
pub mod thumbhash;

pub use generator::PlaceholderGenerator;
pub use thumbhash::{rgba_to_thumb_hash, thumb_hash_to_rgba};
