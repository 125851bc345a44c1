//! Placeholder generator - derives a base64 ThumbHash token from an image file.

use crate::placeholder::thumbhash;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::imageops::FilterType;
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

/// Derives blur-up placeholder tokens from source images.
///
/// Generation is a pure read of the source file; it never mutates or deletes
/// its input. A failure to derive a placeholder is never an error: callers
/// get `None` and omit the blur-preview affordance for that asset.
#[derive(Debug, Clone)]
pub struct PlaceholderGenerator {
    max_width: u32,
    max_height: u32,
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        PlaceholderGenerator {
            max_width: 50,
            max_height: 50,
        }
    }
}

impl PlaceholderGenerator {
    /// Create a generator with an explicit downsample bounding box.
    /// Dimensions above 100 are clamped; the encoding is not defined past that.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        PlaceholderGenerator {
            max_width: max_width.clamp(1, 100),
            max_height: max_height.clamp(1, 100),
        }
    }

    pub fn from_config(config: &folio_core::Config) -> Self {
        Self::new(config.placeholder_max_width, config.placeholder_max_height)
    }

    /// Generate a base64 placeholder token for the image at `source_path`.
    ///
    /// Returns `None` for non-visual or corrupt input.
    pub async fn generate(&self, source_path: &Path) -> Option<String> {
        let data = match tokio::fs::read(source_path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(
                    path = %source_path.display(),
                    error = %e,
                    "Failed to read placeholder source, skipping"
                );
                return None;
            }
        };
        self.generate_from_bytes(&data)
    }

    /// Generate a base64 placeholder token from raw image bytes.
    pub fn generate_from_bytes(&self, data: &[u8]) -> Option<String> {
        let img = match ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?
            .decode()
        {
            Ok(img) => img,
            Err(e) => {
                tracing::debug!(error = %e, "Input is not a decodable image, no placeholder");
                return None;
            }
        };

        // Downsample to fit inside the bounding box, preserving aspect ratio
        // (no crop, no distortion), then force an alpha channel.
        let resized = img.resize(self.max_width, self.max_height, FilterType::Triangle);
        let rgba = resized.to_rgba8();

        // The encoding needs the actual post-resize dimensions: fitting
        // inside the box rarely lands exactly on the requested target, and
        // encoding with the nominal size corrupts the decode.
        let (w, h) = rgba.dimensions();

        match thumbhash::rgba_to_thumb_hash(w as usize, h as usize, rgba.as_raw()) {
            Ok(hash) => Some(BASE64.encode(hash)),
            Err(e) => {
                tracing::debug!(error = %e, width = w, height = h, "Placeholder encoding failed");
                None
            }
        }
    }
}
