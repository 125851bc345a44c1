//! Asset value object.
//!
//! An asset is not a standalone stored entity: it is embedded in the owning
//! content record (a project, an experience, ...) by the caller, which
//! persists both fields verbatim. Ownership is exclusive and 1:1 - the
//! asset's binary lives and dies with its owning entity.

use serde::{Deserialize, Serialize};

/// The result bundle of a successful store operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Public-facing URL of the stored binary. Environment-dependent:
    /// site-relative (`/uploads/projects/x.png`) for local storage, absolute
    /// for remote object storage. Must be dereferenceable at read time.
    #[serde(rename = "imageUrl")]
    pub public_url: String,

    /// Base64-encoded compact placeholder blob for blur-up previews, or
    /// `None` when derivation was not possible. Consumers decode this back
    /// into a low-res image; the two sides must agree on the encoding bit
    /// for bit.
    #[serde(rename = "imagePlaceholderUrl")]
    pub placeholder: Option<String>,
}

impl Asset {
    pub fn new(public_url: String, placeholder: Option<String>) -> Self {
        Asset {
            public_url,
            placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_serializes_with_entity_field_names() {
        let asset = Asset::new("/uploads/projects/a.png".to_string(), Some("1QcSHQ".to_string()));
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["imageUrl"], "/uploads/projects/a.png");
        assert_eq!(json["imagePlaceholderUrl"], "1QcSHQ");
    }

    #[test]
    fn test_asset_placeholder_is_optional() {
        let json = r#"{"imageUrl":"/uploads/projects/a.png","imagePlaceholderUrl":null}"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        assert!(asset.placeholder.is_none());
    }
}
