//! Configuration module
//!
//! One explicit startup-time configuration struct. The environment is read
//! exactly once in [`Config::from_env`]; no component inspects environment
//! variables at call sites. The storage backend decision derived from this
//! struct is likewise made once, at startup (see [`Config::resolve_backend`]).

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_PLACEHOLDER_MAX_WIDTH: u32 = 50;
const DEFAULT_PLACEHOLDER_MAX_HEIGHT: u32 = 50;

/// Application configuration for the asset pipeline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Deployment environment name ("development", "production", ...).
    pub environment: String,
    /// Explicit backend override (STORAGE_BACKEND). When absent, production
    /// mandates S3 and everything else defaults to local disk.
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, Spaces, etc.)
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    /// Root directory for local storage. Defaults to "public" so keys like
    /// `uploads/projects/<name>.png` land under `public/uploads/projects/`.
    pub local_storage_path: String,
    /// Base URL prefix for locally stored files. Empty means site-relative
    /// URLs (`/uploads/...`).
    pub local_storage_base_url: String,
    /// Bounding box for placeholder downsampling (fit inside, no crop).
    pub placeholder_max_width: u32,
    pub placeholder_max_height: u32,
}

impl Config {
    /// Check if the application is running in production mode.
    ///
    /// Production is the "hosted" signal: local disk does not survive
    /// redeploys there, so production mandates remote storage unless an
    /// explicit backend override says otherwise.
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => Some(StorageBackend::from_str(&s)?),
            Err(_) => None,
        };

        let config = Config {
            environment,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "public".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_default(),
            placeholder_max_width: env::var("PLACEHOLDER_MAX_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PLACEHOLDER_MAX_WIDTH),
            placeholder_max_height: env::var("PLACEHOLDER_MAX_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PLACEHOLDER_MAX_HEIGHT),
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolve the storage backend for this process.
    ///
    /// Explicit `STORAGE_BACKEND` wins. Otherwise production mandates S3
    /// (never a silent fallback to ephemeral local disk) and any other
    /// environment uses local storage.
    pub fn resolve_backend(&self) -> StorageBackend {
        if let Some(backend) = self.storage_backend {
            return backend;
        }
        if self.is_production() {
            StorageBackend::S3
        } else {
            StorageBackend::Local
        }
    }

    /// True when the S3 credential surface is complete enough to build a client.
    pub fn has_s3_config(&self) -> bool {
        self.s3_bucket.is_some() && (self.s3_region.is_some() || self.aws_region.is_some())
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.placeholder_max_width == 0 || self.placeholder_max_height == 0 {
            return Err(anyhow::anyhow!(
                "PLACEHOLDER_MAX_WIDTH and PLACEHOLDER_MAX_HEIGHT must be non-zero"
            ));
        }

        if self.placeholder_max_width > 100 || self.placeholder_max_height > 100 {
            // The placeholder encoding is only defined for inputs up to 100x100.
            return Err(anyhow::anyhow!(
                "PLACEHOLDER_MAX_WIDTH and PLACEHOLDER_MAX_HEIGHT must be at most 100"
            ));
        }

        if self.storage_backend == Some(StorageBackend::Local) && self.local_storage_path.is_empty()
        {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when using local storage backend"
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: "development".to_string(),
            storage_backend: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            local_storage_path: "public".to_string(),
            local_storage_base_url: String::new(),
            placeholder_max_width: DEFAULT_PLACEHOLDER_MAX_WIDTH,
            placeholder_max_height: DEFAULT_PLACEHOLDER_MAX_HEIGHT,
        }
    }
}
