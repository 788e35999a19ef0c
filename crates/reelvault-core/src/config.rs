//! Configuration module
//!
//! Configuration is read once by the caller and passed explicitly to the storage factory,
//! the transfer engine and the token issuer. Nothing here is global.

use std::env;
use std::fmt;

use crate::storage_types::StorageBackend;
use crate::ttl::{parse_ttl, ONE_HOUR};

// Common constants
const DEFAULT_UPLOAD_PREFIX: &str = "video/";
const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 3;
const DEFAULT_S3_REGION: &str = "auto";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Placeholder values shipped in sample configuration; flagged by [`SigningConfig::warnings`].
pub const PLACEHOLDER_BASE_URL: &str = "https://your-worker.workers.dev";
pub const PLACEHOLDER_SECRET: &str = "your-secret-key-change-this";

/// Object storage connection settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (R2, MinIO, ...).
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
}

/// Batch ingestion settings
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub default_prefix: String,
    pub max_concurrent: usize,
    pub skip_existing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT_UPLOADS,
            skip_existing: true,
        }
    }
}

/// Signed URL settings shared with the verifying gateway
#[derive(Clone)]
pub struct SigningConfig {
    pub base_url: String,
    pub secret: String,
    pub default_ttl_secs: u64,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish()
    }
}

impl SigningConfig {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
            default_ttl_secs: ONE_HOUR,
        }
    }

    /// Signing settings alone, for commands that never touch storage.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_ttl_secs = match first_set(&lookup, &["SIGNING_DEFAULT_TTL"]) {
            Some(value) => parse_ttl(&value)
                .map_err(|e| anyhow::anyhow!("SIGNING_DEFAULT_TTL is invalid: {}", e))?,
            None => ONE_HOUR,
        };

        let signing = SigningConfig {
            base_url: first_set(&lookup, &["SIGNING_BASE_URL", "WORKER_URL"])
                .unwrap_or_else(|| PLACEHOLDER_BASE_URL.to_string()),
            secret: first_set(&lookup, &["SIGNING_SECRET", "SECRET_KEY"])
                .unwrap_or_else(|| PLACEHOLDER_SECRET.to_string()),
            default_ttl_secs,
        };
        signing.validate()?;
        Ok(signing)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "SIGNING_BASE_URL must start with http:// or https://"
            ));
        }
        Ok(())
    }

    /// Warnings for placeholder values left in place.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.base_url.contains("your-worker") {
            warnings.push("SIGNING_BASE_URL is still the placeholder worker URL");
        }
        if self.secret.contains("change-this") {
            warnings.push("SIGNING_SECRET is still the placeholder secret");
        }
        warnings
    }
}

/// First non-empty value among `keys`, trimmed.
fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|key| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub signing: SigningConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Load `.env` (if present) and read configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |keys: &[&str]| first_set(&lookup, keys);

        let environment = var(&["ENVIRONMENT", "APP_ENV"]).unwrap_or_else(|| "development".to_string());

        let backend = match var(&["STORAGE_BACKEND"]) {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        // R2 exposes an S3 API under a per-account host.
        let endpoint = var(&["S3_ENDPOINT"]).or_else(|| {
            var(&["R2_ACCOUNT_ID"])
                .map(|account| format!("https://{}.r2.cloudflarestorage.com", account))
        });

        let storage = StorageConfig {
            backend,
            bucket: var(&["S3_BUCKET", "BUCKET_NAME"]),
            region: var(&["S3_REGION", "AWS_REGION"])
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            endpoint,
            access_key_id: var(&["AWS_ACCESS_KEY_ID", "R2_ACCESS_KEY_ID"]),
            secret_access_key: var(&["AWS_SECRET_ACCESS_KEY", "R2_SECRET_ACCESS_KEY"]),
            local_storage_path: var(&["LOCAL_STORAGE_PATH"]),
        };

        let ingest = IngestConfig {
            default_prefix: lookup("UPLOAD_PREFIX")
                .unwrap_or_else(|| DEFAULT_UPLOAD_PREFIX.to_string()),
            max_concurrent: var(&["UPLOAD_MAX_CONCURRENT"])
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_CONCURRENT_UPLOADS)
                .max(1),
            skip_existing: var(&["UPLOAD_SKIP_EXISTING"])
                .map(|s| s.to_lowercase())
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        };

        let signing = SigningConfig::from_lookup(&lookup)?;

        let config = Config {
            environment,
            storage,
            ingest,
            signing,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        if let Some(endpoint) = &self.storage.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "S3_ENDPOINT must start with http:// or https://"
                ));
            }
        }

        self.signing.validate()?;

        if self.is_production() {
            if !self.signing.warnings().is_empty() {
                return Err(anyhow::anyhow!(
                    "SIGNING_BASE_URL and SIGNING_SECRET must be set in production"
                ));
            }
            if self.signing.secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(anyhow::anyhow!(
                    "SIGNING_SECRET must be at least 32 characters long in production"
                ));
            }
        }

        Ok(())
    }
}
