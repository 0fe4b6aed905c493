//! Application configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and valid or the
//! invocation exits with a clear error before any network call is made.

use std::env;
use thiserror::Error;

use lotsync_engine::MAX_BATCH_LIMIT;

/// Default per-lane batch budget.
const DEFAULT_BATCH_LIMIT: usize = MAX_BATCH_LIMIT;

/// Default destination request ceiling.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default directory for the cursor file.
const DEFAULT_CURSOR_DIR: &str = ".lotsync";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    /// A variable is present but cannot be parsed.
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the source catalog API.
    pub source_url: String,
    /// Basic-auth username for the source API.
    pub source_user: String,
    /// Basic-auth password for the source API.
    pub source_pass: String,
    /// Base URL of the destination content API.
    pub cms_url: String,
    /// Bearer token for the destination API.
    pub cms_token: String,
    /// Destination collection holding the mirrored listings.
    pub listing_collection: String,
    /// Destination collection holding the feature references.
    pub feature_collection: String,
    /// Public origin used to build media proxy URLs.
    pub media_origin: String,
    /// Per-lane batch budget.
    pub batch_limit: usize,
    /// Destination request ceiling.
    pub requests_per_minute: u32,
    /// Directory holding the cold-lane cursor file.
    pub cursor_dir: String,
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            source_url: required("SOURCE_API_URL")?,
            source_user: required("SOURCE_API_USER")?,
            source_pass: required("SOURCE_API_PASS")?,
            cms_url: required("CMS_API_URL")?,
            cms_token: required("CMS_TOKEN")?,
            listing_collection: required("CMS_LISTING_COLLECTION")?,
            feature_collection: required("CMS_FEATURE_COLLECTION")?,
            media_origin: required("MEDIA_ORIGIN")?,
            batch_limit: parsed("SYNC_BATCH_LIMIT", DEFAULT_BATCH_LIMIT)?,
            requests_per_minute: parsed("SYNC_REQUESTS_PER_MINUTE", DEFAULT_REQUESTS_PER_MINUTE)?,
            cursor_dir: env::var("SYNC_CURSOR_DIR").unwrap_or_else(|_| DEFAULT_CURSOR_DIR.into()),
        })
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var.to_string())),
    }
}

fn parsed<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) if !value.is_empty() => {
            value.parse().map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("{e}"),
            })
        }
        _ => Ok(default),
    }
}
