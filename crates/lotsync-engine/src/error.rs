//! Error taxonomy for the sync engine.
//!
//! Client-level errors (`CatalogError`, `CmsError`) describe individual
//! service failures; `SyncError` is the pass-level view. Fatal classes
//! abort a pass before any mutation is attempted; recovered classes are
//! captured per record in the pass summary instead.

use thiserror::Error;

/// Errors from the source catalog service.
///
/// Every variant is fatal to a pass: a partial source view would read as
/// deletions downstream.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog endpoint returned a non-success status.
    #[error("catalog unavailable (HTTP {status}): {detail}")]
    Unavailable { status: u16, detail: String },

    /// The response body could not be parsed as structured data.
    #[error("malformed catalog response: {0}")]
    Malformed(String),

    /// A media asset could not be retrieved or decoded.
    #[error("media {media_id}: {message}")]
    Media { media_id: String, message: String },

    /// Transport-level failure.
    #[error("catalog transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl CatalogError {
    /// Create an unavailable error from a status code and response body.
    pub fn unavailable(status: u16, detail: impl Into<String>) -> Self {
        Self::Unavailable {
            status,
            detail: detail.into(),
        }
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Create a media error.
    pub fn media(media_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Media {
            media_id: media_id.into(),
            message: message.into(),
        }
    }
}

/// Errors from the destination content service.
#[derive(Debug, Error)]
pub enum CmsError {
    /// The requested item does not exist (or is not live).
    #[error("not found: {0}")]
    NotFound(String),

    /// The destination rejected the call with 429.
    #[error("destination rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success API response.
    #[error("destination API error (HTTP {status}): {detail}")]
    Api { status: u16, detail: String },

    /// The response body could not be parsed.
    #[error("failed to parse destination response: {0}")]
    Parse(String),

    /// Transport-level failure.
    #[error("destination transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The client was constructed with invalid configuration.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Retries were exhausted for an operation.
    #[error("gave up after {attempts} attempt(s): {message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl CmsError {
    /// Whether the error is transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CmsError::RateLimited { .. } | CmsError::Transport(_)
        )
    }

    /// Whether the error is a server-side (5xx) failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, CmsError::Api { status, .. } if *status >= 500)
    }

    /// Whether the error is a missing-resource response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound(_))
    }
}

/// Durable cursor store failure.
#[derive(Debug, Error)]
#[error("cursor store error: {0}")]
pub struct CursorError(pub String);

impl CursorError {
    /// Create a cursor store error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Mapper collaborator failure for a single record.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MapError {
    /// What went wrong while mapping.
    pub message: String,
}

impl MapError {
    /// Create a mapping error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pass-level errors surfaced by the reconciler.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source catalog unreachable or returned garbage.
    #[error("upstream catalog error: {0}")]
    Upstream(#[from] CatalogError),

    /// Destination could not be read during setup, or the reference
    /// collection could not be resolved. An incomplete index would cause
    /// both false creates and false deletes.
    #[error("destination error: {0}")]
    Destination(#[from] CmsError),

    /// The durable cursor store failed.
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// A single record failed to map. Recovered by the reconciler, never
    /// surfaced from a completed pass.
    #[error("mapping failed for {external_id}: {message}")]
    Mapping {
        external_id: String,
        message: String,
    },
}

impl SyncError {
    /// Create a per-record mapping error.
    pub fn mapping(external_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            external_id: external_id.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a whole pass.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SyncError::Mapping { .. })
    }
}

/// Result type for pass-level operations.
pub type SyncResult<T> = Result<T, SyncError>;
