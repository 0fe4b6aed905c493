//! Source catalog client.
//!
//! Fetches the full catalog snapshot and normalizes the two response
//! shapes observed from the source API over time: an object of records
//! keyed by identifier, and a single record object. Later components only
//! ever see [`SourceRecord`]s.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::CatalogError;
use crate::traits::CatalogSource;
use crate::types::{CatalogSnapshot, SourceRecord};

/// Path of the full-catalog listing endpoint.
const LISTINGS_PATH: &str = "/sale/listings/";

/// Path of the media retrieval endpoint.
const MEDIA_PATH: &str = "/data/media/";

/// A media asset fetched from the source, decoded to raw bytes.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// Decoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type derived from the declared file extension.
    pub content_type: String,
}

/// HTTP client for the source catalog service.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    credentials: Credentials,
    http_client: Client,
}

impl CatalogClient {
    /// Create a new catalog client.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("lotsync/0.3")
            .build()?;
        Ok(Self::with_http_client(base_url, credentials, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        base_url: impl Into<String>,
        credentials: Credentials,
        http_client: Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            credentials,
            http_client,
        }
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full catalog as a keyed snapshot.
    pub async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let url = format!("{}{}", self.base_url, LISTINGS_PATH);
        debug!(url = %url, "Fetching catalog snapshot");

        let response = self
            .credentials
            .apply(self.http_client.get(&url))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::unavailable(status.as_u16(), body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| CatalogError::malformed(format!("invalid JSON: {e}")))?;

        let snapshot = normalize_snapshot(value)?;
        debug!(
            count = snapshot.len(),
            malformed = snapshot.malformed,
            "Catalog snapshot fetched"
        );
        Ok(snapshot)
    }

    /// Fetch one media asset and decode its payload to raw bytes.
    ///
    /// The source wraps media in a JSON envelope keyed by media identifier,
    /// with a base64 `file` payload and a `type` extension field.
    pub async fn fetch_media(&self, media_id: &str) -> Result<MediaAsset, CatalogError> {
        let url = format!("{}{}?media_id=[{}]", self.base_url, MEDIA_PATH, media_id);

        let response = self
            .credentials
            .apply(self.http_client.get(&url))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::unavailable(status.as_u16(), body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| CatalogError::malformed(format!("invalid media JSON: {e}")))?;

        let entry = value
            .as_object()
            .and_then(|map| map.values().next())
            .ok_or_else(|| CatalogError::media(media_id, "no media entry in response"))?;

        let payload = entry
            .get("file")
            .and_then(Value::as_str)
            .ok_or_else(|| CatalogError::media(media_id, "missing file payload"))?;

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| CatalogError::media(media_id, format!("base64 decode failed: {e}")))?;

        let extension = entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("jpg")
            .to_lowercase();

        Ok(MediaAsset {
            bytes,
            content_type: mime_for_extension(&extension).to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        CatalogClient::fetch_snapshot(self).await
    }
}

/// Normalize a raw catalog response into a snapshot.
///
/// Accepts both shapes the source has returned over time: a map of records
/// keyed by identifier, and a single bare record. Entries that fit neither
/// shape are counted and logged, never silently dropped.
fn normalize_snapshot(value: Value) -> Result<CatalogSnapshot, CatalogError> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(CatalogError::malformed(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut snapshot = CatalogSnapshot::new();

    // A bare record carries its own scalar id at the top level.
    if map.get("id").is_some_and(is_scalar_id) {
        let id = scalar_to_string(&map["id"]);
        snapshot.push(SourceRecord::new(id, Value::Object(map)));
        return Ok(snapshot);
    }

    for (key, entry) in map {
        match entry {
            Value::Object(fields) => {
                // Prefer the record's own id; fall back to its map key.
                let id = fields
                    .get("id")
                    .filter(|v| is_scalar_id(v))
                    .map_or_else(|| key.clone(), scalar_to_string);
                snapshot.push(SourceRecord::new(id, Value::Object(fields)));
            }
            other => {
                warn!(
                    key = %key,
                    kind = json_type_name(&other),
                    "Catalog entry could not be normalized, flagging"
                );
                snapshot.malformed += 1;
            }
        }
    }

    Ok(snapshot)
}

fn is_scalar_id(value: &Value) -> bool {
    value.is_string() || value.is_number()
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
