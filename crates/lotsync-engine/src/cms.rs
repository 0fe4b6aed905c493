//! Destination content service client.
//!
//! Wraps `reqwest::Client` with the destination's item operations:
//! paginated listing, create, patch, batch publish, live-unpublish and
//! delete. Writes follow the destination's two-phase model: a created or
//! patched item is not externally visible until published.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::CmsError;
use crate::traits::ContentStore;
use crate::types::{CmsItem, ItemPage};

/// HTTP client for the destination content service.
#[derive(Debug, Clone)]
pub struct CmsClient {
    base_url: String,
    credentials: Credentials,
    http_client: Client,
}

impl CmsClient {
    /// Create a new client against the given API base URL.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CmsError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("lotsync/0.3")
            .build()
            .map_err(|e| CmsError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(
            base_url,
            Credentials::bearer(token),
            http_client,
        ))
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

    // ── Item Operations ───────────────────────────────────────────────

    /// List one page of a collection (GET /collections/:id/items).
    pub async fn list_items(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ItemPage, CmsError> {
        let url = format!("{}/collections/{}/items", self.base_url, collection);
        debug!(collection = %collection, offset, limit, "CMS LIST");

        let builder = self
            .http_client
            .get(&url)
            .query(&[("offset", offset), ("limit", limit)]);
        let response = self.credentials.apply(builder).send().await?;
        self.handle_response(response).await
    }

    /// Create an item (POST /collections/:id/items).
    ///
    /// The item is written with `isDraft = false` but stays invisible to
    /// consumers until published.
    pub async fn create_item(
        &self,
        collection: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError> {
        let url = format!("{}/collections/{}/items", self.base_url, collection);
        debug!(collection = %collection, "CMS CREATE");
        self.post(&url, &item_body(fields)).await
    }

    /// Patch an item's field data (PATCH /collections/:id/items/:item).
    pub async fn update_item(
        &self,
        collection: &str,
        item_id: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError> {
        let url = format!(
            "{}/collections/{}/items/{}",
            self.base_url, collection, item_id
        );
        debug!(collection = %collection, item_id = %item_id, "CMS PATCH");
        self.patch(&url, &item_body(fields)).await
    }

    /// Publish drafted writes (POST /collections/:id/items/publish).
    pub async fn publish_items(
        &self,
        collection: &str,
        item_ids: &[String],
    ) -> Result<(), CmsError> {
        if item_ids.is_empty() {
            return Ok(());
        }

        let url = format!("{}/collections/{}/items/publish", self.base_url, collection);
        debug!(collection = %collection, count = item_ids.len(), "CMS PUBLISH");

        let builder = self
            .http_client
            .post(&url)
            .json(&json!({ "itemIds": item_ids }));
        let response = self.credentials.apply(builder).send().await?;
        self.handle_empty_response(response).await
    }

    /// Remove an item from the live site (DELETE /collections/:id/items/:item/live).
    pub async fn unpublish_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError> {
        let url = format!(
            "{}/collections/{}/items/{}/live",
            self.base_url, collection, item_id
        );
        debug!(collection = %collection, item_id = %item_id, "CMS UNPUBLISH");

        let response = self
            .credentials
            .apply(self.http_client.delete(&url))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Delete an item (DELETE /collections/:id/items/:item).
    pub async fn delete_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError> {
        let url = format!(
            "{}/collections/{}/items/{}",
            self.base_url, collection, item_id
        );
        debug!(collection = %collection, item_id = %item_id, "CMS DELETE");

        let response = self
            .credentials
            .apply(self.http_client.delete(&url))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, CmsError> {
        let builder = self.http_client.post(url).json(body);
        let response = self.credentials.apply(builder).send().await?;
        self.handle_response(response).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, CmsError> {
        let builder = self.http_client.patch(url).json(body);
        let response = self.credentials.apply(builder).send().await?;
        self.handle_response(response).await
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CmsError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| CmsError::Parse(format!("failed to parse response: {e}")))
        } else {
            Self::handle_error_response(response).await
        }
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), CmsError> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            Ok(())
        } else {
            Self::handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(response: reqwest::Response) -> Result<T, CmsError> {
        let status = response.status();

        // Retry-After accompanies rate-limit responses.
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => Err(CmsError::NotFound(body)),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Destination rate limited, retry after {:?}s", retry_after);
                Err(CmsError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
            _ => {
                let detail = if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                };
                Err(CmsError::Api {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }
}

/// Request body for item create/patch calls.
fn item_body(fields: &BTreeMap<String, Value>) -> Value {
    json!({
        "isArchived": false,
        "isDraft": false,
        "fieldData": fields,
    })
}

#[async_trait]
impl ContentStore for CmsClient {
    async fn list_items(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ItemPage, CmsError> {
        CmsClient::list_items(self, collection, offset, limit).await
    }

    async fn create_item(
        &self,
        collection: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError> {
        CmsClient::create_item(self, collection, fields).await
    }

    async fn update_item(
        &self,
        collection: &str,
        item_id: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError> {
        CmsClient::update_item(self, collection, item_id, fields).await
    }

    async fn publish_items(&self, collection: &str, item_ids: &[String]) -> Result<(), CmsError> {
        CmsClient::publish_items(self, collection, item_ids).await
    }

    async fn unpublish_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError> {
        CmsClient::unpublish_item(self, collection, item_id).await
    }

    async fn delete_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError> {
        CmsClient::delete_item(self, collection, item_id).await
    }
}
