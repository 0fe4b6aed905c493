//! Collaborator seams of the sync engine.
//!
//! The reconciler talks to the outside world only through these traits.
//! HTTP clients implement [`CatalogSource`] and [`ContentStore`]; tests
//! inject in-memory doubles.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{CatalogError, CmsError, CursorError, MapError};
use crate::types::{CatalogSnapshot, CmsItem, ItemPage, SourceRecord, TransformedRecord};

/// Read access to the source catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the entire catalog as a keyed snapshot.
    ///
    /// Failures are fatal to the pass; no partial catalog is acceptable.
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, CatalogError>;
}

/// Access to a destination content collection.
///
/// Writes follow the destination's two-phase model: created and patched
/// items stay invisible to consumers until published.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List one page of items from a collection.
    async fn list_items(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ItemPage, CmsError>;

    /// Create a new item with the given field data. The item is written
    /// with `draft = false` but does not go live until published.
    async fn create_item(
        &self,
        collection: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError>;

    /// Patch the field data of an existing item.
    async fn update_item(
        &self,
        collection: &str,
        item_id: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError>;

    /// Make drafted writes externally visible.
    async fn publish_items(&self, collection: &str, item_ids: &[String]) -> Result<(), CmsError>;

    /// Remove an item from the live site without deleting it.
    async fn unpublish_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError>;

    /// Delete an item from the collection.
    async fn delete_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError>;
}

/// Durable storage for the cold-lane cursor.
///
/// Values survive process restarts. Absence of a value is reported as
/// `None` and treated as cursor `0` by the scheduler.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Read the cursor stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<u64>, CursorError>;

    /// Persist the cursor under `key`.
    async fn set(&self, key: &str, value: u64) -> Result<(), CursorError>;
}

/// Pure mapping collaborator: one raw source record into one transformed
/// record in the destination field vocabulary.
///
/// A mapping failure is a per-record skip, never fatal to a pass.
pub trait RecordMapper: Send + Sync {
    /// Map a source record.
    fn map(&self, record: &SourceRecord) -> Result<TransformedRecord, MapError>;
}

/// Resolves internal media identifiers into fetchable URLs.
pub trait MediaResolver: Send + Sync {
    /// The fetchable URL for a media identifier.
    fn url_for(&self, media_id: &str) -> String;
}
