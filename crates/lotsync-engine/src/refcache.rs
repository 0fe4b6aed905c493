//! Process-wide slug → identifier cache for the reference collection.
//!
//! Reference items (feature tags) change far less often than the main
//! catalog, so the map is resolved once per process lifetime and reused by
//! every subsequent pass. The staleness risk is accepted in exchange for
//! skipping a full refetch on every invocation; a process restart rebuilds
//! the cache.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::CmsError;
use crate::indexer::PAGE_SIZE;
use crate::traits::ContentStore;
use crate::types::SLUG_FIELD;

/// Lazily resolved slug → reference-identifier map.
///
/// The first successful resolution wins for the process lifetime; a failed
/// resolution leaves the cache empty so the next pass retries. Tests inject
/// a fresh instance per scenario to avoid cross-test leakage.
#[derive(Debug)]
pub struct ReferenceCache {
    collection: String,
    map: OnceCell<HashMap<String, String>>,
}

impl ReferenceCache {
    /// Create a cache for the given reference collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            map: OnceCell::new(),
        }
    }

    /// The reference collection this cache resolves against.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Return the cached map, resolving it on first call.
    pub async fn get_or_resolve(
        &self,
        store: &dyn ContentStore,
    ) -> Result<&HashMap<String, String>, CmsError> {
        self.map
            .get_or_try_init(|| self.resolve(store))
            .await
    }

    async fn resolve(&self, store: &dyn ContentStore) -> Result<HashMap<String, String>, CmsError> {
        let mut map = HashMap::new();
        let mut offset = 0u64;

        loop {
            let page = store.list_items(&self.collection, offset, PAGE_SIZE).await?;
            let fetched = page.items.len() as u64;

            for item in page.items {
                match item.field_data.get(SLUG_FIELD).and_then(Value::as_str) {
                    Some(slug) => {
                        map.insert(slug.to_string(), item.id);
                    }
                    None => {
                        warn!(item_id = %item.id, "Reference item has no slug, skipping");
                    }
                }
            }

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        debug!(count = map.len(), collection = %self.collection, "Resolved reference collection");
        Ok(map)
    }
}
