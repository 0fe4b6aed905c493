//! Destination collection indexing.
//!
//! One pass builds a full in-memory index of the destination collection,
//! keyed by the mirrored external identifier. Any page-fetch failure is
//! fatal to the pass: an incomplete index would produce both false creates
//! and false deletes.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::CmsError;
use crate::traits::ContentStore;
use crate::types::CmsItem;

/// Page size used when listing the destination collection.
pub const PAGE_SIZE: u64 = 100;

/// Safety cap on indexed items, preventing unbounded memory growth against
/// a runaway collection.
const MAX_ITEMS: usize = 50_000;

/// In-memory index of the destination collection.
#[derive(Debug, Default)]
pub struct DestinationIndex {
    by_external_id: HashMap<String, CmsItem>,
}

impl DestinationIndex {
    /// Build the index by paginating the collection until a short page.
    pub async fn build(
        store: &dyn ContentStore,
        collection: &str,
    ) -> Result<Self, CmsError> {
        let mut by_external_id = HashMap::new();
        let mut offset = 0u64;

        loop {
            let page = store.list_items(collection, offset, PAGE_SIZE).await?;
            let fetched = page.items.len() as u64;

            for item in page.items {
                match item.external_id() {
                    Some(external_id) => {
                        by_external_id.insert(external_id.to_string(), item);
                    }
                    None => {
                        warn!(
                            item_id = %item.id,
                            "Destination item has no external identifier, skipping"
                        );
                    }
                }
            }

            if by_external_id.len() >= MAX_ITEMS {
                warn!(
                    indexed = by_external_id.len(),
                    "Reached destination index cap, stopping fetch"
                );
                break;
            }

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        debug!(count = by_external_id.len(), "Indexed destination collection");
        Ok(Self { by_external_id })
    }

    /// Look up an item by the external identifier it mirrors.
    #[must_use]
    pub fn get(&self, external_id: &str) -> Option<&CmsItem> {
        self.by_external_id.get(external_id)
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_external_id.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_external_id.is_empty()
    }

    /// All indexed items with their external identifiers.
    pub fn items(&self) -> impl Iterator<Item = (&String, &CmsItem)> {
        self.by_external_id.iter()
    }
}
