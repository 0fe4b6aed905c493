//! In-memory doubles for the catalog and the destination store.
//!
//! The destination double records every call in order, so tests can assert
//! the two-phase create-then-publish discipline and dry-run purity.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lotsync_engine::types::{PageInfo, EXTERNAL_ID_FIELD};
use lotsync_engine::{
    CatalogError, CatalogSnapshot, CatalogSource, CmsError, CmsItem, ContentStore, ItemPage,
};

/// One recorded destination call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    List {
        collection: String,
        offset: u64,
    },
    Create {
        collection: String,
        external_id: String,
        item_id: String,
    },
    Update {
        collection: String,
        item_id: String,
    },
    Publish {
        collection: String,
        item_ids: Vec<String>,
    },
    Unpublish {
        collection: String,
        item_id: String,
    },
    Delete {
        collection: String,
        item_id: String,
    },
}

impl Op {
    /// Whether this call mutated the destination.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Op::List { .. })
    }
}

/// In-memory destination content store.
#[derive(Debug, Default)]
pub struct FakeContentStore {
    collections: Mutex<HashMap<String, Vec<CmsItem>>>,
    published: Mutex<HashSet<String>>,
    ops: Mutex<Vec<Op>>,
    next_id: AtomicU64,
    fail_create_for: Mutex<HashSet<String>>,
}

impl FakeContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item into a collection without recording an operation.
    pub fn insert_item(&self, collection: &str, item: CmsItem) {
        self.collections
            .lock()
            .expect("lock")
            .entry(collection.to_string())
            .or_default()
            .push(item);
    }

    /// Mark an item as live without recording an operation.
    pub fn mark_published(&self, item_id: &str) {
        self.published.lock().expect("lock").insert(item_id.to_string());
    }

    /// Make item creation fail for the given external identifier.
    pub fn fail_create_for(&self, external_id: &str) {
        self.fail_create_for
            .lock()
            .expect("lock")
            .insert(external_id.to_string());
    }

    /// Current items of a collection.
    pub fn items_in(&self, collection: &str) -> Vec<CmsItem> {
        self.collections
            .lock()
            .expect("lock")
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether an item is currently live.
    pub fn is_published(&self, item_id: &str) -> bool {
        self.published.lock().expect("lock").contains(item_id)
    }

    /// Every recorded call, in order.
    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().expect("lock").clone()
    }

    /// Every recorded mutation, in order.
    pub fn mutation_ops(&self) -> Vec<Op> {
        self.ops().into_iter().filter(Op::is_mutation).collect()
    }

    /// Forget all recorded calls (keeps the stored items).
    pub fn clear_ops(&self) {
        self.ops.lock().expect("lock").clear();
    }

    fn record(&self, op: Op) {
        self.ops.lock().expect("lock").push(op);
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn list_items(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ItemPage, CmsError> {
        self.record(Op::List {
            collection: collection.to_string(),
            offset,
        });

        let collections = self.collections.lock().expect("lock");
        let items = collections.get(collection).cloned().unwrap_or_default();
        let total = items.len() as u64;

        let start = (offset as usize).min(items.len());
        let end = ((offset + limit) as usize).min(items.len());

        Ok(ItemPage {
            items: items[start..end].to_vec(),
            pagination: PageInfo {
                limit,
                offset,
                total,
            },
        })
    }

    async fn create_item(
        &self,
        collection: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError> {
        let external_id = fields
            .get(EXTERNAL_ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if self
            .fail_create_for
            .lock()
            .expect("lock")
            .contains(&external_id)
        {
            return Err(CmsError::Api {
                status: 500,
                detail: format!("simulated create failure for {external_id}"),
            });
        }

        let item_id = format!("item-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let item = CmsItem {
            id: item_id.clone(),
            is_draft: false,
            is_archived: false,
            field_data: fields.clone(),
        };

        self.collections
            .lock()
            .expect("lock")
            .entry(collection.to_string())
            .or_default()
            .push(item.clone());

        self.record(Op::Create {
            collection: collection.to_string(),
            external_id,
            item_id,
        });

        Ok(item)
    }

    async fn update_item(
        &self,
        collection: &str,
        item_id: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<CmsItem, CmsError> {
        let mut collections = self.collections.lock().expect("lock");
        let items = collections
            .get_mut(collection)
            .ok_or_else(|| CmsError::NotFound(format!("collection {collection}")))?;

        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CmsError::NotFound(format!("item {item_id}")))?;

        item.field_data.extend(fields.clone());
        let updated = item.clone();
        drop(collections);

        self.record(Op::Update {
            collection: collection.to_string(),
            item_id: item_id.to_string(),
        });

        Ok(updated)
    }

    async fn publish_items(&self, collection: &str, item_ids: &[String]) -> Result<(), CmsError> {
        {
            let mut published = self.published.lock().expect("lock");
            for id in item_ids {
                published.insert(id.clone());
            }
        }

        self.record(Op::Publish {
            collection: collection.to_string(),
            item_ids: item_ids.to_vec(),
        });
        Ok(())
    }

    async fn unpublish_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError> {
        self.record(Op::Unpublish {
            collection: collection.to_string(),
            item_id: item_id.to_string(),
        });

        let was_live = self.published.lock().expect("lock").remove(item_id);
        if was_live {
            Ok(())
        } else {
            Err(CmsError::NotFound(format!("item {item_id} is not live")))
        }
    }

    async fn delete_item(&self, collection: &str, item_id: &str) -> Result<(), CmsError> {
        let mut collections = self.collections.lock().expect("lock");
        let items = collections
            .get_mut(collection)
            .ok_or_else(|| CmsError::NotFound(format!("collection {collection}")))?;

        let before = items.len();
        items.retain(|i| i.id != item_id);
        if items.len() == before {
            return Err(CmsError::NotFound(format!("item {item_id}")));
        }
        drop(collections);

        self.record(Op::Delete {
            collection: collection.to_string(),
            item_id: item_id.to_string(),
        });
        Ok(())
    }
}

/// Catalog double serving a swappable snapshot.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    snapshot: Mutex<CatalogSnapshot>,
}

impl FakeCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Replace the snapshot served to the next pass.
    pub fn set_snapshot(&self, snapshot: CatalogSnapshot) {
        *self.snapshot.lock().expect("lock") = snapshot;
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        Ok(self.snapshot.lock().expect("lock").clone())
    }
}
