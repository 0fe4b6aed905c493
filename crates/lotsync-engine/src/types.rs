//! Core data types shared across the sync engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Destination field that stores the mirrored external identifier.
pub const EXTERNAL_ID_FIELD: &str = "listing-id";

/// Destination field that stores the content fingerprint of the last write.
pub const FINGERPRINT_FIELD: &str = "sync-fingerprint";

/// Destination field for the primary image URL.
pub const MAIN_IMAGE_FIELD: &str = "main-image";

/// Destination field for the gallery URL array.
pub const GALLERY_FIELD: &str = "gallery";

/// Destination field for the floor plan URL.
pub const FLOOR_PLAN_FIELD: &str = "floor-plan";

/// Destination field for the resolved feature reference identifiers.
pub const FEATURES_FIELD: &str = "features";

/// Reference-collection field holding the slug used for resolution.
pub const SLUG_FIELD: &str = "slug";

/// One raw record from the source catalog.
///
/// The attribute bag is opaque to the engine; only the external identifier
/// is ever interpreted here.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// Stable identifier assigned by the source system.
    pub external_id: String,
    /// Raw attributes as returned by the catalog endpoint.
    pub attributes: Value,
}

impl SourceRecord {
    /// Create a record from an identifier and raw attributes.
    pub fn new(external_id: impl Into<String>, attributes: Value) -> Self {
        Self {
            external_id: external_id.into(),
            attributes,
        }
    }
}

/// The full source catalog for one pass, keyed by external identifier.
///
/// Iteration order matches the order records appeared in the response, so
/// the head of the catalog is also the head of the hot lane.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    records: Vec<SourceRecord>,
    by_id: HashMap<String, usize>,
    /// Entries in the response that could not be normalized into a record.
    pub malformed: u32,
}

impl CatalogSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. A record with a duplicate identifier replaces the
    /// earlier one in place.
    pub fn push(&mut self, record: SourceRecord) {
        match self.by_id.get(&record.external_id) {
            Some(&idx) => self.records[idx] = record,
            None => {
                self.by_id
                    .insert(record.external_id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Number of records in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in response order.
    #[must_use]
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    /// Look up a record by external identifier.
    #[must_use]
    pub fn get(&self, external_id: &str) -> Option<&SourceRecord> {
        self.by_id.get(external_id).map(|&idx| &self.records[idx])
    }

    /// Whether the snapshot contains the given external identifier.
    #[must_use]
    pub fn contains(&self, external_id: &str) -> bool {
        self.by_id.contains_key(external_id)
    }
}

impl FromIterator<SourceRecord> for CatalogSnapshot {
    fn from_iter<T: IntoIterator<Item = SourceRecord>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.push(record);
        }
        snapshot
    }
}

/// Media identifiers carried by a transformed record, not yet resolved to
/// fetchable URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCache {
    /// Designated primary image.
    pub primary: Option<String>,
    /// Gallery identifiers, in display order.
    #[serde(default)]
    pub gallery: Vec<String>,
    /// Optional floor plan.
    pub floor_plan: Option<String>,
}

impl MediaCache {
    /// Whether the cache carries no media at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.gallery.is_empty() && self.floor_plan.is_none()
    }
}

/// A source record mapped into the destination field vocabulary.
///
/// Reference slugs and media identifiers are still unresolved; the
/// reconciler resolves both before fingerprinting.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    /// External identifier of the originating source record.
    pub external_id: String,
    /// Flat destination field map. `BTreeMap` keeps key order stable for
    /// canonical serialization.
    pub fields: BTreeMap<String, Value>,
    /// Slugs to resolve against the reference collection.
    pub reference_slugs: Vec<String>,
    /// Media identifiers awaiting URL resolution.
    pub media: MediaCache,
}

/// An item in the destination content collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsItem {
    /// Identifier in the destination store.
    pub id: String,
    /// Whether the item is still a draft.
    #[serde(default, rename = "isDraft")]
    pub is_draft: bool,
    /// Whether the item is archived.
    #[serde(default, rename = "isArchived")]
    pub is_archived: bool,
    /// Current field data, including the mirrored external identifier and
    /// the fingerprint of the last write.
    #[serde(default, rename = "fieldData")]
    pub field_data: BTreeMap<String, Value>,
}

impl CmsItem {
    /// The external identifier this item mirrors, if stored.
    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.field_data.get(EXTERNAL_ID_FIELD).and_then(Value::as_str)
    }

    /// The content fingerprint of the last write, if stored.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.field_data.get(FINGERPRINT_FIELD).and_then(Value::as_str)
    }
}

/// One page of a paginated destination listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPage {
    /// The items on this page.
    #[serde(default)]
    pub items: Vec<CmsItem>,
    /// Pagination metadata reported by the destination.
    #[serde(default)]
    pub pagination: PageInfo,
}

/// Pagination metadata on a destination listing response.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageInfo {
    /// Requested page size.
    #[serde(default)]
    pub limit: u64,
    /// Offset of this page.
    #[serde(default)]
    pub offset: u64,
    /// Total items in the collection.
    #[serde(default)]
    pub total: u64,
}
