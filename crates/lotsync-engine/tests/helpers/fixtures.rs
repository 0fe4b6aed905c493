//! Catalog and destination fixtures.

#![allow(dead_code)]

use serde_json::json;
use std::collections::BTreeMap;

use lotsync_engine::types::SLUG_FIELD;
use lotsync_engine::{CatalogSnapshot, CmsItem, SourceRecord};

/// Collection identifier used for listings in tests.
pub const LISTINGS: &str = "listings";

/// Collection identifier used for feature references in tests.
pub const FEATURES: &str = "features";

/// A realistic vehicle record.
pub fn vehicle(id: &str, price: u64) -> SourceRecord {
    SourceRecord::new(
        id,
        json!({
            "id": id,
            "type": "Motorhome",
            "typeof": "Semi-integrated",
            "condition": "NEW",
            "mileage": 15,
            "model": {
                "producer": "Sunlight",
                "series": "A",
                "model": format!("A{id}"),
                "modelyear": 2024
            },
            "engine": { "ps": 140, "kw": 103, "fuel": "Diesel", "gear": "Manual" },
            "dimensions": { "width": 232, "height": 295, "length": 744 },
            "prices": { "offer": price },
            "texts": {
                "description": "<p>Family motorhome</p>",
                "description_plain": "Family motorhome"
            },
            "properties": { "visible": true, "market": true },
            "media": [
                { "id": format!("{id}-img-1"), "group": "image", "type": "upload" },
                { "id": format!("{id}-img-2"), "group": "image", "type": "upload" }
            ],
            "features": ["Air Conditioning", "Solar Panel"]
        }),
    )
}

/// A record whose attributes cannot be mapped.
pub fn broken_record(id: &str) -> SourceRecord {
    SourceRecord::new(id, json!("definitely not an object"))
}

/// Snapshot of sequentially numbered vehicles, ids starting at 1.
pub fn snapshot_of(count: usize) -> CatalogSnapshot {
    (1..=count)
        .map(|i| vehicle(&i.to_string(), 40_000 + i as u64))
        .collect()
}

/// A reference-collection item with the given slug.
pub fn reference_item(id: &str, slug: &str) -> CmsItem {
    let mut field_data = BTreeMap::new();
    field_data.insert(SLUG_FIELD.to_string(), json!(slug));
    field_data.insert("name".to_string(), json!(slug.replace('-', " ")));
    CmsItem {
        id: id.to_string(),
        is_draft: false,
        is_archived: false,
        field_data,
    }
}

/// The standard pair of feature references matching [`vehicle`] fixtures.
pub fn standard_references() -> Vec<CmsItem> {
    vec![
        reference_item("ref-air", "air-conditioning"),
        reference_item("ref-solar", "solar-panel"),
    ]
}

/// A destination item that mirrors no current source record.
pub fn stale_item(item_id: &str, external_id: &str) -> CmsItem {
    let mut field_data = BTreeMap::new();
    field_data.insert(
        lotsync_engine::types::EXTERNAL_ID_FIELD.to_string(),
        json!(external_id),
    );
    field_data.insert(
        lotsync_engine::types::FINGERPRINT_FIELD.to_string(),
        json!("stale-fingerprint"),
    );
    CmsItem {
        id: item_id.to_string(),
        is_draft: false,
        is_archived: false,
        field_data,
    }
}
