//! Content fingerprinting for change detection.
//!
//! The fingerprint is a hex SHA-256 over the canonical serialization of a
//! fully resolved field map. `BTreeMap` gives a stable key order and JSON
//! arrays keep their element order, so equal field maps always hash to the
//! same value and any single attribute difference changes the hash.
//!
//! The fingerprint is embedded in the written item's own field data so the
//! next pass can compare with a local index lookup only. It is never
//! persisted as business data.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Compute the content fingerprint of a resolved field map.
#[must_use]
pub fn fingerprint(fields: &BTreeMap<String, Value>) -> String {
    let canonical = serde_json::to_vec(fields).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}
