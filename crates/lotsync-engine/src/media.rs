//! Media identifier resolution.
//!
//! The destination stores image URLs, not source media identifiers. The
//! [`MediaResolver`] seam turns identifiers into fetchable URLs; the
//! production resolver points at the public media proxy so the destination
//! never needs source credentials.

use serde_json::{json, Value};

use crate::traits::MediaResolver;
use crate::types::{TransformedRecord, FLOOR_PLAN_FIELD, GALLERY_FIELD, MAIN_IMAGE_FIELD};

/// Builds proxy URLs for media identifiers under a public origin.
#[derive(Debug, Clone)]
pub struct ProxyMediaResolver {
    origin: String,
}

impl ProxyMediaResolver {
    /// Create a resolver for the given public origin,
    /// e.g. `https://www.example.com`.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

impl MediaResolver for ProxyMediaResolver {
    fn url_for(&self, media_id: &str) -> String {
        format!("{}/api/media?id={}", self.origin, media_id)
    }
}

/// Resolve a record's media cache into destination URL fields.
///
/// Applied before fingerprinting so URL changes register as content
/// changes.
pub fn resolve_media(record: &mut TransformedRecord, resolver: &dyn MediaResolver) {
    if let Some(primary) = &record.media.primary {
        record.fields.insert(
            MAIN_IMAGE_FIELD.to_string(),
            json!(resolver.url_for(primary)),
        );
    }

    if !record.media.gallery.is_empty() {
        let urls: Vec<Value> = record
            .media
            .gallery
            .iter()
            .map(|id| json!(resolver.url_for(id)))
            .collect();
        record.fields.insert(GALLERY_FIELD.to_string(), Value::Array(urls));
    }

    if let Some(floor_plan) = &record.media.floor_plan {
        record.fields.insert(
            FLOOR_PLAN_FIELD.to_string(),
            json!(resolver.url_for(floor_plan)),
        );
    }
}
