//! Production record mapper for vehicle listings.
//!
//! Converts one raw dealer-system record into the destination field
//! vocabulary. Mapping is pure: no I/O, no lookups. Reference slugs and
//! media identifiers are left unresolved for the reconciler.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::MapError;
use crate::traits::RecordMapper;
use crate::types::{MediaCache, SourceRecord, TransformedRecord, EXTERNAL_ID_FIELD};

/// Maximum number of gallery images carried to the destination.
pub const GALLERY_LIMIT: usize = 25;

/// Maps raw vehicle listings into destination field data.
///
/// The first catalog image is designated the primary image; the gallery is
/// capped at [`GALLERY_LIMIT`] entries. Both are business rules of this
/// mapper, not of the engine.
#[derive(Debug, Clone, Default)]
pub struct VehicleMapper;

impl VehicleMapper {
    /// Create a mapper.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RecordMapper for VehicleMapper {
    fn map(&self, record: &SourceRecord) -> Result<TransformedRecord, MapError> {
        if !record.attributes.is_object() {
            return Err(MapError::new("attributes are not a JSON object"));
        }
        let attrs = &record.attributes;

        let producer = text(attrs.pointer("/model/producer"));
        let series = text(attrs.pointer("/model/series"));
        let model = text(attrs.pointer("/model/model"));

        let name = [&producer, &series, &model]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let slug_base = if producer.is_empty() {
            "vehicle"
        } else {
            producer.as_str()
        };
        let slug = slugify(&format!("{slug_base} {model} {}", record.external_id));

        let condition = match text(attrs.pointer("/condition")).as_str() {
            "NEW" => "New".to_string(),
            "USED" | "BE" => "Used".to_string(),
            other => other.to_string(),
        };

        let mut fields = BTreeMap::new();
        fields.insert(EXTERNAL_ID_FIELD.to_string(), json!(record.external_id));
        fields.insert("name".to_string(), json!(name));
        fields.insert("slug".to_string(), json!(slug));
        fields.insert("manufacturer".to_string(), json!(producer));
        fields.insert("series".to_string(), json!(series));
        fields.insert("model".to_string(), json!(model));
        fields.insert(
            "model-suffix".to_string(),
            value_or_empty(attrs.pointer("/model/model_add")),
        );
        fields.insert("condition".to_string(), json!(condition));
        fields.insert(
            "vehicle-class".to_string(),
            value_or_empty(attrs.pointer("/type")),
        );
        fields.insert(
            "vehicle-type".to_string(),
            value_or_empty(attrs.pointer("/typeof")),
        );
        fields.insert(
            "power-hp".to_string(),
            value_or_empty(attrs.pointer("/engine/ps")),
        );
        fields.insert(
            "power-kw".to_string(),
            value_or_empty(attrs.pointer("/engine/kw")),
        );
        fields.insert(
            "fuel".to_string(),
            value_or_empty(attrs.pointer("/engine/fuel")),
        );
        fields.insert(
            "transmission".to_string(),
            value_or_empty(attrs.pointer("/engine/gear")),
        );
        fields.insert(
            "description".to_string(),
            value_or_empty(attrs.pointer("/texts/description")),
        );
        fields.insert(
            "description-short".to_string(),
            value_or_empty(attrs.pointer("/texts/description_plain")),
        );
        fields.insert(
            "mileage".to_string(),
            value_or_empty(attrs.pointer("/mileage")),
        );
        fields.insert(
            "model-year".to_string(),
            value_or_empty(attrs.pointer("/model/modelyear")),
        );
        fields.insert("price".to_string(), price_of(attrs));
        fields.insert(
            "width".to_string(),
            value_or_empty(attrs.pointer("/dimensions/width")),
        );
        fields.insert(
            "height".to_string(),
            value_or_empty(attrs.pointer("/dimensions/height")),
        );
        fields.insert(
            "length".to_string(),
            value_or_empty(attrs.pointer("/dimensions/length")),
        );

        let media = media_cache(attrs);

        let reference_slugs = attrs
            .pointer("/features")
            .and_then(Value::as_array)
            .map(|features| {
                features
                    .iter()
                    .filter_map(Value::as_str)
                    .map(slugify)
                    .filter(|slug| !slug.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(TransformedRecord {
            external_id: record.external_id.clone(),
            fields,
            reference_slugs,
            media,
        })
    }
}

/// Collect image identifiers from the raw media list.
///
/// Uploaded `image` entries feed the gallery, first image wins as primary;
/// an uploaded `layout` entry becomes the floor plan.
fn media_cache(attrs: &Value) -> MediaCache {
    let entries = match attrs.pointer("/media").and_then(Value::as_array) {
        Some(entries) => entries,
        None => return MediaCache::default(),
    };

    let uploaded_ids = |group: &str| -> Vec<String> {
        entries
            .iter()
            .filter(|m| {
                m.get("group").and_then(Value::as_str) == Some(group)
                    && m.get("type").and_then(Value::as_str) == Some("upload")
            })
            .filter_map(|m| m.get("id"))
            .filter(|id| id.is_string() || id.is_number())
            .map(scalar_to_string)
            .collect()
    };

    let images = uploaded_ids("image");
    let layouts = uploaded_ids("layout");

    MediaCache {
        primary: images.first().cloned(),
        gallery: images.into_iter().take(GALLERY_LIMIT).collect(),
        floor_plan: layouts.into_iter().next(),
    }
}

/// Offer price, falling back to the base price. Zero and empty values
/// count as missing, matching the source's conventions.
fn price_of(attrs: &Value) -> Value {
    for pointer in ["/prices/offer", "/prices/basic"] {
        if let Some(price) = attrs.pointer(pointer) {
            if is_present_price(price) {
                return price.clone();
            }
        }
    }
    json!("")
}

fn is_present_price(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0) > 0.0,
        Value::String(s) => !s.is_empty() && s.parse::<f64>().map_or(true, |n| n > 0.0),
        _ => false,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn value_or_empty(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Null) | None => json!(""),
        Some(v) => v.clone(),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lowercase a label into a URL-safe slug.
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut previous_dash = true;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            previous_dash = false;
        } else if !previous_dash {
            slug.push('-');
            previous_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> SourceRecord {
        SourceRecord::new(
            "135965",
            json!({
                "id": 135965,
                "type": "Motorhome",
                "typeof": "Semi-integrated",
                "condition": "NEW",
                "mileage": 20,
                "model": {
                    "producer": "Sunlight",
                    "series": "A",
                    "model": "A70",
                    "model_add": "Adventure Edition",
                    "modelyear": 2024
                },
                "engine": { "ps": 140, "kw": 103, "fuel": "Diesel", "gear": "Manual" },
                "dimensions": { "width": 232, "height": 295, "length": 744 },
                "prices": { "offer": 54900, "basic": 59900 },
                "texts": {
                    "description": "<p>Family motorhome</p>",
                    "description_plain": "Family motorhome"
                },
                "media": [
                    { "id": 900, "group": "image", "type": "upload" },
                    { "id": 901, "group": "image", "type": "upload" },
                    { "id": 950, "group": "layout", "type": "upload" },
                    { "id": 999, "group": "image", "type": "external" }
                ],
                "features": ["Air Conditioning", "Solar Panel"]
            }),
        )
    }

    #[test]
    fn test_maps_core_fields() {
        let mapped = VehicleMapper::new().map(&sample_record()).expect("maps");

        assert_eq!(mapped.external_id, "135965");
        assert_eq!(mapped.fields["name"], json!("Sunlight A A70"));
        assert_eq!(mapped.fields["slug"], json!("sunlight-a70-135965"));
        assert_eq!(mapped.fields["manufacturer"], json!("Sunlight"));
        assert_eq!(mapped.fields["condition"], json!("New"));
        assert_eq!(mapped.fields["vehicle-class"], json!("Motorhome"));
        assert_eq!(mapped.fields["price"], json!(54900));
        assert_eq!(mapped.fields["power-hp"], json!(140));
        assert_eq!(mapped.fields[EXTERNAL_ID_FIELD], json!("135965"));
    }

    #[test]
    fn test_condition_code_mapping() {
        for (code, expected) in [("NEW", "New"), ("USED", "Used"), ("BE", "Used")] {
            let record = SourceRecord::new("1", json!({ "condition": code }));
            let mapped = VehicleMapper::new().map(&record).expect("maps");
            assert_eq!(mapped.fields["condition"], json!(expected));
        }

        // Unknown codes pass through untouched.
        let record = SourceRecord::new("1", json!({ "condition": "DEMO" }));
        let mapped = VehicleMapper::new().map(&record).expect("maps");
        assert_eq!(mapped.fields["condition"], json!("DEMO"));
    }

    #[test]
    fn test_price_falls_back_to_basic() {
        let record = SourceRecord::new("1", json!({ "prices": { "offer": 0, "basic": 49900 } }));
        let mapped = VehicleMapper::new().map(&record).expect("maps");
        assert_eq!(mapped.fields["price"], json!(49900));

        let record = SourceRecord::new("1", json!({ "prices": {} }));
        let mapped = VehicleMapper::new().map(&record).expect("maps");
        assert_eq!(mapped.fields["price"], json!(""));
    }

    #[test]
    fn test_first_image_wins_as_primary() {
        let mapped = VehicleMapper::new().map(&sample_record()).expect("maps");

        assert_eq!(mapped.media.primary.as_deref(), Some("900"));
        assert_eq!(mapped.media.gallery, vec!["900", "901"]);
        assert_eq!(mapped.media.floor_plan.as_deref(), Some("950"));
    }

    #[test]
    fn test_gallery_capped() {
        let media: Vec<Value> = (0..40)
            .map(|i| json!({ "id": i, "group": "image", "type": "upload" }))
            .collect();
        let record = SourceRecord::new("1", json!({ "media": media }));

        let mapped = VehicleMapper::new().map(&record).expect("maps");
        assert_eq!(mapped.media.gallery.len(), GALLERY_LIMIT);
        assert_eq!(mapped.media.primary.as_deref(), Some("0"));
    }

    #[test]
    fn test_features_become_reference_slugs() {
        let mapped = VehicleMapper::new().map(&sample_record()).expect("maps");
        assert_eq!(
            mapped.reference_slugs,
            vec!["air-conditioning", "solar-panel"]
        );
    }

    #[test]
    fn test_non_object_attributes_fail_mapping() {
        let record = SourceRecord::new("1", json!("not an object"));
        let err = VehicleMapper::new().map(&record).expect_err("must fail");
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sunlight A70"), "sunlight-a70");
        assert_eq!(slugify("  Über -- Van!  "), "ber-van");
        assert_eq!(slugify("Air Conditioning"), "air-conditioning");
        assert_eq!(slugify("---"), "");
    }
}
