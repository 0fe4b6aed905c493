//! Read-only catalog reports.
//!
//! Diagnostic helpers over a fetched snapshot: which records would make it
//! onto the public site and why the rest are excluded, plus a frequency
//! scan of feature labels. No destination calls are involved.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::types::CatalogSnapshot;

/// Listing types accepted onto the public site.
const LISTABLE_TYPES: [&str; 2] = ["Motorhome", "Caravan"];

/// Why a record is excluded from the public listing set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The record is not flagged visible.
    NotVisible,
    /// The record is not released to the market.
    NotOnMarket,
    /// The vehicle type is not listed publicly.
    UnsupportedType,
    /// No positive offer price.
    MissingPrice,
}

impl ExclusionReason {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::NotVisible => "not_visible",
            ExclusionReason::NotOnMarket => "not_on_market",
            ExclusionReason::UnsupportedType => "unsupported_type",
            ExclusionReason::MissingPrice => "missing_price",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Census of a catalog snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogCensus {
    /// Records in the snapshot.
    pub total: u32,
    /// Records that pass every listing filter.
    pub listable: u32,
    /// Listable motorhomes.
    pub motorhomes: u32,
    /// Listable caravans.
    pub caravans: u32,
    /// Records excluded by at least one filter.
    pub excluded: u32,
    /// Exclusion counts keyed by reason.
    pub excluded_reasons: HashMap<String, u32>,
    /// Entries in the response that could not be normalized.
    pub malformed: u32,
}

/// Count listable vs excluded records, with per-reason exclusion counts.
#[must_use]
pub fn census(snapshot: &CatalogSnapshot) -> CatalogCensus {
    let mut report = CatalogCensus {
        malformed: snapshot.malformed,
        ..Default::default()
    };

    for record in snapshot.records() {
        report.total += 1;

        match exclusion_reason(&record.attributes) {
            Some(reason) => {
                report.excluded += 1;
                *report
                    .excluded_reasons
                    .entry(reason.to_string())
                    .or_insert(0) += 1;
            }
            None => {
                report.listable += 1;
                match record.attributes.get("type").and_then(Value::as_str) {
                    Some("Motorhome") => report.motorhomes += 1,
                    Some("Caravan") => report.caravans += 1,
                    _ => {}
                }
            }
        }
    }

    report
}

/// First listing filter a record fails, if any.
fn exclusion_reason(attrs: &Value) -> Option<ExclusionReason> {
    let visible = attrs.pointer("/properties/visible").and_then(Value::as_bool) == Some(true);
    if !visible {
        return Some(ExclusionReason::NotVisible);
    }

    let market = attrs.pointer("/properties/market").and_then(Value::as_bool) == Some(true);
    if !market {
        return Some(ExclusionReason::NotOnMarket);
    }

    let listed_type = attrs
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| LISTABLE_TYPES.contains(&t));
    if !listed_type {
        return Some(ExclusionReason::UnsupportedType);
    }

    if !has_positive_price(attrs.pointer("/prices/offer")) {
        return Some(ExclusionReason::MissingPrice);
    }

    None
}

fn has_positive_price(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) > 0.0,
        Some(Value::String(s)) => s.parse::<f64>().map_or(false, |n| n > 0.0),
        _ => false,
    }
}

/// One entry of the feature frequency scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureCount {
    /// Raw feature label as it appears in the catalog.
    pub feature: String,
    /// How many records carry it.
    pub count: u32,
}

/// Feature label frequency across the snapshot, most common first.
#[must_use]
pub fn feature_frequency(snapshot: &CatalogSnapshot) -> Vec<FeatureCount> {
    let mut counter: HashMap<&str, u32> = HashMap::new();

    for record in snapshot.records() {
        if let Some(features) = record.attributes.get("features").and_then(Value::as_array) {
            for feature in features.iter().filter_map(Value::as_str) {
                *counter.entry(feature).or_insert(0) += 1;
            }
        }
    }

    let mut counts: Vec<FeatureCount> = counter
        .into_iter()
        .map(|(feature, count)| FeatureCount {
            feature: feature.to_string(),
            count,
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.feature.cmp(&b.feature)));
    counts
}
