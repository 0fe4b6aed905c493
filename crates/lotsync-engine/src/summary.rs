//! Pass summaries and per-record failure reporting.
//!
//! A completed pass always returns a summary, even when some records
//! failed; callers inspect the errors list to detect partial failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure recorded for a single record during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// External identifier of the offending record (or the item it maps to).
    pub external_id: String,
    /// Error detail.
    pub detail: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Records in the source snapshot.
    pub source_total: u64,
    /// Items in the destination index at pass start.
    pub destination_total: u64,
    /// Items created (and published) this pass.
    pub created: u64,
    /// Items patched (and republished) this pass.
    pub updated: u64,
    /// Records whose fingerprint matched; no write issued.
    pub skipped: u64,
    /// Stale items unpublished and deleted this pass.
    pub deleted: u64,
    /// Records that failed mapping or writing.
    pub failed: u64,
    /// Detail for every failed record.
    #[serde(default)]
    pub errors: Vec<RecordFailure>,
    /// Whether mutations were suppressed.
    pub dry_run: bool,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the pass.
    pub duration_seconds: u64,
}

impl SyncSummary {
    /// Create an empty summary for a pass starting now.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            source_total: 0,
            destination_total: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            deleted: 0,
            failed: 0,
            errors: Vec::new(),
            dry_run,
            started_at: Utc::now(),
            duration_seconds: 0,
        }
    }

    /// Record a per-record failure.
    pub fn record_failure(&mut self, external_id: impl Into<String>, detail: impl Into<String>) {
        self.failed += 1;
        self.errors.push(RecordFailure {
            external_id: external_id.into(),
            detail: detail.into(),
        });
    }

    /// Whether any record failed during the pass.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}
