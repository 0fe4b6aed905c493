//! Reconciliation orchestrator.
//!
//! Drives one bounded pass end to end:
//!
//! 1. Fetch the full source snapshot (fatal on failure: a partial catalog
//!    would read as deletions downstream).
//! 2. Index the destination collection (fatal on failure).
//! 3. Resolve the reference map (cached process-wide).
//! 4. Plan the hot and cold lanes from the persisted cursor.
//! 5. Diff each scheduled record by content fingerprint and apply the
//!    minimal create/update set; per-record failures are recorded, never
//!    fatal.
//! 6. Persist the cold cursor (live runs only).
//! 7. Sweep the entire index for stale items: unpublish, then delete.
//!
//! Re-running a pass over an unchanged catalog is a no-op: every
//! fingerprint matches, nothing is deleted, and the cursor keeps rotating.

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cursor::COLD_CURSOR_KEY;
use crate::error::{CmsError, SyncResult};
use crate::fingerprint::fingerprint;
use crate::indexer::DestinationIndex;
use crate::media::resolve_media;
use crate::rate_limit::RateLimiter;
use crate::refcache::ReferenceCache;
use crate::retry::RetryPolicy;
use crate::scheduler::{BatchPlan, MAX_BATCH_LIMIT};
use crate::summary::SyncSummary;
use crate::traits::{CatalogSource, ContentStore, CursorStore, MediaResolver, RecordMapper};
use crate::types::{
    CatalogSnapshot, SourceRecord, TransformedRecord, FEATURES_FIELD, FINGERPRINT_FIELD,
};

/// Static configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Destination collection holding the mirrored listings.
    pub listing_collection: String,
    /// Per-lane batch budget (clamped to [`MAX_BATCH_LIMIT`]).
    pub batch_limit: usize,
    /// Requests per minute allowed against the destination.
    pub requests_per_minute: u32,
}

impl ReconcilerConfig {
    /// Create a configuration with the default batch budget and rate.
    pub fn new(listing_collection: impl Into<String>) -> Self {
        Self {
            listing_collection: listing_collection.into(),
            batch_limit: MAX_BATCH_LIMIT,
            requests_per_minute: 60,
        }
    }

    /// Set the per-lane batch budget.
    #[must_use]
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Set the destination request-rate ceiling.
    #[must_use]
    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }
}

/// Orchestrates one reconciliation pass per [`Reconciler::run`] call.
pub struct Reconciler {
    config: ReconcilerConfig,
    catalog: Arc<dyn CatalogSource>,
    store: Arc<dyn ContentStore>,
    cursors: Arc<dyn CursorStore>,
    mapper: Arc<dyn RecordMapper>,
    media: Arc<dyn MediaResolver>,
    references: Arc<ReferenceCache>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl Reconciler {
    /// Create a reconciler over its collaborators.
    pub fn new(
        config: ReconcilerConfig,
        catalog: Arc<dyn CatalogSource>,
        store: Arc<dyn ContentStore>,
        cursors: Arc<dyn CursorStore>,
        mapper: Arc<dyn RecordMapper>,
        media: Arc<dyn MediaResolver>,
        references: Arc<ReferenceCache>,
    ) -> Self {
        let limiter = RateLimiter::per_minute(config.requests_per_minute);
        Self {
            config,
            catalog,
            store,
            cursors,
            mapper,
            media,
            references,
            limiter,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the write retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one reconciliation pass.
    ///
    /// With `dry_run` set, the full diff runs but every mutation (create,
    /// update, publish, delete and the cursor write) is suppressed; the
    /// returned statistics match what a live run would have produced.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal classes (catalog unavailable or
    /// malformed, destination unreadable, cursor store failure), always
    /// before any mutation was attempted. Per-record failures are recorded
    /// in the summary's errors list instead.
    pub async fn run(&self, dry_run: bool) -> SyncResult<SyncSummary> {
        let started = Instant::now();
        info!(dry_run, "Starting reconciliation pass");

        let snapshot = self.catalog.fetch_snapshot().await?;
        let index =
            DestinationIndex::build(self.store.as_ref(), &self.config.listing_collection).await?;
        let references = self.references.get_or_resolve(self.store.as_ref()).await?;

        let cold_cursor = self
            .cursors
            .get(COLD_CURSOR_KEY)
            .await?
            .unwrap_or(0);
        let plan = BatchPlan::compute(snapshot.len(), self.config.batch_limit, cold_cursor);

        debug!(
            source = snapshot.len(),
            destination = index.len(),
            hot = plan.hot.len(),
            cold = plan.cold.len(),
            cold_cursor,
            next_cursor = plan.next_cursor,
            "Pass planned"
        );

        let mut summary = SyncSummary::new(dry_run);
        summary.source_total = snapshot.len() as u64;
        summary.destination_total = index.len() as u64;

        // Hot lane first, then cold; each record at most once per pass so
        // overlapping lanes never double-create.
        let mut seen: HashSet<&str> = HashSet::new();
        for &idx in plan.hot.iter().chain(plan.cold.iter()) {
            let record = &snapshot.records()[idx];
            if !seen.insert(record.external_id.as_str()) {
                continue;
            }
            self.reconcile_record(record, &index, references, dry_run, &mut summary)
                .await;
        }

        if !dry_run {
            self.cursors.set(COLD_CURSOR_KEY, plan.next_cursor).await?;
        }

        self.sweep_deleted(&snapshot, &index, dry_run, &mut summary)
            .await;

        summary.duration_seconds = started.elapsed().as_secs();
        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            deleted = summary.deleted,
            failed = summary.failed,
            dry_run,
            "Reconciliation pass finished"
        );
        Ok(summary)
    }

    /// Diff one record against the destination index and apply the result.
    async fn reconcile_record(
        &self,
        record: &SourceRecord,
        index: &DestinationIndex,
        references: &HashMap<String, String>,
        dry_run: bool,
        summary: &mut SyncSummary,
    ) {
        let external_id = record.external_id.as_str();

        let mut transformed = match self.mapper.map(record) {
            Ok(t) => t,
            Err(e) => {
                warn!(external_id = %external_id, error = %e, "Mapping failed, skipping record");
                summary.record_failure(external_id, format!("mapping: {e}"));
                return;
            }
        };

        apply_references(&mut transformed, references);
        resolve_media(&mut transformed, self.media.as_ref());

        let fp = fingerprint(&transformed.fields);

        match index.get(external_id) {
            None => {
                if dry_run {
                    debug!(external_id = %external_id, "Would create (dry run)");
                    summary.created += 1;
                    return;
                }
                match self.create_and_publish(&transformed, &fp).await {
                    Ok(()) => {
                        info!(external_id = %external_id, "Created listing");
                        summary.created += 1;
                    }
                    Err(e) => {
                        warn!(external_id = %external_id, error = %e, "Create failed");
                        summary.record_failure(external_id, format!("create: {e}"));
                    }
                }
            }
            Some(item) if item.fingerprint() == Some(fp.as_str()) => {
                debug!(external_id = %external_id, "Unchanged, skipping");
                summary.skipped += 1;
            }
            Some(item) => {
                if dry_run {
                    debug!(external_id = %external_id, "Would update (dry run)");
                    summary.updated += 1;
                    return;
                }
                match self.patch_and_publish(&item.id, &transformed, &fp).await {
                    Ok(()) => {
                        info!(external_id = %external_id, item_id = %item.id, "Updated listing");
                        summary.updated += 1;
                    }
                    Err(e) => {
                        warn!(external_id = %external_id, error = %e, "Update failed");
                        summary.record_failure(external_id, format!("update: {e}"));
                    }
                }
            }
        }
    }

    /// Write a new item with the fingerprint embedded, then publish it.
    ///
    /// The destination's content model requires the explicit publish step:
    /// an unpublished create is invisible to consumers.
    async fn create_and_publish(
        &self,
        record: &TransformedRecord,
        fp: &str,
    ) -> Result<(), CmsError> {
        let collection = &self.config.listing_collection;
        let fields = with_fingerprint(&record.fields, fp);

        self.limiter.acquire().await;
        let item = self
            .retry
            .execute("create_item", || self.store.create_item(collection, &fields))
            .await?;

        let item_ids = [item.id];
        self.limiter.acquire().await;
        self.retry
            .execute("publish_items", || {
                self.store.publish_items(collection, &item_ids)
            })
            .await
    }

    /// Patch an existing item with the new fields + fingerprint, then
    /// republish it.
    async fn patch_and_publish(
        &self,
        item_id: &str,
        record: &TransformedRecord,
        fp: &str,
    ) -> Result<(), CmsError> {
        let collection = &self.config.listing_collection;
        let fields = with_fingerprint(&record.fields, fp);

        self.limiter.acquire().await;
        self.retry
            .execute("update_item", || {
                self.store.update_item(collection, item_id, &fields)
            })
            .await?;

        let item_ids = [item_id.to_string()];
        self.limiter.acquire().await;
        self.retry
            .execute("publish_items", || {
                self.store.publish_items(collection, &item_ids)
            })
            .await
    }

    /// Remove every destination item whose external identifier is absent
    /// from the source snapshot.
    ///
    /// Runs over the entire index, not just the current batches, so
    /// removals are never missed even though creates and updates are
    /// batched. Runs last so a record re-created earlier in this pass is
    /// never swept by a stale view.
    async fn sweep_deleted(
        &self,
        snapshot: &CatalogSnapshot,
        index: &DestinationIndex,
        dry_run: bool,
        summary: &mut SyncSummary,
    ) {
        for (external_id, item) in index.items() {
            if snapshot.contains(external_id) {
                continue;
            }

            if dry_run {
                debug!(external_id = %external_id, item_id = %item.id, "Would delete (dry run)");
                summary.deleted += 1;
                continue;
            }

            match self.unpublish_and_delete(&item.id).await {
                Ok(()) => {
                    info!(external_id = %external_id, item_id = %item.id, "Removed stale listing");
                    summary.deleted += 1;
                }
                Err(e) => {
                    warn!(external_id = %external_id, item_id = %item.id, error = %e, "Delete failed");
                    summary.record_failure(external_id.clone(), format!("delete: {e}"));
                }
            }
        }
    }

    /// Unpublish a stale item, then delete it.
    ///
    /// Items that never went live report not-found on unpublish; the delete
    /// still proceeds so drafts left by earlier failed passes are removed.
    async fn unpublish_and_delete(&self, item_id: &str) -> Result<(), CmsError> {
        let collection = &self.config.listing_collection;

        self.limiter.acquire().await;
        match self
            .retry
            .execute("unpublish_item", || {
                self.store.unpublish_item(collection, item_id)
            })
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(item_id = %item_id, "Item was not live, skipping unpublish");
            }
            Err(e) => return Err(e),
        }

        self.limiter.acquire().await;
        self.retry
            .execute("delete_item", || self.store.delete_item(collection, item_id))
            .await
    }
}

/// Resolve reference slugs into destination identifiers.
///
/// Unresolvable slugs are dropped with a warning; the record still syncs.
fn apply_references(record: &mut TransformedRecord, references: &HashMap<String, String>) {
    if record.reference_slugs.is_empty() {
        return;
    }

    let mut resolved: Vec<Value> = Vec::with_capacity(record.reference_slugs.len());
    for slug in &record.reference_slugs {
        match references.get(slug) {
            Some(id) => resolved.push(json!(id)),
            None => {
                warn!(
                    external_id = %record.external_id,
                    slug = %slug,
                    "Reference slug not found in reference collection, dropping"
                );
            }
        }
    }

    record
        .fields
        .insert(FEATURES_FIELD.to_string(), Value::Array(resolved));
}

/// Copy the field map with the fingerprint embedded.
fn with_fingerprint(fields: &BTreeMap<String, Value>, fp: &str) -> BTreeMap<String, Value> {
    let mut fields = fields.clone();
    fields.insert(FINGERPRINT_FIELD.to_string(), json!(fp));
    fields
}
