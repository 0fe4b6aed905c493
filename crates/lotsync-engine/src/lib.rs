//! Delta synchronization engine for mirroring a dealer vehicle catalog
//! into a CMS content collection.
//!
//! One invocation runs one bounded reconciliation pass: fetch the full
//! source catalog, index the destination collection, diff each scheduled
//! record by content fingerprint, apply the minimal create/update set,
//! persist the cold-lane cursor, and sweep stale items.
//!
//! ## Key Components
//!
//! - [`CatalogClient`] - Fetches and normalizes the source catalog snapshot
//! - [`CmsClient`] - Destination content client (list/create/patch/publish/delete)
//! - [`Reconciler`] - Orchestrates one pass end to end
//! - [`BatchPlan`] - Hot/cold lane scheduling under a fixed request budget
//! - [`ReferenceCache`] - Process-wide slug → identifier lookup
//! - [`RecordMapper`] / [`MediaResolver`] - Collaborator seams for field
//!   mapping and media URL resolution
//!
//! ## Reconciliation Flow
//!
//! ```text
//! ┌────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ Catalog Client │───►│    Reconciler    │───►│   CMS Client     │
//! │ (full snapshot)│    │ diff by          │    │ create / patch   │
//! └────────────────┘    │ fingerprint      │    │ publish / delete │
//!                       └────────┬─────────┘    └──────────────────┘
//!                                │
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!  ┌──────────────┐     ┌───────────────┐     ┌───────────────┐
//!  │  Batch Plan  │     │ Reference     │     │ Cursor Store  │
//!  │ (hot / cold) │     │ Cache         │     │ (cold lane)   │
//!  └──────────────┘     └───────────────┘     └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use lotsync_engine::{Reconciler, ReconcilerConfig};
//!
//! let config = ReconcilerConfig::new("listings-collection-id");
//! let reconciler = Reconciler::new(
//!     config, catalog, store, cursors, mapper, media, references,
//! );
//!
//! let summary = reconciler.run(false).await?;
//! println!("created={} updated={} deleted={}",
//!     summary.created, summary.updated, summary.deleted);
//! ```

pub mod auth;
pub mod catalog;
pub mod cms;
pub mod cursor;
pub mod error;
pub mod fingerprint;
pub mod indexer;
pub mod mapper;
pub mod media;
pub mod rate_limit;
pub mod reconciler;
pub mod refcache;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod summary;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use auth::Credentials;
pub use catalog::{CatalogClient, MediaAsset};
pub use cms::CmsClient;
pub use cursor::{FileCursorStore, MemoryCursorStore, COLD_CURSOR_KEY};
pub use error::{CatalogError, CmsError, CursorError, MapError, SyncError, SyncResult};
pub use fingerprint::fingerprint;
pub use indexer::DestinationIndex;
pub use mapper::{VehicleMapper, GALLERY_LIMIT};
pub use media::ProxyMediaResolver;
pub use rate_limit::RateLimiter;
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use refcache::ReferenceCache;
pub use report::{census, feature_frequency, CatalogCensus, FeatureCount};
pub use retry::RetryPolicy;
pub use scheduler::{BatchPlan, MAX_BATCH_LIMIT};
pub use summary::{RecordFailure, SyncSummary};
pub use traits::{CatalogSource, ContentStore, CursorStore, MediaResolver, RecordMapper};
pub use types::{CatalogSnapshot, CmsItem, ItemPage, MediaCache, SourceRecord, TransformedRecord};
