//! Durable cursor storage for the cold lane.
//!
//! The cold-lane cursor is the only state the engine persists between
//! invocations. The store contract is a single integer per fixed key;
//! absence means the lane starts from 0.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::CursorError;
use crate::traits::CursorStore;

/// Key under which the cold-lane cursor is stored.
pub const COLD_CURSOR_KEY: &str = "cold-cursor";

/// On-disk document format for one cursor key.
#[derive(Debug, Serialize, Deserialize)]
struct CursorDocument {
    value: u64,
    updated_at: DateTime<Utc>,
}

/// File-backed cursor store. One JSON document per key.
///
/// A corrupt or unreadable document is treated as absent (and removed), so
/// a damaged file degrades to a full cold-lane restart instead of a stuck
/// pass.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    dir: PathBuf,
}

impl FileCursorStore {
    /// Create a store rooted at the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, CursorError> {
        let path = self.path_for(key);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cursor file, treating as absent");
                return Ok(None);
            }
        };

        match serde_json::from_str::<CursorDocument>(&contents) {
            Ok(doc) => Ok(Some(doc.value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cursor file is corrupted, clearing");
                let _ = tokio::fs::remove_file(&path).await;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), CursorError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CursorError::new(format!("failed to create cursor dir: {e}")))?;

        let doc = CursorDocument {
            value,
            updated_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&doc)
            .map_err(|e| CursorError::new(format!("failed to serialize cursor: {e}")))?;

        let path = self.path_for(key);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| CursorError::new(format!("failed to write {}: {e}", path.display())))
    }
}

/// In-memory cursor store for tests.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    values: RwLock<HashMap<String, u64>>,
}

impl MemoryCursorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, CursorError> {
        Ok(self.values.read().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), CursorError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
