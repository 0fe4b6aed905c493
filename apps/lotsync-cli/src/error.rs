//! CLI error handling.

use thiserror::Error;

use crate::config::ConfigError;
use lotsync_engine::{CatalogError, SyncError};

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A reconciliation pass failed fatally.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A catalog report could not be produced.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Output serialization failed.
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 78, // EX_CONFIG
            _ => 1,
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
