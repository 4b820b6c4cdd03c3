//! Storage module for persisting crawl results
//!
//! This module handles the durable result set of a crawl:
//! - The `PageRecord` shape written for every successfully fetched page
//! - Loading prior results at startup (missing or corrupt files start empty)
//! - Rewriting the whole result file after every appended record

mod json_store;
mod record;

pub use json_store::ResultStore;
pub use record::PageRecord;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
