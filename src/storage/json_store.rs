//! JSON file result store
//!
//! The whole record sequence is rewritten on every append. Writes go to a
//! sibling temporary file that is renamed over the target, so a failed save
//! leaves the previously persisted file intact. A save cut off between the
//! write and the rename can leave `<path>.tmp` behind; `load` removes it.

use crate::storage::{PageRecord, StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Ordered, append-only collection of page records backed by a JSON file
pub struct ResultStore {
    path: PathBuf,
    records: Mutex<Vec<PageRecord>>,
}

impl ResultStore {
    /// Opens the store at `path`, loading any records already persisted there
    ///
    /// Loading never fails. A missing or empty file starts empty. A file that
    /// cannot be read or decoded is logged, moved aside to `<path>.corrupt` so
    /// the next save does not overwrite it, and also treated as empty.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        remove_stale_tmp(&path).await;

        let records = match Self::read_persisted(&path).await {
            Ok(records) => records,
            Err(e) => {
                move_aside(&path, &e).await;
                Vec::new()
            }
        };

        tracing::info!(
            "Loaded {} existing records from {}",
            records.len(),
            path.display()
        );

        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Reads the records persisted at `path` without modifying anything
    ///
    /// A missing or empty file yields no records. Unreadable or undecodable
    /// content is returned as an error.
    pub async fn read_persisted(path: impl AsRef<Path>) -> StorageResult<Vec<PageRecord>> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Creates an empty store that will persist to `path` on the first append
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Appends a record and persists the full sequence
    ///
    /// The record is kept in memory even when the save fails, so a later
    /// successful save still writes it. Returns the number of records held.
    pub async fn append(&self, record: PageRecord) -> StorageResult<usize> {
        let mut records = self.records.lock().await;
        records.push(record);
        let count = records.len();

        write_records(&self.path, &records).await?;
        tracing::debug!("Saved {} records to {}", count, self.path.display());

        Ok(count)
    }

    /// Persists the current sequence without appending
    pub async fn save(&self) -> StorageResult<()> {
        let records = self.records.lock().await;
        write_records(&self.path, &records).await
    }

    /// Returns a snapshot of the records in append order
    pub async fn records(&self) -> Vec<PageRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Returns true if a record for `url` is held
    pub async fn contains(&self, url: &str) -> bool {
        self.records.lock().await.iter().any(|r| r.url == url)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn move_aside(path: &Path, cause: &StorageError) {
    let aside = sibling(path, "corrupt");
    tracing::warn!(
        "Failed to load {}, moving it to {} and starting empty: {}",
        path.display(),
        aside.display(),
        cause
    );
    if let Err(e) = tokio::fs::rename(path, &aside).await {
        tracing::warn!("Failed to move unreadable file aside: {}", e);
    }
}

async fn remove_stale_tmp(path: &Path) {
    let tmp = sibling(path, "tmp");
    match tokio::fs::remove_file(&tmp).await {
        Ok(()) => tracing::info!("Removed stale temporary file {}", tmp.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", tmp.display(), e),
    }
}

async fn write_records(path: &Path, records: &[PageRecord]) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    let tmp = sibling(path, "tmp");

    if let Err(source) = tokio::fs::write(&tmp, json).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StorageError::Io { path: tmp, source });
    }

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// `results.json` -> `results.json.<suffix>` in the same directory
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
