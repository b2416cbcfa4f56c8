//! Durable storage for the semantic cache.
//!
//! The whole cache lives in one JSON file. Every save writes a sibling
//! `.tmp` file, syncs it and renames it over the target, so a crash leaves
//! either the previous file or the new one, never a torn write.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::entry::CacheEntry;
use crate::error::{CacheError, Result};

/// Version written into every store file.
pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to rebuild a cache without re-embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// File format version.
    pub version: u32,

    /// Dimension shared by every embedding in the file.
    pub dimension: usize,

    /// Sequence id the next insertion will receive.
    pub next_sequence_id: u64,

    /// Entries in sequence order.
    pub entries: Vec<CacheEntry>,
}

impl StoreSnapshot {
    /// An empty snapshot for the given dimension.
    pub fn empty(dimension: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            dimension,
            next_sequence_id: 0,
            entries: Vec::new(),
        }
    }

    /// Check the structural invariants a loaded file must satisfy.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.version
            ));
        }

        if self.dimension == 0 {
            return Err("dimension must be positive".to_string());
        }

        let mut previous: Option<u64> = None;
        for entry in &self.entries {
            if entry.embedding.len() != self.dimension {
                return Err(format!(
                    "entry {} has {} dimensions, store declares {}",
                    entry.sequence_id,
                    entry.embedding.len(),
                    self.dimension
                ));
            }

            if previous.is_some_and(|prev| entry.sequence_id <= prev) {
                return Err(format!(
                    "sequence id {} is out of order",
                    entry.sequence_id
                ));
            }
            previous = Some(entry.sequence_id);
        }

        if let Some(last) = previous {
            if self.next_sequence_id <= last {
                return Err(format!(
                    "next_sequence_id {} does not follow last entry {last}",
                    self.next_sequence_id
                ));
            }
        }

        Ok(())
    }
}

/// Borrowed view used for writing, so saving does not copy entries.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    dimension: usize,
    next_sequence_id: u64,
    entries: Vec<&'a CacheEntry>,
}

/// A JSON file holding the cache contents.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    path: PathBuf,
}

impl PersistentStore {
    /// Create a store backed by the given file. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the stored snapshot.
    ///
    /// Returns `Ok(None)` if the file does not exist. A file that exists but
    /// cannot be parsed or fails validation is a `CorruptStore` error.
    pub async fn load(&self) -> Result<Option<StoreSnapshot>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache store at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(CacheError::persistence(&self.path, e)),
        };

        let snapshot: StoreSnapshot = serde_json::from_slice(&content)
            .map_err(|e| CacheError::corrupt(&self.path, e.to_string()))?;
        snapshot
            .validate()
            .map_err(|reason| CacheError::corrupt(&self.path, reason))?;

        info!(
            "Loaded {} cache entries from {}",
            snapshot.entries.len(),
            self.path.display()
        );
        Ok(Some(snapshot))
    }

    /// Atomically replace the store with the given entries.
    pub async fn save<'a>(
        &self,
        dimension: usize,
        next_sequence_id: u64,
        entries: impl IntoIterator<Item = &'a CacheEntry>,
    ) -> Result<()> {
        let snapshot = SnapshotRef {
            version: FORMAT_VERSION,
            dimension,
            next_sequence_id,
            entries: entries.into_iter().collect(),
        };
        let content = serde_json::to_vec_pretty(&snapshot)?;
        let count = snapshot.entries.len();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::persistence(parent, e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, &content).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!("Failed to remove {}: {cleanup}", temp_path.display());
            }
            return Err(CacheError::persistence(&temp_path, e));
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| CacheError::persistence(&self.path, e))?;

        debug!("Saved {count} cache entries to {}", self.path.display());
        Ok(())
    }

    /// Save a whole snapshot.
    pub async fn save_snapshot(&self, snapshot: &StoreSnapshot) -> Result<()> {
        self.save(
            snapshot.dimension,
            snapshot.next_sequence_id,
            &snapshot.entries,
        )
        .await
    }
}

async fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}
