//! Exact-key cache for fetched documents.
//!
//! Keyed by source identifier (usually a URL) so tool code can skip
//! re-fetching and re-cleaning a page it already saw this session. There
//! is no eviction and no persistence.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Session-scoped document cache.
///
/// Cloning is cheap and clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    /// Documents in first-insertion order.
    entries: Arc<RwLock<IndexMap<String, String>>>,
}

impl DocumentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached document for `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Document cache hit: {key}");
        } else {
            debug!("Document cache miss: {key}");
        }
        value
    }

    /// Store a document, replacing any previous value for the same key.
    ///
    /// A replaced key keeps the position of its first insertion.
    pub async fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        debug!("Cached document: {key}");
        self.entries.write().await.insert(key, value.into());
    }

    /// Check if a document is cached.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Remove a document, returning it if it was cached.
    pub async fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().await.shift_remove(key)
    }

    /// Number of cached documents.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All documents in first-insertion order.
    pub async fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drop every document.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared document cache");
    }
}
