//! The unit stored by the semantic cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use semcache_embeddings::Embedding;

/// A cached answer and the embedding of the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Position in insertion order; never reused.
    pub sequence_id: u64,

    /// The query as the caller phrased it.
    pub query_text: String,

    /// Embedding of `query_text`.
    pub embedding: Embedding,

    /// The resolved answer.
    pub answer: String,

    /// When the entry was inserted.
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        sequence_id: u64,
        query_text: impl Into<String>,
        embedding: Embedding,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            sequence_id,
            query_text: query_text.into(),
            embedding,
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}
