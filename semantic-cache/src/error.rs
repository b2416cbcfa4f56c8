//! Error types for the semantic cache.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur in the semantic cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A vector's length disagrees with the configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The persisted store exists but cannot be turned into valid entries.
    #[error("corrupt store at {}: {reason}", path.display())]
    CorruptStore { path: PathBuf, reason: String },

    /// The downstream resolver failed or produced nothing usable.
    #[error("resolver failed: {0}")]
    ResolverFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(#[from] semcache_embeddings::EmbeddingError),

    /// Reading or writing the store failed. A failed write leaves the
    /// in-memory state unchanged.
    #[error("store i/o failed for {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::corrupt("/tmp/cache.json", "unexpected end of file");
        assert_eq!(
            err.to_string(),
            "corrupt store at /tmp/cache.json: unexpected end of file"
        );

        let err = CacheError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 768, got 384");
    }

    #[test]
    fn test_resolver_failure_keeps_source() {
        let err = CacheError::ResolverFailure(anyhow::anyhow!("database unavailable").into());
        assert_eq!(err.to_string(), "resolver failed: database unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }
}
