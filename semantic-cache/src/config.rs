//! Configuration for the semantic cache.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default squared euclidean threshold for a hit.
pub const DEFAULT_THRESHOLD: f32 = 0.35;

/// Default capacity when FIFO eviction is configured.
pub const DEFAULT_MAX_RESPONSES: usize = 100;

/// Construction-time configuration for a [`SemanticCache`](crate::SemanticCache).
///
/// ```toml
/// dimension = 768
/// threshold = 0.35
/// max_responses = 100
/// eviction_policy = "fifo"
/// store_path = "/var/lib/agent/semantic_cache.json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Length of every embedding stored in the cache.
    pub dimension: usize,

    /// Maximum squared euclidean distance that still counts as a hit
    /// (inclusive).
    ///
    /// The value is coupled to the embedding provider: for unit-length
    /// vectors the squared distance is `2 - 2·cos`, so 0.35 accepts matches
    /// with cosine similarity of roughly 0.825 or more. Providers that emit
    /// unnormalized vectors need a threshold chosen for their scale.
    pub threshold: f32,

    /// Maximum number of entries kept when an eviction policy is configured.
    pub max_responses: Option<usize>,

    /// Which entries to discard once `max_responses` is exceeded.
    pub eviction_policy: EvictionPolicyKind,

    /// JSON file backing the cache. `None` keeps the cache in memory only.
    pub store_path: Option<PathBuf>,
}

impl CacheConfig {
    /// Create a configuration with default values for the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    /// Set the hit threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Bound the cache to `max_responses` entries with FIFO eviction.
    pub fn with_fifo(mut self, max_responses: usize) -> Self {
        self.max_responses = Some(max_responses);
        self.eviction_policy = EvictionPolicyKind::Fifo;
        self
    }

    /// Let the cache grow without bound.
    pub fn unbounded(mut self) -> Self {
        self.max_responses = None;
        self.eviction_policy = EvictionPolicyKind::None;
        self
    }

    /// Persist the cache to the given file.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Capacity enforced by the configured policy, if any.
    pub fn capacity(&self) -> Option<usize> {
        match self.eviction_policy {
            EvictionPolicyKind::Fifo => self.max_responses,
            EvictionPolicyKind::None => None,
        }
    }

    /// Default location for a persisted cache under the user data directory.
    ///
    /// `None` if the platform has no data directory.
    pub fn default_store_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("semcache").join("semantic_cache.json"))
    }

    /// Check the configuration for values the cache cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(CacheError::Config("dimension must be positive".to_string()));
        }

        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(CacheError::Config(format!(
                "threshold must be a finite non-negative number, got {}",
                self.threshold
            )));
        }

        match (self.eviction_policy, self.max_responses) {
            (EvictionPolicyKind::Fifo, None) => Err(CacheError::Config(
                "fifo eviction requires max_responses".to_string(),
            )),
            (_, Some(0)) => Err(CacheError::Config(
                "max_responses must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Parse and validate a configuration from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CacheError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CacheError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dimension: semcache_embeddings::DEFAULT_DIMENSION,
            threshold: DEFAULT_THRESHOLD,
            max_responses: Some(DEFAULT_MAX_RESPONSES),
            eviction_policy: EvictionPolicyKind::Fifo,
            store_path: None,
        }
    }
}

/// Eviction policy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicyKind {
    /// Evict the oldest entries first.
    #[default]
    Fifo,
    /// Never evict.
    None,
}
