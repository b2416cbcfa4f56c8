//! # Embeddings
//!
//! This crate provides the embedding seam for the semantic cache: the
//! provider trait that turns text into dense vectors, and the distance
//! functions used to compare them.
//!
//! ## Features
//!
//! - **Provider Trait**: Plug in any model behind `EmbeddingProvider`
//! - **Local Provider**: Deterministic feature-hashing embeddings, no network
//! - **Distance**: Squared euclidean, the metric the cache thresholds on
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingRequest ──► EmbeddingProvider ──► EmbeddingResponse   │
//! │                             │                     │             │
//! │                             ▼                     ▼             │
//! │                      HashingProvider      squared_euclidean     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod distance;
pub mod error;
pub mod provider;

pub use distance::{normalize, squared_euclidean, squared_euclidean_unchecked};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HashingProvider};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by sentence-transformer style models
/// such as all-mpnet-base-v2.
pub const DEFAULT_DIMENSION: usize = 768;
