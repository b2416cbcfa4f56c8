//! Embedding providers.
//!
//! The cache treats the embedding model as a black box behind
//! [`EmbeddingProvider`]. Hosted model clients live outside this workspace
//! and implement the trait; [`HashingProvider`] is a local, deterministic
//! implementation that needs no network or model weights.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::Embedding;
use crate::distance::normalize;
use crate::error::{EmbeddingError, Result};

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Dimensions for the output (if supported by provider).
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            dimensions: None,
        }
    }

    /// Set the output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is available (model loaded, key set, etc.).
    fn is_available(&self) -> bool;
}

/// Local feature-hashing embedding provider.
///
/// Each lowercased alphanumeric token is hashed with SHA-256 into one of
/// `dimension` signed buckets and the result is scaled to unit length.
/// SHA-256 keeps the mapping identical across processes, which matters
/// because embeddings are persisted and compared after a restart.
///
/// Texts sharing most of their words land close together, so this is a
/// lexical stand-in for a real sentence model, good for tests and offline
/// use.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    /// Name reported as the model for every response.
    pub const MODEL: &'static str = "feature-hash-sha256";

    /// Create a provider producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    fn hash_into(dimension: usize, text: &str) -> Result<(Embedding, u64)> {
        let mut embedding = vec![0.0f32; dimension];
        let mut count = 0u64;

        for token in Self::tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
            count += 1;
        }

        if count == 0 {
            return Err(EmbeddingError::EmptyInput);
        }

        normalize(&mut embedding);
        Ok((embedding, count))
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(crate::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn name(&self) -> &str {
        "hashing"
    }

    fn default_model(&self) -> &str {
        Self::MODEL
    }

    fn default_dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let dimension = request.dimensions.unwrap_or(self.dimension);
        if dimension == 0 {
            return Err(EmbeddingError::InvalidResponse(
                "requested a zero-dimensional embedding".to_string(),
            ));
        }

        let (embedding, tokens) = Self::hash_into(dimension, &request.text)?;
        debug!("Hashed {tokens} tokens into {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model: Self::MODEL.to_string(),
            dimension,
            tokens_used: Some(tokens),
        })
    }

    fn is_available(&self) -> bool {
        self.dimension > 0
    }
}
