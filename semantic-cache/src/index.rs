//! Flat vector index for nearest-neighbor lookups.

use ordered_float::OrderedFloat;
use tracing::debug;

use semcache_embeddings::squared_euclidean_unchecked;

use crate::error::{CacheError, Result};

/// A search hit: a row of the index and its squared euclidean distance to
/// the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in insertion order.
    pub row_id: usize,

    /// Squared euclidean distance to the query.
    pub distance: f32,
}

/// An append-only index of fixed-dimension vectors.
///
/// Vectors are stored contiguously and searched exhaustively, so results
/// are exact. There is no point deletion: a caller that needs to drop rows
/// builds a new index from the survivors with [`VectorIndex::rebuild`].
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// Row-major vector storage, `len() * dimension` values.
    data: Vec<f32>,

    /// Length of every stored vector.
    dimension: usize,
}

impl VectorIndex {
    /// Create an empty index.
    pub fn new(dimension: usize) -> Self {
        Self {
            data: Vec::new(),
            dimension,
        }
    }

    /// Build an index from vectors in order; row ids follow iteration order.
    pub fn rebuild<'a, I>(dimension: usize, vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut index = Self::new(dimension);
        for vector in vectors {
            index.add(vector)?;
        }
        debug!("Rebuilt vector index with {} rows", index.len());
        Ok(index)
    }

    /// Length of every stored vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the number of stored vectors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension.max(1)
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(CacheError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Append a vector and return its row id (the count before insertion).
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector)?;
        let row_id = self.len();
        self.data.extend_from_slice(vector);
        Ok(row_id)
    }

    /// Read back a stored vector.
    pub fn vector(&self, row_id: usize) -> Option<&[f32]> {
        let start = row_id.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// Find the `k` nearest vectors to `query`.
    ///
    /// Results are ordered by ascending distance; equal distances keep the
    /// lower (earlier) row first. NaN distances sort after every number.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query)?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(OrderedFloat<f32>, usize)> = self
            .rows()
            .enumerate()
            .map(|(row_id, row)| {
                (
                    OrderedFloat(squared_euclidean_unchecked(query, row)),
                    row_id,
                )
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable(k - 1);
            scored.truncate(k);
        }
        scored.sort_unstable();

        Ok(scored
            .into_iter()
            .map(|(distance, row_id)| Neighbor {
                row_id,
                distance: distance.0,
            })
            .collect())
    }
}
