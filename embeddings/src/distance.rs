//! Distance computation for embeddings.
//!
//! The semantic cache compares raw squared euclidean distances against its
//! threshold. No normalization happens here; a threshold only means something
//! relative to the norms the provider produces.

use crate::error::{EmbeddingError, Result};

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Squared euclidean distance, without the final square root.
///
/// This is the metric a flat L2 index reports, so thresholds configured
/// for the cache are expressed in these units.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(squared_euclidean_unchecked(a, b))
}

/// [`squared_euclidean`] for callers that already checked both lengths.
///
/// Extra trailing elements of the longer slice are ignored.
pub fn squared_euclidean_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Normalize an embedding to unit length. Zero vectors are left untouched.
pub fn normalize(embedding: &mut [f32]) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}
