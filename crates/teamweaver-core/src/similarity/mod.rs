//! Dense vector primitives for motivation embeddings.
//!
//! Embeddings arrive from the provider as fixed-dimension `f32` vectors
//! (commonly 1536). A zero vector means "missing motivation" and is legal
//! everywhere; callers decide what a missing side contributes, so the
//! cosine here reports `None` instead of erroring on zero magnitude.
//!
//! All operations are pure and iterate in index order, so results are
//! bit-reproducible for identical inputs.

use thiserror::Error;

/// Errors from dense vector operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VectorError {
    /// Vectors must share a dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the first operand.
        expected: usize,
        /// Dimension of the second operand.
        actual: usize,
    },

    /// Mean pooling over zero vectors.
    #[error("Empty vector set")]
    EmptySet,
}

/// L2 norm (Euclidean length) of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// True when every component is (close to) zero.
#[inline]
pub fn is_zero(v: &[f32]) -> bool {
    v.is_empty() || l2_norm(v) < f32::EPSILON
}

/// Normalize a vector to unit length in place.
///
/// A zero vector is left unchanged.
#[inline]
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product. Caller must pass equal-length slices.
#[inline]
fn dot_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Returns `None` when either vector is zero (or empty): the cosine is
/// undefined there and the caller owns the missing-motivation policy.
///
/// # Errors
///
/// [`VectorError::DimensionMismatch`] when the non-empty operands differ
/// in length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<Option<f32>, VectorError> {
    if is_zero(a) || is_zero(b) {
        return Ok(None);
    }
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let dot = dot_unchecked(a, b);
    let norm = l2_norm(a) * l2_norm(b);
    Ok(Some((dot / norm).clamp(-1.0, 1.0)))
}

/// Component-wise mean of a set of equal-length vectors.
///
/// # Errors
///
/// - [`VectorError::EmptySet`] when `vectors` is empty
/// - [`VectorError::DimensionMismatch`] when lengths differ
pub fn mean_pool(vectors: &[&[f32]]) -> Result<Vec<f32>, VectorError> {
    let first = vectors.first().ok_or(VectorError::EmptySet)?;
    let dim = first.len();
    let mut acc = vec![0.0f32; dim];
    for v in vectors {
        if v.len() != dim {
            return Err(VectorError::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }
        for (slot, x) in acc.iter_mut().zip(v.iter()) {
            *slot += x;
        }
    }
    let n = vectors.len() as f32;
    for slot in acc.iter_mut() {
        *slot /= n;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        let sim = cosine_similarity(&v, &v).unwrap().unwrap();
        assert!(
            (sim - 1.0).abs() < 1e-6,
            "identical vectors should have similarity 1.0, got {sim}"
        );
        println!("[PASS] cosine of identical vectors = {sim:.6}");
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap().unwrap();
        assert!(sim.abs() < 1e-6);
        println!("[PASS] cosine of orthogonal vectors = {sim:.6}");
    }

    #[test]
    fn test_cosine_opposite_vectors() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        let sim = cosine_similarity(&a, &b).unwrap().unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_none() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), None);
        assert_eq!(cosine_similarity(&b, &a).unwrap(), None);
        assert_eq!(cosine_similarity(&[], &b).unwrap(), None);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(VectorError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_mean_pool_basic() {
        let a = vec![1.0, 3.0];
        let b = vec![3.0, 5.0];
        let mean = mean_pool(&[&a, &b]).unwrap();
        assert_eq!(mean, vec![2.0, 4.0]);
    }

    #[test]
    fn test_mean_pool_empty_set() {
        assert!(matches!(mean_pool(&[]), Err(VectorError::EmptySet)));
    }

    #[test]
    fn test_mean_pool_dimension_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert!(matches!(
            mean_pool(&[&a, &b]),
            Err(VectorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_high_dimensional_1536() {
        let a: Vec<f32> = (0..1536).map(|i| (i as f32) * 0.0005).collect();
        let b: Vec<f32> = (0..1536).map(|i| ((i as f32) * 0.0005).sin()).collect();
        let sim = cosine_similarity(&a, &b).unwrap().unwrap();
        assert!((-1.0..=1.0).contains(&sim));
        assert!(sim.is_finite());
    }
}
