//! Cosine distance and similarity.
//!
//! Similarity follows the convention `similarity = 1 - cosine_distance`,
//! clamped to `[0, 1]` so that opposite-facing vectors score zero rather than
//! going negative.

use crate::error::{PrismError, Result};

/// Cosine distance in `[0, 2]`. A zero-norm vector is maximally distant (1.0).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(PrismError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(1.0);
    }

    let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    Ok((1.0 - cosine) as f32)
}

/// `1 - cosine_distance`, clamped to `[0, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    Ok((1.0 - cosine_distance(a, b)?).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.1, 0.2, 0.3];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-6);
        assert!(cosine_distance(&v, &v).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [-1.0, 0.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
        assert!((cosine_distance(&a, &c).unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &c).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_vector_and_mismatch() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        assert!(matches!(
            cosine_distance(&[1.0], &[1.0, 0.0]),
            Err(PrismError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }
}
