// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector math helpers used by the store and the index implementations.
//!
//! Embeddings are L2-normalized once on the way into the store, so cosine
//! similarity reduces to a plain dot product everywhere else.

/// Compute the L2 norm (Euclidean length) of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length, returning the unit vector together with
/// the original norm. A zero vector is returned unchanged with norm 0.0.
pub fn normalize(v: &[f32]) -> (Vec<f32>, f32) {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return (v.to_vec(), 0.0);
    }
    (v.iter().map(|x| x / norm).collect(), norm)
}

/// Dot product of two equal-length vectors.
///
/// For L2-normalized vectors this is exactly the cosine similarity.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn l2_norm_of_three_four() {
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn normalize_returns_original_norm() {
        let (unit, norm) = normalize(&[3.0, 4.0]);
        assert!((norm - 5.0).abs() < f32::EPSILON);
        assert!((unit[0] - 0.6).abs() < 1e-6);
        assert!((unit[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_vector_unchanged() {
        let (unit, norm) = normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(unit, vec![0.0, 0.0, 0.0]);
        assert_eq!(norm, 0.0);
    }

    #[test]
    fn dot_orthogonal() {
        let sim = dot(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < f32::EPSILON, "orthogonal vectors should have sim ~0.0, got {sim}");
    }

    #[test]
    fn dot_identical_unit_vectors() {
        let (unit, _) = normalize(&[0.3, -1.2, 0.7]);
        let sim = dot(&unit, &unit);
        assert!((sim - 1.0).abs() < 1e-5, "identical unit vectors should have sim ~1.0, got {sim}");
    }

    proptest! {
        #[test]
        fn normalize_yields_unit_length(v in prop::collection::vec(-100.0f32..100.0, 1..64)) {
            prop_assume!(l2_norm(&v) > 1e-3);
            let (unit, _) = normalize(&v);
            prop_assert!((l2_norm(&unit) - 1.0).abs() < 1e-3);
        }
    }
}
