// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BLOB encoding for embedding vectors.
//!
//! Vectors are stored as little-endian f32 sequences, 4 bytes per
//! component, so a D-dimensional embedding occupies exactly 4*D bytes.

/// Convert an f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let original = vec![0.1_f32, 0.2, 0.3, -0.5, 1.0];
        let blob = vec_to_blob(&original);
        let recovered = blob_to_vec(&blob);
        assert_eq!(original.len(), recovered.len());
        for (a, b) in original.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn blob_size_is_four_bytes_per_component() {
        let v: Vec<f32> = (0..384).map(|i| i as f32 / 384.0).collect();
        let blob = vec_to_blob(&v);
        assert_eq!(blob.len(), 384 * 4);
        assert_eq!(blob_to_vec(&blob).len(), 384);
    }

    #[test]
    fn empty_vector_roundtrips() {
        let blob = vec_to_blob(&[]);
        assert!(blob.is_empty());
        assert!(blob_to_vec(&blob).is_empty());
    }
}
