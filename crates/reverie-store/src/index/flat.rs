// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact brute-force index. Linear in collection size, zero recall loss.
//!
//! This is the default strategy and the ground truth the approximate
//! strategies are measured against.

use std::collections::HashMap;

use super::{top_k_by_dot, VectorIndex};

pub struct FlatIndex {
    vectors: HashMap<String, Vec<f32>>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
        }
    }
}

impl Default for FlatIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, id: &str, vector: Vec<f32>) {
        self.vectors.insert(id.to_string(), vector);
    }

    fn update(&mut self, id: &str, vector: Vec<f32>) {
        self.vectors.insert(id.to_string(), vector);
    }

    fn remove(&mut self, id: &str) {
        self.vectors.remove(id);
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<String> {
        top_k_by_dot(self.vectors.iter(), query, k)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_orders_by_similarity() {
        let mut index = FlatIndex::new();
        index.add("x", vec![1.0, 0.0, 0.0]);
        index.add("y", vec![0.0, 1.0, 0.0]);
        index.add("z", vec![0.0, 0.0, 1.0]);

        let hits = index.search(&[0.9, 0.1, 0.0], 2);
        assert_eq!(hits, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn remove_drops_candidate() {
        let mut index = FlatIndex::new();
        index.add("a", vec![1.0, 0.0]);
        index.add("b", vec![0.8, 0.6]);
        index.remove("a");

        let hits = index.search(&[1.0, 0.0], 10);
        assert_eq!(hits, vec!["b".to_string()]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn update_replaces_vector() {
        let mut index = FlatIndex::new();
        index.add("a", vec![1.0, 0.0]);
        index.add("b", vec![0.0, 1.0]);
        index.update("a", vec![0.0, 1.0]);

        let hits = index.search(&[1.0, 0.0], 1);
        // Both now orthogonal to the query; tie resolves by id.
        assert_eq!(hits, vec!["a".to_string()]);
    }

    #[test]
    fn k_larger_than_collection_returns_all() {
        let mut index = FlatIndex::new();
        index.add("a", vec![1.0, 0.0]);
        let hits = index.search(&[1.0, 0.0], 100);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = FlatIndex::new();
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
        assert!(index.is_empty());
    }
}
