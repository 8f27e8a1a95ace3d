// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locality-sensitive hashing with random hyperplanes.
//!
//! Each table hashes a vector to an `n_bits`-wide sign pattern, one bit per
//! hyperplane. Candidates are the union of the query's bucket across all
//! tables, reranked exactly. Identical vectors always share every bucket,
//! so a self-query can never miss; dissimilar vectors collide rarely.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reverie_core::vector::dot;

use super::{top_k_by_dot, VectorIndex};

pub struct LshIndex {
    n_bits: usize,
    /// `planes[table][bit]` is one hyperplane normal.
    planes: Vec<Vec<Vec<f32>>>,
    /// Bucket maps per table, keyed by the sign-pattern code.
    tables: Vec<HashMap<u32, Vec<String>>>,
    vectors: HashMap<String, Vec<f32>>,
}

impl LshIndex {
    /// Draws `n_tables * n_bits` hyperplanes from a seeded RNG, so equal
    /// seeds produce equal bucket layouts across runs.
    pub fn new(dimension: usize, n_tables: usize, n_bits: usize, seed: u64) -> Self {
        let n_tables = n_tables.max(1);
        let n_bits = n_bits.clamp(1, 32);
        let mut rng = StdRng::seed_from_u64(seed);
        let planes = (0..n_tables)
            .map(|_| {
                (0..n_bits)
                    .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
                    .collect()
            })
            .collect();
        Self {
            n_bits,
            planes,
            tables: vec![HashMap::new(); n_tables],
            vectors: HashMap::new(),
        }
    }

    /// Sign pattern of `vector` against one table's hyperplanes.
    fn code(&self, table: usize, vector: &[f32]) -> u32 {
        let mut code = 0u32;
        for (bit, plane) in self.planes[table].iter().enumerate().take(self.n_bits) {
            if dot(plane, vector) >= 0.0 {
                code |= 1 << bit;
            }
        }
        code
    }
}

impl VectorIndex for LshIndex {
    fn add(&mut self, id: &str, vector: Vec<f32>) {
        if self.vectors.contains_key(id) {
            self.remove(id);
        }
        for table in 0..self.tables.len() {
            let code = self.code(table, &vector);
            let bucket = self.tables[table].entry(code).or_default();
            bucket.push(id.to_string());
        }
        self.vectors.insert(id.to_string(), vector);
    }

    fn update(&mut self, id: &str, vector: Vec<f32>) {
        self.remove(id);
        self.add(id, vector);
    }

    fn remove(&mut self, id: &str) {
        let Some(vector) = self.vectors.remove(id) else {
            return;
        };
        for table in 0..self.tables.len() {
            let code = self.code(table, &vector);
            if let Some(bucket) = self.tables[table].get_mut(&code) {
                bucket.retain(|member| member != id);
                if bucket.is_empty() {
                    self.tables[table].remove(&code);
                }
            }
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<String> {
        let mut candidates: HashSet<&String> = HashSet::new();
        for table in 0..self.tables.len() {
            let code = self.code(table, query);
            if let Some(bucket) = self.tables[table].get(&code) {
                candidates.extend(bucket.iter());
            }
        }
        let pairs = candidates
            .into_iter()
            .filter_map(|id| self.vectors.get_key_value(id));
        top_k_by_dot(pairs, query, k)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_core::vector::normalize;

    #[test]
    fn self_query_always_collides() {
        let mut lsh = LshIndex::new(8, 8, 12, 42);
        let mut rng = StdRng::seed_from_u64(3);
        let vectors: Vec<Vec<f32>> = (0..50)
            .map(|_| normalize(&(0..8).map(|_| rng.gen_range(-1.0f32..1.0)).collect::<Vec<_>>()).0)
            .collect();
        for (i, v) in vectors.iter().enumerate() {
            lsh.add(&format!("m{i}"), v.clone());
        }
        for (i, v) in vectors.iter().enumerate() {
            let hits = lsh.search(v, 1);
            assert_eq!(hits, vec![format!("m{i}")]);
        }
    }

    #[test]
    fn remove_scrubs_all_buckets() {
        let mut lsh = LshIndex::new(4, 4, 8, 7);
        lsh.add("a", vec![1.0, 0.0, 0.0, 0.0]);
        lsh.add("b", vec![0.9, 0.1, 0.0, 0.0]);
        lsh.remove("a");

        let hits = lsh.search(&[1.0, 0.0, 0.0, 0.0], 10);
        assert!(!hits.contains(&"a".to_string()));
        assert_eq!(lsh.len(), 1);
        // Removing again is a no-op.
        lsh.remove("a");
        assert_eq!(lsh.len(), 1);
    }

    #[test]
    fn update_rebuckets_vector() {
        let mut lsh = LshIndex::new(4, 6, 10, 42);
        lsh.add("a", vec![1.0, 0.0, 0.0, 0.0]);
        lsh.update("a", vec![0.0, 0.0, 0.0, 1.0]);

        let hits = lsh.search(&[0.0, 0.0, 0.0, 1.0], 1);
        assert_eq!(hits, vec!["a".to_string()]);
        assert_eq!(lsh.len(), 1);
    }

    #[test]
    fn equal_seeds_build_equal_tables() {
        let one = LshIndex::new(6, 3, 16, 99);
        let two = LshIndex::new(6, 3, 16, 99);
        assert_eq!(one.planes, two.planes);
    }

    #[test]
    fn bits_are_capped_at_code_width() {
        let lsh = LshIndex::new(4, 2, 64, 1);
        assert_eq!(lsh.n_bits, 32);
    }
}
