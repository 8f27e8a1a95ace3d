// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inverted-file index over k-means clusters.
//!
//! Vectors are partitioned into `n_clusters` cells by spherical k-means.
//! A search ranks centroids against the query, probes the `n_probe` best
//! cells, and scores only their members. Until the first training pass the
//! index has no centroids and falls back to an exact scan, so a cold store
//! behaves like the brute-force strategy.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reverie_core::vector::{dot, normalize};

use super::{top_k_by_dot, VectorIndex};

/// Lloyd iterations are capped; assignments converge much earlier on the
/// collection sizes this store targets.
const KMEANS_MAX_ITERS: usize = 10;

/// Fixed seed for centroid initialization so training is reproducible.
const KMEANS_SEED: u64 = 42;

pub struct IvfIndex {
    n_clusters: usize,
    n_probe: usize,
    vectors: HashMap<String, Vec<f32>>,
    /// Unit-length centroids, position is the cluster id. Empty until the
    /// first training pass.
    centroids: Vec<Vec<f32>>,
    /// Member ids per cluster, parallel to `centroids`.
    cells: Vec<Vec<String>>,
    assignments: HashMap<String, usize>,
}

impl IvfIndex {
    pub fn new(n_clusters: usize, n_probe: usize) -> Self {
        let n_clusters = n_clusters.max(1);
        Self {
            n_clusters,
            n_probe: n_probe.clamp(1, n_clusters),
            vectors: HashMap::new(),
            centroids: Vec::new(),
            cells: Vec::new(),
            assignments: HashMap::new(),
        }
    }

    /// Whether a training pass has produced centroids yet.
    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }

    pub fn assignments(&self) -> &HashMap<String, usize> {
        &self.assignments
    }

    pub fn assignment_of(&self, id: &str) -> Option<usize> {
        self.assignments.get(id).copied()
    }

    /// Install centroids restored from a snapshot. Clears any previous
    /// assignment state; vectors added afterwards are assigned against
    /// these centroids.
    pub fn set_centroids(&mut self, centroids: Vec<Vec<f32>>) {
        self.cells = vec![Vec::new(); centroids.len()];
        self.centroids = centroids;
        self.assignments.clear();
    }

    /// Insert a vector with a known cluster, used when replaying a
    /// snapshot. Falls back to nearest-centroid assignment when the stored
    /// cluster is absent or out of range.
    pub fn add_with_assignment(&mut self, id: &str, vector: Vec<f32>, cluster: Option<usize>) {
        match cluster {
            Some(c) if c < self.centroids.len() => {
                self.vectors.insert(id.to_string(), vector);
                self.assign(id, c);
            }
            _ => self.add(id, vector),
        }
    }

    /// Re-cluster the whole collection with spherical k-means. A no-op on
    /// an empty collection, which also clears any stale centroids.
    pub fn train(&mut self) {
        if self.vectors.is_empty() {
            self.centroids.clear();
            self.cells.clear();
            self.assignments.clear();
            return;
        }
        // Deterministic point order, then a seeded shuffle for the seeds.
        let mut ids: Vec<&String> = self.vectors.keys().collect();
        ids.sort();
        let k = self.n_clusters.min(ids.len());

        let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
        let mut picks: Vec<usize> = (0..ids.len()).collect();
        picks.shuffle(&mut rng);
        let mut centroids: Vec<Vec<f32>> = picks[..k]
            .iter()
            .map(|&i| self.vectors[ids[i]].clone())
            .collect();

        let mut labels = vec![0usize; ids.len()];
        for iter in 0..KMEANS_MAX_ITERS {
            let mut changed = false;
            for (i, id) in ids.iter().enumerate() {
                let vector = &self.vectors[*id];
                let best = nearest(&centroids, vector).unwrap_or(0);
                if labels[i] != best {
                    labels[i] = best;
                    changed = true;
                }
            }
            if !changed && iter > 0 {
                break;
            }

            let dim = centroids[0].len();
            let mut sums = vec![vec![0.0f32; dim]; k];
            let mut counts = vec![0usize; k];
            for (i, id) in ids.iter().enumerate() {
                let vector = &self.vectors[*id];
                for (slot, component) in sums[labels[i]].iter_mut().zip(vector) {
                    *slot += component;
                }
                counts[labels[i]] += 1;
            }
            for (c, sum) in sums.iter().enumerate() {
                if counts[c] == 0 {
                    // Empty cell keeps its previous centroid.
                    continue;
                }
                let mean: Vec<f32> =
                    sum.iter().map(|s| s / counts[c] as f32).collect();
                let (unit, norm) = normalize(&mean);
                if norm > 0.0 {
                    centroids[c] = unit;
                }
            }
        }

        self.centroids = centroids;
        self.cells = vec![Vec::new(); k];
        self.assignments.clear();
        for (i, id) in ids.iter().enumerate() {
            self.cells[labels[i]].push((*id).clone());
            self.assignments.insert((*id).clone(), labels[i]);
        }
    }

    fn assign(&mut self, id: &str, cluster: usize) {
        self.assignments.insert(id.to_string(), cluster);
        if let Some(cell) = self.cells.get_mut(cluster) {
            cell.push(id.to_string());
        }
    }

    fn unassign(&mut self, id: &str) {
        if let Some(cluster) = self.assignments.remove(id) {
            if let Some(cell) = self.cells.get_mut(cluster) {
                cell.retain(|member| member != id);
            }
        }
    }
}

/// Index of the centroid with the highest dot product.
fn nearest(centroids: &[Vec<f32>], vector: &[f32]) -> Option<usize> {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (dot(c, vector), i))
        .max_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
        })
        .map(|(_, i)| i)
}

impl VectorIndex for IvfIndex {
    fn add(&mut self, id: &str, vector: Vec<f32>) {
        self.unassign(id);
        if let Some(cluster) = nearest(&self.centroids, &vector) {
            self.vectors.insert(id.to_string(), vector);
            self.assign(id, cluster);
        } else {
            self.vectors.insert(id.to_string(), vector);
        }
    }

    fn update(&mut self, id: &str, vector: Vec<f32>) {
        self.add(id, vector);
    }

    fn remove(&mut self, id: &str) {
        self.vectors.remove(id);
        self.unassign(id);
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<String> {
        if !self.is_trained() {
            // Cold start: exact scan until the first training pass.
            return top_k_by_dot(self.vectors.iter(), query, k);
        }
        let mut ranked: Vec<(f32, usize)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (dot(c, query), i))
            .collect();
        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });

        let members = ranked
            .iter()
            .take(self.n_probe)
            .filter_map(|(_, cluster)| self.cells.get(*cluster))
            .flatten();
        let pairs = members.filter_map(|id| self.vectors.get_key_value(id));
        top_k_by_dot(pairs, query, k)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}
