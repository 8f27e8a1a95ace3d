// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable approximate-nearest-neighbor index strategies.
//!
//! All four strategies sit behind [`VectorIndex`] and behave identically
//! from the query engine's point of view: they take unit-normalized vectors
//! and return an ordered candidate id list, possibly with false negatives,
//! never with inconsistent dimensionality. The strategy is selected once at
//! store construction and fixed for the instance's lifetime.

pub mod flat;
pub mod hnsw;
pub mod ivf;
pub mod lsh;

pub use flat::FlatIndex;
pub use hnsw::HnswIndex;
pub use ivf::IvfIndex;
pub use lsh::LshIndex;

use reverie_config::model::{IndexConfig, IndexKind};
use reverie_core::vector::dot;

/// Candidate lookup structure derived from the store's vectors.
///
/// Implementations never return similarity scores; exactness is restored by
/// the query engine's rerank pass.
pub trait VectorIndex {
    /// Insert a vector, replacing any previous entry under the same id.
    fn add(&mut self, id: &str, vector: Vec<f32>);

    /// Replace the vector for an existing id. Adding under a fresh id is
    /// also accepted, so upserts can funnel through either entry point.
    fn update(&mut self, id: &str, vector: Vec<f32>);

    /// Remove an id. Removing a missing id is a no-op.
    fn remove(&mut self, id: &str);

    /// Return up to `k` candidate ids ordered best-first.
    fn search(&self, query: &[f32], k: usize) -> Vec<String>;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The active strategy, dispatched by enum so hot paths stay monomorphized.
pub enum AnyIndex {
    Flat(FlatIndex),
    Hnsw(HnswIndex),
    Ivf(IvfIndex),
    Lsh(LshIndex),
}

impl AnyIndex {
    /// Build an empty index for the configured strategy.
    pub fn from_config(config: &IndexConfig, dimension: usize) -> Self {
        match config.strategy {
            IndexKind::Flat => AnyIndex::Flat(FlatIndex::new()),
            IndexKind::Hnsw => AnyIndex::Hnsw(HnswIndex::new(
                config.hnsw.m,
                config.hnsw.ef_construction,
                config.hnsw.ef_search,
            )),
            IndexKind::Ivf => {
                AnyIndex::Ivf(IvfIndex::new(config.ivf.n_clusters, config.ivf.n_probe))
            }
            IndexKind::Lsh => AnyIndex::Lsh(LshIndex::new(
                dimension,
                config.lsh.n_tables,
                config.lsh.n_bits,
                config.lsh.seed,
            )),
        }
    }
}

impl VectorIndex for AnyIndex {
    fn add(&mut self, id: &str, vector: Vec<f32>) {
        match self {
            AnyIndex::Flat(index) => index.add(id, vector),
            AnyIndex::Hnsw(index) => index.add(id, vector),
            AnyIndex::Ivf(index) => index.add(id, vector),
            AnyIndex::Lsh(index) => index.add(id, vector),
        }
    }

    fn update(&mut self, id: &str, vector: Vec<f32>) {
        match self {
            AnyIndex::Flat(index) => index.update(id, vector),
            AnyIndex::Hnsw(index) => index.update(id, vector),
            AnyIndex::Ivf(index) => index.update(id, vector),
            AnyIndex::Lsh(index) => index.update(id, vector),
        }
    }

    fn remove(&mut self, id: &str) {
        match self {
            AnyIndex::Flat(index) => index.remove(id),
            AnyIndex::Hnsw(index) => index.remove(id),
            AnyIndex::Ivf(index) => index.remove(id),
            AnyIndex::Lsh(index) => index.remove(id),
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<String> {
        match self {
            AnyIndex::Flat(index) => index.search(query, k),
            AnyIndex::Hnsw(index) => index.search(query, k),
            AnyIndex::Ivf(index) => index.search(query, k),
            AnyIndex::Lsh(index) => index.search(query, k),
        }
    }

    fn len(&self) -> usize {
        match self {
            AnyIndex::Flat(index) => index.len(),
            AnyIndex::Hnsw(index) => index.len(),
            AnyIndex::Ivf(index) => index.len(),
            AnyIndex::Lsh(index) => index.len(),
        }
    }
}

/// Rank `(id, vector)` pairs by dot product against `query`, descending,
/// with the id as a deterministic tie-break, and keep the best `k`.
pub(crate) fn top_k_by_dot<'a, I>(pairs: I, query: &[f32], k: usize) -> Vec<String>
where
    I: Iterator<Item = (&'a String, &'a Vec<f32>)>,
{
    let mut scored: Vec<(f32, &'a String)> =
        pairs.map(|(id, v)| (dot(query, v), id)).collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    scored.into_iter().take(k).map(|(_, id)| id.clone()).collect()
}
