// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Reverie memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Reverie configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReverieConfig {
    /// Durable store settings (database path, dimension, cache).
    #[serde(default)]
    pub store: StoreConfig,

    /// Index strategy selection and per-strategy parameters.
    #[serde(default)]
    pub index: IndexConfig,

    /// Retrieval orchestrator settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Embedding dimension `D`. Fixed for the lifetime of a database file;
    /// reopening with a different value is a configuration error.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Capacity of the LRU vector cache. Zero disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            dimension: default_dimension(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("reverie").join("reverie.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("reverie.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_dimension() -> usize {
    384
}

fn default_cache_capacity() -> usize {
    1024
}

/// Which approximate-nearest-neighbor structure serves candidate lookups.
///
/// Selected once when a store is opened; the recall/latency/memory trade-off
/// is the caller's choice at construction time, not the query path's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact brute-force scan. Correctness baseline.
    Flat,
    /// Hierarchical navigable small-world graph.
    Hnsw,
    /// Inverted file over k-means clusters.
    Ivf,
    /// Locality-sensitive hashing over random hyperplanes.
    Lsh,
}

impl IndexKind {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Flat => "flat",
            IndexKind::Hnsw => "hnsw",
            IndexKind::Ivf => "ivf",
            IndexKind::Lsh => "lsh",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "hnsw" => IndexKind::Hnsw,
            "ivf" => IndexKind::Ivf,
            "lsh" => IndexKind::Lsh,
            _ => IndexKind::Flat,
        }
    }
}

/// Index strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Active strategy: "flat", "hnsw", "ivf", or "lsh".
    #[serde(default = "default_strategy")]
    pub strategy: IndexKind,

    /// Parameters for the graph-based strategy.
    #[serde(default)]
    pub hnsw: HnswParams,

    /// Parameters for the clustered strategy.
    #[serde(default)]
    pub ivf: IvfParams,

    /// Parameters for the hash-based strategy.
    #[serde(default)]
    pub lsh: LshParams,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            hnsw: HnswParams::default(),
            ivf: IvfParams::default(),
            lsh: LshParams::default(),
        }
    }
}

fn default_strategy() -> IndexKind {
    IndexKind::Flat
}

/// Graph-based (HNSW) strategy parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HnswParams {
    /// Neighbors kept per node per layer. Must be at least 2.
    #[serde(default = "default_hnsw_m")]
    pub m: usize,

    /// Beam width during insertion.
    #[serde(default = "default_hnsw_ef_construction")]
    pub ef_construction: usize,

    /// Beam width at the bottom layer during search.
    #[serde(default = "default_hnsw_ef_search")]
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: default_hnsw_m(),
            ef_construction: default_hnsw_ef_construction(),
            ef_search: default_hnsw_ef_search(),
        }
    }
}

fn default_hnsw_m() -> usize {
    16
}

fn default_hnsw_ef_construction() -> usize {
    100
}

fn default_hnsw_ef_search() -> usize {
    50
}

/// Clustered (inverted-file) strategy parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IvfParams {
    /// Number of k-means centroids.
    #[serde(default = "default_ivf_n_clusters")]
    pub n_clusters: usize,

    /// Number of nearest clusters probed per query.
    #[serde(default = "default_ivf_n_probe")]
    pub n_probe: usize,
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            n_clusters: default_ivf_n_clusters(),
            n_probe: default_ivf_n_probe(),
        }
    }
}

fn default_ivf_n_clusters() -> usize {
    16
}

fn default_ivf_n_probe() -> usize {
    3
}

/// Hash-based (LSH) strategy parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LshParams {
    /// Number of independent hash tables.
    #[serde(default = "default_lsh_n_tables")]
    pub n_tables: usize,

    /// Hyperplanes (code bits) per table. Must be between 1 and 32.
    #[serde(default = "default_lsh_n_bits")]
    pub n_bits: usize,

    /// RNG seed for hyperplane generation, so an instance's tables are
    /// reproducible across reopen.
    #[serde(default = "default_lsh_seed")]
    pub seed: u64,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            n_tables: default_lsh_n_tables(),
            n_bits: default_lsh_n_bits(),
            seed: default_lsh_seed(),
        }
    }
}

fn default_lsh_n_tables() -> usize {
    8
}

fn default_lsh_n_bits() -> usize {
    12
}

fn default_lsh_seed() -> u64 {
    42
}

/// Retrieval orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Minimum re-scored value for a semantic candidate to survive
    /// contextual filtering (0.0-1.0 scale before boosts).
    #[serde(default = "default_retrieval_threshold")]
    pub retrieval_threshold: f64,

    /// Maximum number of semantic candidates requested from the query
    /// engine before merging.
    #[serde(default = "default_semantic_candidates")]
    pub semantic_candidates: usize,

    /// Radius in meters within which a candidate's location earns the
    /// proximity boost.
    #[serde(default = "default_location_radius_m")]
    pub location_radius_m: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retrieval_threshold: default_retrieval_threshold(),
            semantic_candidates: default_semantic_candidates(),
            location_radius_m: default_location_radius_m(),
        }
    }
}

fn default_retrieval_threshold() -> f64 {
    0.35
}

fn default_semantic_candidates() -> usize {
    50
}

fn default_location_radius_m() -> f64 {
    5_000.0
}
