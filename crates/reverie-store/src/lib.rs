// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable embedding store with pluggable nearest-neighbor search.
//!
//! Records are `(id, embedding, metadata)` triples persisted in SQLite.
//! An in-memory index (brute-force, small-world graph, inverted file, or
//! locality-sensitive hashing) serves candidate lookups, an LRU cache
//! keeps hot vectors off the database, and the query pipeline reranks
//! candidates exactly before returning them.
//!
//! ```no_run
//! use reverie_config::model::ReverieConfig;
//! use reverie_store::VectorStore;
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), reverie_core::ReverieError> {
//! let config = ReverieConfig::default();
//! let store = VectorStore::open(&config).await?;
//! store.insert("m1", &vec![0.1; 384], json!({"content": "tea"})).await?;
//! let hits = store.search(&vec![0.1; 384], 5, 0.25).await?;
//! assert!(hits.len() <= 5);
//! # Ok(())
//! # }
//! ```

mod cache;
mod codec;
mod database;
mod migrations;
mod queries;
mod query;
mod store;

pub mod index;

pub use query::SearchHit;
pub use store::{RecordSummary, VectorStore};
