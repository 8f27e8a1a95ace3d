// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Reverie memory engine.
//!
//! This crate provides the error type, the memory domain types, the vector
//! math helpers, and the collaborator traits used throughout the Reverie
//! workspace. The store and retrieval crates build on top of it.

pub mod error;
pub mod memory;
pub mod traits;
pub mod vector;

// Re-export key items at crate root for ergonomic imports.
pub use error::ReverieError;
pub use memory::{GeoPoint, Memory, RetrievalContext, TimeWindow};

// Re-export all collaborator traits at crate root.
pub use traits::{EmbeddingProvider, KnowledgeGraph, TemporalIndex};
