// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the retrieval pipeline.
//!
//! All collaborators use `#[async_trait]` for dynamic dispatch
//! compatibility, so callers can hold them as trait objects.

pub mod embedding;
pub mod graph;
pub mod temporal;

// Re-export all traits at the traits module level for convenience.
pub use embedding::EmbeddingProvider;
pub use graph::KnowledgeGraph;
pub use temporal::TemporalIndex;
