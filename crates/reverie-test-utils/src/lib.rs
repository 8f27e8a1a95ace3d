// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Reverie integration tests.
//!
//! Provides deterministic mock collaborators so retrieval tests run fast
//! and without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Hash-based embedding provider with pinnable vectors
//! - [`MockTemporalIndex`] - Temporal index over a fixed memory list
//! - [`MockKnowledgeGraph`] - Knowledge graph keyed by query substrings

pub mod mock_embedder;
pub mod mock_graph;
pub mod mock_temporal;

pub use mock_embedder::MockEmbedder;
pub use mock_graph::MockKnowledgeGraph;
pub use mock_temporal::MockTemporalIndex;
