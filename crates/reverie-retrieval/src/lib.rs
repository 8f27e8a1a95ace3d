// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-signal memory retrieval for Reverie.
//!
//! This crate turns a natural-language query plus optional ambient context
//! (location, people, a time window) into a ranked list of memories. It
//! combines three signals:
//!
//! - **Semantic**: nearest neighbors from the [`reverie_store`] vector store,
//!   re-scored against the caller's context.
//! - **Temporal**: memories inside the context's time window, via the
//!   [`TemporalIndex`](reverie_core::traits::TemporalIndex) collaborator.
//! - **Relational**: memories linked to the query through the
//!   [`KnowledgeGraph`](reverie_core::traits::KnowledgeGraph) collaborator.
//!
//! The entry point is [`RetrievalOrchestrator::retrieve`]. Auxiliary signal
//! failures degrade the result instead of failing the call; only the query
//! embedding itself is load-bearing.

mod orchestrator;
mod scoring;

pub use orchestrator::{RetrievalOrchestrator, RetrievedMemory};
