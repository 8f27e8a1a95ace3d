// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge graph trait for entity-relation candidate lookup.

use async_trait::async_trait;

use crate::error::ReverieError;
use crate::memory::Memory;

/// Collaborator that resolves a query to memories connected through shared
/// entities (people, places, topics).
///
/// Like the temporal index, a failing graph lookup degrades retrieval to
/// the remaining signals instead of aborting it.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Returns memories related to the query through graph edges.
    async fn related_memories(&self, query: &str) -> Result<Vec<Memory>, ReverieError>;
}
