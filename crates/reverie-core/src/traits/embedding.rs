// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait for vector generation.

use async_trait::async_trait;

use crate::error::ReverieError;

/// Collaborator that converts text into fixed-length embedding vectors.
///
/// The retrieval pipeline embeds both queries and candidate memories
/// through this trait; every vector it produces must have the same
/// dimensionality as [`dimension`](EmbeddingProvider::dimension).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generates an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ReverieError>;

    /// The dimensionality of vectors produced by this provider.
    fn dimension(&self) -> usize;
}
