// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding provider for deterministic testing.
//!
//! `MockEmbedder` implements `EmbeddingProvider` without a model: text is
//! embedded as a hashed bag of words, so equal texts embed equally and
//! texts sharing vocabulary land near each other.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use reverie_core::traits::EmbeddingProvider;
use reverie_core::vector::normalize;
use reverie_core::ReverieError;

/// A mock embedding provider with deterministic output.
///
/// Each whitespace token increments one dimension chosen by its hash and
/// the result is unit-normalized. Individual texts can be pinned to exact
/// vectors when a test needs precise similarities, and the provider can be
/// constructed failing to exercise degraded retrieval paths.
pub struct MockEmbedder {
    dimension: usize,
    pinned: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    poisoned: Arc<Mutex<HashSet<String>>>,
    fail: bool,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            pinned: Arc::new(Mutex::new(HashMap::new())),
            poisoned: Arc::new(Mutex::new(HashSet::new())),
            fail: false,
        }
    }

    /// A provider whose every `embed` call fails.
    pub fn failing(dimension: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dimension)
        }
    }

    /// Pin an exact vector for one text, bypassing the hashed embedding.
    pub async fn pin(&self, text: &str, vector: Vec<f32>) {
        self.pinned.lock().await.insert(text.to_string(), vector);
    }

    /// Make `embed` fail for one exact text while other texts keep working.
    pub async fn fail_on(&self, text: &str) {
        self.poisoned.lock().await.insert(text.to_string());
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimension;
            v[bucket] += 1.0;
        }
        normalize(&v).0
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ReverieError> {
        if self.fail || self.poisoned.lock().await.contains(text) {
            return Err(ReverieError::Embedding {
                message: "mock embedder configured to fail".to_string(),
            });
        }
        if let Some(vector) = self.pinned.lock().await.get(text) {
            return Ok(vector.clone());
        }
        Ok(self.hashed(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
