// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock knowledge graph keyed by query substrings.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use reverie_core::traits::KnowledgeGraph;
use reverie_core::{Memory, ReverieError};

/// A knowledge graph that relates queries to memories by substring match.
///
/// `relate("dana", ...)` makes those memories surface for any query that
/// mentions dana. Keys are matched case-insensitively; results follow key
/// order so lookups stay deterministic.
pub struct MockKnowledgeGraph {
    relations: Arc<Mutex<BTreeMap<String, Vec<Memory>>>>,
    fail: bool,
}

impl MockKnowledgeGraph {
    pub fn new() -> Self {
        Self {
            relations: Arc::new(Mutex::new(BTreeMap::new())),
            fail: false,
        }
    }

    /// A graph whose every lookup fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub async fn relate(&self, key: &str, memories: Vec<Memory>) {
        self.relations
            .lock()
            .await
            .insert(key.to_lowercase(), memories);
    }
}

impl Default for MockKnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeGraph for MockKnowledgeGraph {
    async fn related_memories(&self, query: &str) -> Result<Vec<Memory>, ReverieError> {
        if self.fail {
            return Err(ReverieError::Internal(
                "mock knowledge graph configured to fail".to_string(),
            ));
        }
        let query = query.to_lowercase();
        let relations = self.relations.lock().await;
        let mut out = Vec::new();
        for (key, memories) in relations.iter() {
            if query.contains(key.as_str()) {
                out.extend(memories.iter().cloned());
            }
        }
        Ok(out)
    }
}
