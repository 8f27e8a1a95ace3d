// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock temporal index backed by an in-memory list.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use reverie_core::traits::TemporalIndex;
use reverie_core::{Memory, ReverieError, TimeWindow};

/// A temporal index over a fixed list of memories.
///
/// `memories_in_window` filters the list by timestamp. The failing variant
/// errors on every call, for tests covering degraded retrieval.
pub struct MockTemporalIndex {
    memories: Arc<Mutex<Vec<Memory>>>,
    fail: bool,
}

impl MockTemporalIndex {
    pub fn new() -> Self {
        Self {
            memories: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn with_memories(memories: Vec<Memory>) -> Self {
        Self {
            memories: Arc::new(Mutex::new(memories)),
            fail: false,
        }
    }

    /// An index whose every lookup fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub async fn add(&self, memory: Memory) {
        self.memories.lock().await.push(memory);
    }
}

impl Default for MockTemporalIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemporalIndex for MockTemporalIndex {
    async fn memories_in_window(&self, window: &TimeWindow) -> Result<Vec<Memory>, ReverieError> {
        if self.fail {
            return Err(ReverieError::Internal(
                "mock temporal index configured to fail".to_string(),
            ));
        }
        Ok(self
            .memories
            .lock()
            .await
            .iter()
            .filter(|m| window.contains(m.timestamp))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn memory_at(id: &str, year: i32, month: u32, day: u32) -> Memory {
        Memory {
            id: id.to_string(),
            content: format!("memory {id}"),
            embedding: Vec::new(),
            timestamp: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
            location: None,
            people: Vec::new(),
            emotions: Vec::new(),
            tags: Vec::new(),
            importance: 0.5,
            source: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn window_filters_by_timestamp() {
        let index = MockTemporalIndex::with_memories(vec![
            memory_at("jan", 2026, 1, 15),
            memory_at("feb", 2026, 2, 15),
            memory_at("mar", 2026, 3, 15),
        ]);
        let window = TimeWindow {
            start: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap(),
        };
        let found = index.memories_in_window(&window).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "feb");
    }

    #[tokio::test]
    async fn failing_index_errors() {
        let index = MockTemporalIndex::failing();
        let window = TimeWindow {
            start: Utc::now(),
            end: Utc::now(),
        };
        assert!(index.memories_in_window(&window).await.is_err());
    }
}
