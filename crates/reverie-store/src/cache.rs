// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded LRU cache for hot vectors.
//!
//! A read-through accelerator in front of the vectors table, never a source
//! of truth: the store refreshes or drops an entry inside the same write
//! guard that mutates the row, so a hit always equals the stored value.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Lock the cache, recovering the inner state if a holder panicked.
pub(crate) fn lock(cache: &Mutex<VectorCache>) -> MutexGuard<'_, VectorCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct CacheSlot {
    vector: Vec<f32>,
    stamp: u64,
}

/// Strict least-recently-used vector cache keyed by record id.
///
/// Recency is tracked with a monotonically increasing stamp per access; the
/// `order` map yields the lowest (oldest) stamp first, which is the next
/// eviction victim. Capacity 0 disables caching entirely.
pub struct VectorCache {
    capacity: usize,
    next_stamp: u64,
    entries: HashMap<String, CacheSlot>,
    order: BTreeMap<u64, String>,
}

impl VectorCache {
    /// Create a cache holding at most `capacity` vectors.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_stamp: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    /// Look up a vector, promoting the entry to most-recently-used on a hit.
    pub fn get(&mut self, id: &str) -> Option<Vec<f32>> {
        let stamp = self.bump();
        let slot = self.entries.get_mut(id)?;
        self.order.remove(&slot.stamp);
        slot.stamp = stamp;
        self.order.insert(stamp, id.to_string());
        Some(slot.vector.clone())
    }

    /// Insert or overwrite a vector and promote it, evicting the
    /// least-recently-used entries until back under capacity.
    pub fn insert(&mut self, id: &str, vector: Vec<f32>) {
        if self.capacity == 0 {
            return;
        }
        let stamp = self.bump();
        if let Some(slot) = self.entries.get_mut(id) {
            self.order.remove(&slot.stamp);
            slot.vector = vector;
            slot.stamp = stamp;
        } else {
            self.entries.insert(id.to_string(), CacheSlot { vector, stamp });
        }
        self.order.insert(stamp, id.to_string());

        while self.entries.len() > self.capacity {
            if let Some((_, victim)) = self.order.pop_first() {
                self.entries.remove(&victim);
            } else {
                break;
            }
        }
    }

    /// Drop a single entry if present.
    pub fn remove(&mut self, id: &str) {
        if let Some(slot) = self.entries.remove(id) {
            self.order.remove(&slot.stamp);
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-promoting presence check, for tests and diagnostics.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    fn bump(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_inserted_vector() {
        let mut cache = VectorCache::new(4);
        cache.insert("a", vec![1.0, 2.0]);
        assert_eq!(cache.get("a"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn filling_past_capacity_evicts_first_inserted() {
        let capacity = 3;
        let mut cache = VectorCache::new(capacity);
        for i in 0..=capacity {
            cache.insert(&format!("id-{i}"), vec![i as f32]);
        }
        // No intervening gets: the first-inserted id is the LRU victim.
        assert!(!cache.contains("id-0"));
        for i in 1..=capacity {
            assert!(cache.contains(&format!("id-{i}")));
        }
        assert_eq!(cache.len(), capacity);
    }

    #[test]
    fn get_promotes_entry_out_of_eviction_order() {
        let mut cache = VectorCache::new(2);
        cache.insert("a", vec![1.0]);
        cache.insert("b", vec![2.0]);
        // Touch "a" so "b" becomes the oldest.
        cache.get("a");
        cache.insert("c", vec![3.0]);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn overwrite_promotes_and_replaces_value() {
        let mut cache = VectorCache::new(2);
        cache.insert("a", vec![1.0]);
        cache.insert("b", vec![2.0]);
        cache.insert("a", vec![9.0]);
        cache.insert("c", vec![3.0]);
        // "b" was oldest after "a" was re-inserted.
        assert!(!cache.contains("b"));
        assert_eq!(cache.get("a"), Some(vec![9.0]));
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = VectorCache::new(4);
        cache.insert("a", vec![1.0]);
        cache.insert("b", vec![2.0]);
        cache.remove("a");
        assert!(!cache.contains("a"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = VectorCache::new(0);
        cache.insert("a", vec![1.0]);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
