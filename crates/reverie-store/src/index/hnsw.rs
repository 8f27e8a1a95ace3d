// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical navigable small-world graph index.
//!
//! Nodes live on a stack of layers. Each node is assigned a top layer by a
//! geometric-like random draw, every layer holds a neighbor list capped at
//! `m`, and search descends greedily from the sparse top layers before
//! running a beam of width `ef` over layer zero. Similarity is the dot
//! product, which equals cosine because the store only feeds unit vectors.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reverie_core::vector::dot;

use super::VectorIndex;

/// Hard cap on sampled layers so a degenerate draw cannot build a tower of
/// near-empty layers.
const MAX_LAYER: usize = 16;

/// Fixed seed for the layer draw. Rebuilding an index from the same insert
/// sequence yields the same graph.
const LAYER_RNG_SEED: u64 = 42;

struct Node {
    vector: Vec<f32>,
    /// Neighbor ids per layer, index 0 is the base layer.
    layers: Vec<Vec<String>>,
}

impl Node {
    fn top_layer(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }
}

/// Candidate with a total order: higher similarity wins, ties resolve to
/// the lexicographically smaller id so traversal stays deterministic.
#[derive(Clone)]
struct Scored {
    sim: f32,
    id: String,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sim
            .partial_cmp(&other.sim)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

pub struct HnswIndex {
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    /// 1 / ln(m), the normalization factor of the layer distribution.
    level_norm: f64,
    nodes: HashMap<String, Node>,
    entry: Option<String>,
    rng: StdRng,
}

impl HnswIndex {
    pub fn new(m: usize, ef_construction: usize, ef_search: usize) -> Self {
        let m = m.max(2);
        Self {
            m,
            ef_construction: ef_construction.max(1),
            ef_search: ef_search.max(1),
            level_norm: 1.0 / (m as f64).ln(),
            nodes: HashMap::new(),
            entry: None,
            rng: StdRng::seed_from_u64(LAYER_RNG_SEED),
        }
    }

    fn random_level(&mut self) -> usize {
        // Inverse-CDF draw; 1 - u keeps the argument of ln strictly positive.
        let u: f64 = 1.0 - self.rng.gen_range(0.0..1.0);
        let level = (-u.ln() * self.level_norm).floor() as usize;
        level.min(MAX_LAYER)
    }

    /// Beam search restricted to one layer. Returns up to `ef` candidates
    /// ordered best-first.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[String],
        ef: usize,
        layer: usize,
    ) -> Vec<Scored> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: BinaryHeap<Scored> = BinaryHeap::new();
        let mut found: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();

        for id in entry_points {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                let scored = Scored {
                    sim: dot(query, &node.vector),
                    id: id.clone(),
                };
                frontier.push(scored.clone());
                found.push(Reverse(scored));
            }
        }

        while let Some(current) = frontier.pop() {
            let worst = found
                .peek()
                .map(|r| r.0.sim)
                .unwrap_or(f32::NEG_INFINITY);
            if found.len() >= ef && current.sim < worst {
                break;
            }
            let Some(node) = self.nodes.get(&current.id) else {
                continue;
            };
            let Some(neighbors) = node.layers.get(layer) else {
                continue;
            };
            for neighbor_id in neighbors {
                if !visited.insert(neighbor_id.clone()) {
                    continue;
                }
                let Some(neighbor) = self.nodes.get(neighbor_id) else {
                    continue;
                };
                let scored = Scored {
                    sim: dot(query, &neighbor.vector),
                    id: neighbor_id.clone(),
                };
                let worst = found
                    .peek()
                    .map(|r| r.0.sim)
                    .unwrap_or(f32::NEG_INFINITY);
                if found.len() < ef || scored.sim > worst {
                    frontier.push(scored.clone());
                    found.push(Reverse(scored));
                    if found.len() > ef {
                        found.pop();
                    }
                }
            }
        }

        let mut out: Vec<Scored> = found.into_iter().map(|r| r.0).collect();
        out.sort_by(|a, b| b.cmp(a));
        out
    }

    /// Greedy single-path descent from the entry point down to `target + 1`,
    /// returning the best entry point for the layer below.
    fn descend(&self, query: &[f32], entry_id: &str, from: usize, target: usize) -> Vec<String> {
        let mut current = vec![entry_id.to_string()];
        let mut layer = from;
        while layer > target {
            let found = self.search_layer(query, &current, 1, layer);
            if let Some(best) = found.first() {
                current = vec![best.id.clone()];
            }
            layer -= 1;
        }
        current
    }

    /// Re-link one node's neighbor list at `layer` to contain `candidate`
    /// and at most `m` entries, keeping the closest by dot product.
    fn link_back(&mut self, node_id: &str, layer: usize, candidate: &str) {
        let pruned: Vec<String> = {
            let Some(node) = self.nodes.get(node_id) else {
                return;
            };
            let Some(list) = node.layers.get(layer) else {
                return;
            };
            let mut list = list.clone();
            if !list.iter().any(|x| x.as_str() == candidate) {
                list.push(candidate.to_string());
            }
            if list.len() <= self.m {
                list
            } else {
                let base = node.vector.clone();
                let mut scored: Vec<(f32, String)> = list
                    .into_iter()
                    .filter_map(|other| {
                        self.nodes
                            .get(&other)
                            .map(|n| (dot(&base, &n.vector), other))
                    })
                    .collect();
                scored.sort_by(|a, b| {
                    b.0.partial_cmp(&a.0)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.1.cmp(&b.1))
                });
                scored.truncate(self.m);
                scored.into_iter().map(|(_, other)| other).collect()
            }
        };
        if let Some(node) = self.nodes.get_mut(node_id) {
            if let Some(slot) = node.layers.get_mut(layer) {
                *slot = pruned;
            }
        }
    }

    #[cfg(test)]
    fn entry_id(&self) -> Option<&str> {
        self.entry.as_deref()
    }
}

impl VectorIndex for HnswIndex {
    fn add(&mut self, id: &str, vector: Vec<f32>) {
        if self.nodes.contains_key(id) {
            self.remove(id);
        }
        let level = self.random_level();
        let node = Node {
            vector: vector.clone(),
            layers: vec![Vec::new(); level + 1],
        };

        let Some(entry_id) = self.entry.clone() else {
            self.nodes.insert(id.to_string(), node);
            self.entry = Some(id.to_string());
            return;
        };
        let top = self
            .nodes
            .get(&entry_id)
            .map(Node::top_layer)
            .unwrap_or(0);

        // Greedy descent through the layers above the node's own top.
        let mut current = if level < top {
            self.descend(&vector, &entry_id, top, level)
        } else {
            vec![entry_id]
        };

        // Collect the link targets per shared layer before touching the map.
        let mut links: Vec<(usize, Vec<String>)> = Vec::new();
        for layer in (0..=level.min(top)).rev() {
            let found = self.search_layer(&vector, &current, self.ef_construction, layer);
            let chosen: Vec<String> = found.iter().take(self.m).map(|s| s.id.clone()).collect();
            if !found.is_empty() {
                current = found.iter().map(|s| s.id.clone()).collect();
            }
            links.push((layer, chosen));
        }

        self.nodes.insert(id.to_string(), node);
        for (layer, chosen) in links {
            if let Some(node) = self.nodes.get_mut(id) {
                if let Some(slot) = node.layers.get_mut(layer) {
                    *slot = chosen.clone();
                }
            }
            for neighbor_id in &chosen {
                self.link_back(neighbor_id, layer, id);
            }
        }

        if level > top {
            self.entry = Some(id.to_string());
        }
    }

    fn update(&mut self, id: &str, vector: Vec<f32>) {
        self.remove(id);
        self.add(id, vector);
    }

    fn remove(&mut self, id: &str) {
        if self.nodes.remove(id).is_none() {
            return;
        }
        for node in self.nodes.values_mut() {
            for list in &mut node.layers {
                list.retain(|other| other.as_str() != id);
            }
        }
        if self.entry.as_deref() == Some(id) {
            // Promote the highest remaining node, smallest id on ties.
            self.entry = self
                .nodes
                .iter()
                .max_by(|(a_id, a), (b_id, b)| {
                    a.layers
                        .len()
                        .cmp(&b.layers.len())
                        .then_with(|| b_id.cmp(a_id))
                })
                .map(|(node_id, _)| node_id.clone());
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<String> {
        if k == 0 {
            return Vec::new();
        }
        let Some(entry_id) = self.entry.clone() else {
            return Vec::new();
        };
        let top = self
            .nodes
            .get(&entry_id)
            .map(Node::top_layer)
            .unwrap_or(0);
        let current = self.descend(query, &entry_id, top, 0);
        let ef = self.ef_search.max(k);
        self.search_layer(query, &current, ef, 0)
            .into_iter()
            .take(k)
            .map(|s| s.id)
            .collect()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
