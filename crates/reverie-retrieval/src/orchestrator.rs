// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The multi-signal retrieval pipeline.
//!
//! `retrieve` blends three candidate signals: semantic similarity from the
//! vector store, temporal relevance from a time-window collaborator, and
//! relational relevance from a knowledge-graph collaborator. Semantic
//! candidates pass a contextual gate first; the three lists are merged
//! with signal-membership scores and a final embedding rerank orders the
//! result. Auxiliary collaborator failures degrade to missing signals, a
//! failure embedding the query itself aborts the call.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use reverie_config::model::RetrievalConfig;
use reverie_core::traits::{EmbeddingProvider, KnowledgeGraph, TemporalIndex};
use reverie_core::{Memory, RetrievalContext, ReverieError};
use reverie_store::VectorStore;

use crate::scoring::{
    self, contextual_score, merge_candidates, CONTEXT_WINDOW, RECALL_THRESHOLD,
};

/// One retrieved memory with its final score (merge base plus rerank
/// similarity). Higher is more relevant.
#[derive(Debug, Clone)]
pub struct RetrievedMemory {
    pub memory: Memory,
    pub score: f64,
}

pub struct RetrievalOrchestrator {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    temporal: Arc<dyn TemporalIndex>,
    graph: Arc<dyn KnowledgeGraph>,
    config: RetrievalConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        temporal: Arc<dyn TemporalIndex>,
        graph: Arc<dyn KnowledgeGraph>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            temporal,
            graph,
            config,
        }
    }

    /// Retrieve the memories most relevant to `query` under the caller's
    /// ambient context. Returns at most a fixed context window of results
    /// (currently 10), best first; an empty result is normal, not an error.
    ///
    /// Errors mean the retrieval itself could not run (the query embedding
    /// or the store search failed). Callers augmenting a prompt should
    /// treat an error the same as no relevant memories and continue
    /// without augmentation.
    pub async fn retrieve(
        &self,
        query: &str,
        context: Option<&RetrievalContext>,
    ) -> Result<Vec<RetrievedMemory>, ReverieError> {
        let query_embedding = self.embedder.embed(query).await?;

        let hits = self
            .store
            .search(
                &query_embedding,
                self.config.semantic_candidates,
                RECALL_THRESHOLD,
            )
            .await?;

        // Stage one: contextual gate over the semantic candidates.
        let now = Utc::now();
        let mut semantic: Vec<Memory> = Vec::with_capacity(hits.len());
        for hit in hits {
            let memory = match Memory::from_metadata(&hit.id, &hit.metadata) {
                Ok(memory) => memory,
                Err(e) => {
                    warn!(id = %hit.id, error = %e, "dropping candidate with malformed metadata");
                    continue;
                }
            };
            let rescored = contextual_score(hit.similarity, &memory, context, now, &self.config);
            if rescored < self.config.retrieval_threshold {
                continue;
            }
            semantic.push(memory);
        }

        // Auxiliary signals; either one failing degrades to an empty list.
        let temporal = match context.and_then(|c| c.time_window) {
            Some(window) => match self.temporal.memories_in_window(&window).await {
                Ok(list) => list,
                Err(e) => {
                    warn!(error = %e, "temporal index unavailable, continuing without it");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let relational = match self.graph.related_memories(query).await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "knowledge graph unavailable, continuing without it");
                Vec::new()
            }
        };

        debug!(
            semantic = semantic.len(),
            temporal = temporal.len(),
            relational = relational.len(),
            "merging candidate signals"
        );
        let merged = merge_candidates(semantic, temporal, relational);

        // Stage two: embedding rerank. A candidate that cannot be embedded
        // is skipped, not fatal.
        let mut ranked: Vec<RetrievedMemory> = Vec::with_capacity(merged.len());
        for candidate in merged {
            let embedding = if candidate.memory.embedding.is_empty() {
                match self.embedder.embed(&candidate.memory.content).await {
                    Ok(vector) => vector,
                    Err(e) => {
                        warn!(id = %candidate.memory.id, error = %e, "skipping candidate that failed to embed");
                        continue;
                    }
                }
            } else {
                candidate.memory.embedding.clone()
            };
            if embedding.len() != query_embedding.len() {
                warn!(
                    id = %candidate.memory.id,
                    expected = query_embedding.len(),
                    actual = embedding.len(),
                    "skipping candidate with mismatched embedding"
                );
                continue;
            }
            let similarity = scoring::cosine(&query_embedding, &embedding);
            ranked.push(RetrievedMemory {
                memory: candidate.memory,
                score: candidate.score + similarity as f64,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.memory.timestamp.cmp(&a.memory.timestamp))
                .then_with(|| a.memory.content.cmp(&b.memory.content))
        });
        ranked.truncate(CONTEXT_WINDOW);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use reverie_config::model::ReverieConfig;
    use reverie_core::{GeoPoint, TimeWindow};
    use reverie_test_utils::{MockEmbedder, MockKnowledgeGraph, MockTemporalIndex};

    const DIM: usize = 16;

    fn memory(id: &str, content: &str) -> Memory {
        Memory {
            id: id.to_string(),
            content: content.to_string(),
            embedding: Vec::new(),
            timestamp: Utc::now(),
            location: None,
            people: Vec::new(),
            emotions: Vec::new(),
            tags: Vec::new(),
            importance: 0.5,
            source: "test".to_string(),
        }
    }

    async fn store_with(dir: &tempfile::TempDir) -> Arc<VectorStore> {
        let mut config = ReverieConfig::default();
        config.store.database_path = dir
            .path()
            .join("retrieval.db")
            .to_string_lossy()
            .into_owned();
        config.store.dimension = DIM;
        config.store.cache_capacity = 32;
        Arc::new(VectorStore::open(&config).await.unwrap())
    }

    async fn insert_memory(store: &VectorStore, embedder: &MockEmbedder, memory: &Memory) {
        let embedding = embedder.embed(&memory.content).await.unwrap();
        store
            .insert(&memory.id, &embedding, memory.to_metadata())
            .await
            .unwrap();
    }

    fn orchestrator(
        store: Arc<VectorStore>,
        embedder: Arc<MockEmbedder>,
        temporal: Arc<MockTemporalIndex>,
        graph: Arc<MockKnowledgeGraph>,
    ) -> RetrievalOrchestrator {
        RetrievalOrchestrator::new(
            store,
            embedder,
            temporal,
            graph,
            RetrievalConfig::default(),
        )
    }

    #[tokio::test]
    async fn semantic_match_is_retrieved_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));

        let coffee = memory("m-coffee", "coffee with dana at the harbor cafe");
        let budget = memory("m-budget", "quarterly budget spreadsheet review");
        insert_memory(&store, &embedder, &coffee).await;
        insert_memory(&store, &embedder, &budget).await;

        let orch = orchestrator(
            store,
            embedder,
            Arc::new(MockTemporalIndex::new()),
            Arc::new(MockKnowledgeGraph::new()),
        );
        let results = orch
            .retrieve("coffee with dana at the harbor cafe", None)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].memory.id, "m-coffee");
        // Exact content match: semantic base 1.0 plus rerank cosine of 1.0.
        assert!(results[0].score > 1.9);
    }

    #[tokio::test]
    async fn query_embedding_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let orch = orchestrator(
            store,
            Arc::new(MockEmbedder::failing(DIM)),
            Arc::new(MockTemporalIndex::new()),
            Arc::new(MockKnowledgeGraph::new()),
        );
        let err = orch.retrieve("anything", None).await.unwrap_err();
        assert!(matches!(err, ReverieError::Embedding { .. }));
    }

    #[tokio::test]
    async fn temporal_failure_degrades_to_semantic_results() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));
        let walk = memory("m-walk", "morning walk along the waterfront");
        insert_memory(&store, &embedder, &walk).await;

        let orch = orchestrator(
            store,
            embedder,
            Arc::new(MockTemporalIndex::failing()),
            Arc::new(MockKnowledgeGraph::new()),
        );
        let context = RetrievalContext {
            time_window: Some(TimeWindow {
                start: Utc::now() - Duration::days(1),
                end: Utc::now(),
            }),
            ..Default::default()
        };
        let results = orch
            .retrieve("morning walk along the waterfront", Some(&context))
            .await
            .unwrap();
        assert_eq!(results[0].memory.id, "m-walk");
    }

    #[tokio::test]
    async fn graph_failure_degrades_to_remaining_signals() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));
        let walk = memory("m-walk", "morning walk along the waterfront");
        insert_memory(&store, &embedder, &walk).await;

        let orch = orchestrator(
            store,
            embedder,
            Arc::new(MockTemporalIndex::new()),
            Arc::new(MockKnowledgeGraph::failing()),
        );
        let results = orch
            .retrieve("morning walk along the waterfront", None)
            .await
            .unwrap();
        assert_eq!(results[0].memory.id, "m-walk");
    }

    #[tokio::test]
    async fn temporal_only_candidates_enter_below_semantic() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));

        let semantic = memory("m-semantic", "coffee with dana at the cafe");
        insert_memory(&store, &embedder, &semantic).await;

        // Not in the store at all, only known to the temporal index.
        let mut window_only = memory("m-window", "dentist appointment downtown");
        window_only.timestamp = Utc::now() - Duration::hours(2);

        let temporal = Arc::new(MockTemporalIndex::with_memories(vec![window_only]));
        let orch = orchestrator(store, embedder, temporal, Arc::new(MockKnowledgeGraph::new()));

        let context = RetrievalContext {
            time_window: Some(TimeWindow {
                start: Utc::now() - Duration::days(1),
                end: Utc::now(),
            }),
            ..Default::default()
        };
        let results = orch
            .retrieve("coffee with dana at the cafe", Some(&context))
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert!(ids.contains(&"m-semantic"));
        assert!(ids.contains(&"m-window"));
        let pos_semantic = ids.iter().position(|&i| i == "m-semantic").unwrap();
        let pos_window = ids.iter().position(|&i| i == "m-window").unwrap();
        assert!(pos_semantic < pos_window);
    }

    #[tokio::test]
    async fn presence_in_temporal_list_lifts_a_semantic_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));

        // Two equally similar memories; only one is in the time window.
        let boosted = memory("m-boosted", "lunch at the noodle bar");
        let plain = memory("m-plain", "lunch at the noodle bar");
        insert_memory(&store, &embedder, &boosted).await;
        insert_memory(&store, &embedder, &plain).await;

        let temporal = Arc::new(MockTemporalIndex::with_memories(vec![boosted.clone()]));
        let orch = orchestrator(store, embedder, temporal, Arc::new(MockKnowledgeGraph::new()));

        let context = RetrievalContext {
            time_window: Some(TimeWindow {
                start: Utc::now() - Duration::days(1),
                end: Utc::now(),
            }),
            ..Default::default()
        };
        let results = orch
            .retrieve("lunch at the noodle bar", Some(&context))
            .await
            .unwrap();
        assert_eq!(results[0].memory.id, "m-boosted");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn results_are_capped_at_the_context_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));

        for i in 0..15 {
            let m = memory(&format!("m-{i}"), "evening run around the park");
            insert_memory(&store, &embedder, &m).await;
        }
        let orch = orchestrator(
            store,
            embedder,
            Arc::new(MockTemporalIndex::new()),
            Arc::new(MockKnowledgeGraph::new()),
        );
        let results = orch
            .retrieve("evening run around the park", None)
            .await
            .unwrap();
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn candidate_that_fails_to_embed_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));

        let good = memory("m-good", "picnic by the river");
        insert_memory(&store, &embedder, &good).await;

        // Relational candidate whose content cannot be embedded.
        let broken = memory("m-broken", "corrupted poisoned content");
        embedder.fail_on("corrupted poisoned content").await;
        let graph = Arc::new(MockKnowledgeGraph::new());
        graph.relate("picnic", vec![broken]).await;

        let orch = orchestrator(store, embedder, Arc::new(MockTemporalIndex::new()), graph);
        let results = orch.retrieve("picnic by the river", None).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert!(ids.contains(&"m-good"));
        assert!(!ids.contains(&"m-broken"));
    }

    #[tokio::test]
    async fn location_context_gates_weak_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir).await;
        let embedder = Arc::new(MockEmbedder::new(DIM));

        // Pinned vectors give an exact, weak similarity to the query.
        embedder.pin("query text", unit_on(0)).await;
        // Old enough that the recency boost is the minimum 0.05; similarity
        // 0.28 + 0.05 misses the 0.35 gate without the proximity boost.
        let mut weak_near = memory("m-near", "weak near");
        weak_near.timestamp = Utc::now() - Duration::days(400);
        weak_near.location = Some(GeoPoint { latitude: 47.60, longitude: -122.33 });
        let mut weak_far = memory("m-far", "weak far");
        weak_far.timestamp = Utc::now() - Duration::days(400);
        weak_far.location = Some(GeoPoint { latitude: 40.71, longitude: -74.00 });
        embedder.pin("weak near", mixed(0.28)).await;
        embedder.pin("weak far", mixed(0.28)).await;

        insert_memory(&store, &embedder, &weak_near).await;
        insert_memory(&store, &embedder, &weak_far).await;

        let orch = orchestrator(
            store,
            embedder,
            Arc::new(MockTemporalIndex::new()),
            Arc::new(MockKnowledgeGraph::new()),
        );
        let context = RetrievalContext {
            location: Some(GeoPoint { latitude: 47.61, longitude: -122.33 }),
            ..Default::default()
        };
        let results = orch.retrieve("query text", Some(&context)).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert!(ids.contains(&"m-near"), "proximity boost should rescue m-near");
        assert!(!ids.contains(&"m-far"), "m-far has no boost and must be gated");
    }

    fn unit_on(axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        v[axis] = 1.0;
        v
    }

    /// A unit vector whose dot product with `unit_on(0)` is exactly `sim`.
    fn mixed(sim: f32) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        v[0] = sim;
        v[1] = (1.0 - sim * sim).sqrt();
        v
    }
}
