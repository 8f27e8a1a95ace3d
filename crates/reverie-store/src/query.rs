// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The similarity query pipeline: probe the index for candidates, restore
//! their vectors cache-first, rerank exactly, filter by threshold, attach
//! metadata, and return the top k.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tracing::trace;

use crate::cache::{self, VectorCache};
use crate::database::Database;
use crate::index::{AnyIndex, VectorIndex};
use crate::queries;
use reverie_core::vector::{dot, normalize};
use reverie_core::ReverieError;

/// Over-fetch factor for the index probe, headroom for candidates the
/// exact rerank or the threshold will drop.
const OVERFETCH: usize = 2;

/// One search result. Similarity is the exact cosine of the stored vector
/// and the query, not the index's approximation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub similarity: f32,
    pub metadata: Value,
}

fn search_failed(e: ReverieError) -> ReverieError {
    ReverieError::SearchFailed {
        message: e.to_string(),
    }
}

pub(crate) async fn execute(
    db: &Database,
    index: &AnyIndex,
    cache: &Mutex<VectorCache>,
    dimension: usize,
    query: &[f32],
    k: usize,
    threshold: f32,
) -> Result<Vec<SearchHit>, ReverieError> {
    if query.len() != dimension {
        return Err(ReverieError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    let (unit, _) = normalize(query);

    let candidates = index.search(&unit, k.saturating_mul(OVERFETCH));
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // Cache-first vector fetch; misses go to the store in one batch and
    // are written back so repeat queries stay warm.
    let mut vectors: Vec<(String, Vec<f32>)> = Vec::with_capacity(candidates.len());
    let mut misses: Vec<String> = Vec::new();
    {
        let mut cache = cache::lock(cache);
        for id in &candidates {
            match cache.get(id) {
                Some(vector) => vectors.push((id.clone(), vector)),
                None => misses.push(id.clone()),
            }
        }
    }
    if !misses.is_empty() {
        let fetched = queries::vectors::embeddings_by_ids(db, &misses)
            .await
            .map_err(search_failed)?;
        let mut cache = cache::lock(cache);
        for (id, vector) in &fetched {
            cache.insert(id, vector.clone());
        }
        drop(cache);
        vectors.extend(fetched);
    }
    trace!(
        candidates = candidates.len(),
        misses = misses.len(),
        "candidate vectors restored"
    );

    // Exact rerank over unit vectors; dot equals cosine here.
    let scored: Vec<(String, f32)> = vectors
        .into_iter()
        .map(|(id, vector)| {
            let sim = dot(&unit, &vector);
            (id, sim)
        })
        .filter(|(_, sim)| *sim >= threshold)
        .collect();
    if scored.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = scored.iter().map(|(id, _)| id.clone()).collect();
    let rows = queries::vectors::metadata_rows_by_ids(db, &ids)
        .await
        .map_err(search_failed)?;
    let mut docs: HashMap<String, (Value, String)> = HashMap::with_capacity(rows.len());
    for (id, text, updated_at) in rows {
        let doc: Value = serde_json::from_str(&text).map_err(|e| ReverieError::SearchFailed {
            message: format!("metadata for {id} is not valid JSON: {e}"),
        })?;
        docs.insert(id, (doc, updated_at));
    }

    let mut hits: Vec<(SearchHit, String)> = scored
        .into_iter()
        .filter_map(|(id, similarity)| {
            docs.remove(&id).map(|(metadata, updated_at)| {
                (
                    SearchHit {
                        id,
                        similarity,
                        metadata,
                    },
                    updated_at,
                )
            })
        })
        .collect();

    // Order: similarity, then recency, then id for a stable total order.
    hits.sort_by(|a, b| {
        b.0.similarity
            .partial_cmp(&a.0.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| a.0.id.cmp(&b.0.id))
    });
    hits.truncate(k);
    Ok(hits.into_iter().map(|(hit, _)| hit).collect())
}
