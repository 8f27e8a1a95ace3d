// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring rules for the two retrieval stages.
//!
//! Stage one gates semantic candidates: the raw similarity is re-scored
//! with contextual boosts (proximity, shared people, recency) and anything
//! below the retrieval threshold is dropped. Stage two assigns the merge
//! score: fixed bases by signal membership plus additive boosts for
//! candidates present in more than one signal. The fine-grained ordering
//! within a base comes from the rerank pass, not from here.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use reverie_config::model::RetrievalConfig;
use reverie_core::{Memory, RetrievalContext};

/// Recall floor for the first-stage semantic search. Deliberately loose;
/// the contextual gate and the rerank tighten the set afterwards.
pub(crate) const RECALL_THRESHOLD: f32 = 0.25;

/// Merge base for candidates found by semantic search.
pub(crate) const SEMANTIC_BASE: f64 = 1.0;
/// Added when a semantic candidate also appears in the temporal list.
pub(crate) const TEMPORAL_BOOST: f64 = 0.3;
/// Added when a candidate also appears in the relational list.
pub(crate) const RELATIONAL_BOOST: f64 = 0.2;
/// Merge base for candidates only the temporal signal produced.
pub(crate) const TEMPORAL_ONLY_BASE: f64 = 0.5;
/// Merge base for candidates only the relational signal produced.
pub(crate) const RELATIONAL_ONLY_BASE: f64 = 0.4;

/// Maximum number of memories a retrieval returns.
pub(crate) const CONTEXT_WINDOW: usize = 10;

/// Contextual boost for a candidate located within the configured radius.
const PROXIMITY_BOOST: f64 = 0.2;
/// Contextual boost per person shared with the context, capped.
const SHARED_PERSON_BOOST: f64 = 0.1;
const MAX_PEOPLE_BOOST: f64 = 0.3;

/// Recency weight, strictly decreasing at every bucket boundary.
pub(crate) fn recency_boost(elapsed: Duration) -> f64 {
    if elapsed < Duration::hours(1) {
        0.30
    } else if elapsed < Duration::days(1) {
        0.25
    } else if elapsed < Duration::weeks(1) {
        0.20
    } else if elapsed < Duration::days(30) {
        0.15
    } else if elapsed < Duration::days(365) {
        0.10
    } else {
        0.05
    }
}

/// Re-score one semantic candidate against the caller's context. The
/// result is compared to the retrieval threshold; boosts only ever add,
/// so the gate passes everything the raw similarity already passes.
pub(crate) fn contextual_score(
    similarity: f32,
    memory: &Memory,
    context: Option<&RetrievalContext>,
    now: DateTime<Utc>,
    config: &RetrievalConfig,
) -> f64 {
    let mut score = similarity as f64;
    if let Some(context) = context {
        if let (Some(here), Some(there)) = (context.location, memory.location) {
            if here.distance_meters(&there) <= config.location_radius_m {
                score += PROXIMITY_BOOST;
            }
        }
        if !context.people.is_empty() {
            let shared = memory
                .people
                .iter()
                .filter(|p| context.people.contains(p))
                .count();
            score += (SHARED_PERSON_BOOST * shared as f64).min(MAX_PEOPLE_BOOST);
        }
    }
    score + recency_boost(now - memory.timestamp)
}

/// A candidate after the merge stage, before the rerank pass.
pub(crate) struct MergedCandidate {
    pub memory: Memory,
    pub score: f64,
}

/// Merge the three signal lists into one deduplicated scored set.
///
/// Semantic candidates keep their first-stage order and enter at the
/// semantic base; temporal-only and relational-only candidates follow at
/// their lower bases. Membership in additional lists is additive, so a
/// candidate can only gain from appearing in more signals.
pub(crate) fn merge_candidates(
    semantic: Vec<Memory>,
    temporal: Vec<Memory>,
    relational: Vec<Memory>,
) -> Vec<MergedCandidate> {
    let temporal_ids: HashSet<String> = temporal.iter().map(|m| m.id.clone()).collect();
    let relational_ids: HashSet<String> = relational.iter().map(|m| m.id.clone()).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(semantic.len() + temporal.len() + relational.len());

    for memory in semantic {
        if !seen.insert(memory.id.clone()) {
            continue;
        }
        let mut score = SEMANTIC_BASE;
        if temporal_ids.contains(&memory.id) {
            score += TEMPORAL_BOOST;
        }
        if relational_ids.contains(&memory.id) {
            score += RELATIONAL_BOOST;
        }
        out.push(MergedCandidate { memory, score });
    }
    for memory in temporal {
        if !seen.insert(memory.id.clone()) {
            continue;
        }
        let mut score = TEMPORAL_ONLY_BASE;
        if relational_ids.contains(&memory.id) {
            score += RELATIONAL_BOOST;
        }
        out.push(MergedCandidate { memory, score });
    }
    for memory in relational {
        if !seen.insert(memory.id.clone()) {
            continue;
        }
        out.push(MergedCandidate {
            memory,
            score: RELATIONAL_ONLY_BASE,
        });
    }
    out
}

/// Cosine similarity of two possibly non-unit vectors. Zero when either
/// norm vanishes.
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
