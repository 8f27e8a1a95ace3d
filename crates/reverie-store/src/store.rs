// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The durable vector store facade.
//!
//! [`VectorStore`] owns the SQLite handle, the in-memory index, and the
//! LRU vector cache, and keeps the three aligned under one writer lock:
//! every mutation writes the database first, then the index, then the
//! cache, all before the write guard drops. Readers take the shared side
//! of the lock, so a search never observes a half-applied write.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use reverie_config::model::{IndexKind, ReverieConfig};
use reverie_core::vector::normalize;
use reverie_core::ReverieError;

use crate::cache::{self, VectorCache};
use crate::database::Database;
use crate::index::{AnyIndex, VectorIndex};
use crate::queries;
use crate::query::{self, SearchHit};

const META_DIMENSION: &str = "dimension";
const META_STRATEGY: &str = "strategy";

/// A row summary for time-window scans: everything but the embedding.
#[derive(Debug, Clone)]
pub struct RecordSummary {
    pub id: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

pub struct VectorStore {
    db: Database,
    dimension: usize,
    strategy: IndexKind,
    index: RwLock<AnyIndex>,
    cache: Mutex<VectorCache>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("dimension", &self.dimension)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

fn storage_error<E>(e: E) -> ReverieError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ReverieError::Storage { source: Box::new(e) }
}

/// RFC 3339 with fixed-width milliseconds and a literal Z, so timestamp
/// text sorts chronologically.
fn now_rfc3339() -> String {
    format_rfc3339(Utc::now())
}

fn format_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl VectorStore {
    /// Open or create a store at the configured path.
    ///
    /// The embedding dimension is pinned by the first open; reopening with
    /// a different dimension fails. The strategy is free to change between
    /// opens, the in-memory index is rebuilt from the durable rows either
    /// way.
    pub async fn open(config: &ReverieConfig) -> Result<Self, ReverieError> {
        let db = Database::open(&config.store.database_path, config.store.wal_mode).await?;
        let dimension = config.store.dimension;

        match queries::meta::get(&db, META_DIMENSION).await? {
            Some(stored) => {
                let stored: usize = stored.parse().map_err(|_| {
                    ReverieError::Config(format!(
                        "stored dimension {stored:?} is not a number"
                    ))
                })?;
                if stored != dimension {
                    return Err(ReverieError::Config(format!(
                        "database at {} holds {stored}-dimensional vectors but the \
                         configured dimension is {dimension}",
                        config.store.database_path
                    )));
                }
            }
            None => {
                queries::meta::set(&db, META_DIMENSION, &dimension.to_string()).await?;
            }
        }
        let strategy = config.index.strategy;
        queries::meta::set(&db, META_STRATEGY, strategy.as_str()).await?;

        let mut index = AnyIndex::from_config(&config.index, dimension);
        let rows = queries::vectors::all_embeddings(&db).await?;
        let count = rows.len();
        if let AnyIndex::Ivf(ivf) = &mut index {
            let centroids = queries::clusters::load_centroids(&db).await?;
            let assignments: HashMap<String, usize> = queries::clusters::load_assignments(&db)
                .await?
                .into_iter()
                .filter_map(|(id, c)| usize::try_from(c).ok().map(|c| (id, c)))
                .collect();
            ivf.set_centroids(centroids);
            for (id, vector) in rows {
                let persisted = assignments.get(&id).copied();
                ivf.add_with_assignment(&id, vector, persisted);
            }
        } else {
            for (id, vector) in rows {
                index.add(&id, vector);
            }
        }

        info!(
            count,
            strategy = strategy.as_str(),
            dimension,
            "vector store opened"
        );
        Ok(Self {
            db,
            dimension,
            strategy,
            index: RwLock::new(index),
            cache: Mutex::new(VectorCache::new(config.store.cache_capacity)),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn strategy(&self) -> IndexKind {
        self.strategy
    }

    fn check_dimension(&self, actual: usize) -> Result<(), ReverieError> {
        if actual != self.dimension {
            return Err(ReverieError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }

    /// Insert a vector with its metadata document, replacing any existing
    /// record under the same id. The stored copy is unit-normalized; the
    /// original norm is kept alongside it.
    pub async fn insert(&self, id: &str, embedding: &[f32], metadata: Value) -> Result<(), ReverieError> {
        self.check_dimension(embedding.len())?;
        let (unit, norm) = normalize(embedding);
        let now = now_rfc3339();

        let mut index = self.index.write().await;
        queries::vectors::upsert(&self.db, id, &unit, &metadata, norm, &now).await?;
        index.add(id, unit.clone());
        if let AnyIndex::Ivf(ivf) = &*index {
            if let Some(cluster) = ivf.assignment_of(id) {
                queries::clusters::upsert_assignment(&self.db, id, cluster as i64).await?;
            }
        }
        cache::lock(&self.cache).insert(id, unit);
        debug!(id = %id, "vector inserted");
        Ok(())
    }

    /// Replace the embedding of an existing record. Fails with `NotFound`
    /// when the id is absent; the database, index, and cache are then
    /// untouched.
    pub async fn update(&self, id: &str, embedding: &[f32]) -> Result<(), ReverieError> {
        self.check_dimension(embedding.len())?;
        let (unit, norm) = normalize(embedding);
        let now = now_rfc3339();

        let mut index = self.index.write().await;
        let updated = queries::vectors::update_embedding(&self.db, id, &unit, norm, &now).await?;
        if !updated {
            return Err(ReverieError::NotFound { id: id.to_string() });
        }
        index.update(id, unit.clone());
        if let AnyIndex::Ivf(ivf) = &*index {
            if let Some(cluster) = ivf.assignment_of(id) {
                queries::clusters::upsert_assignment(&self.db, id, cluster as i64).await?;
            }
        }
        cache::lock(&self.cache).insert(id, unit);
        debug!(id = %id, "vector updated");
        Ok(())
    }

    /// Replace the metadata document of an existing record and bump its
    /// update time. The embedding, index, and cache are untouched.
    pub async fn update_metadata(&self, id: &str, metadata: Value) -> Result<(), ReverieError> {
        let now = now_rfc3339();
        let _guard = self.index.write().await;
        let updated = queries::vectors::set_metadata(&self.db, id, &metadata, &now).await?;
        if !updated {
            return Err(ReverieError::NotFound { id: id.to_string() });
        }
        debug!(id = %id, "metadata replaced");
        Ok(())
    }

    /// Remove a record from the database, the index, and the cache.
    /// Deleting an absent id succeeds.
    pub async fn delete(&self, id: &str) -> Result<(), ReverieError> {
        let mut index = self.index.write().await;
        queries::vectors::delete(&self.db, id).await?;
        index.remove(id);
        if matches!(self.strategy, IndexKind::Ivf) {
            queries::clusters::delete_assignment(&self.db, id).await?;
        }
        cache::lock(&self.cache).remove(id);
        debug!(id = %id, "vector deleted");
        Ok(())
    }

    pub async fn get_metadata(&self, id: &str) -> Result<Value, ReverieError> {
        let _guard = self.index.read().await;
        match queries::vectors::get_metadata(&self.db, id).await? {
            Some(doc) => Ok(doc),
            None => Err(ReverieError::NotFound { id: id.to_string() }),
        }
    }

    /// Top-k cosine search with a similarity floor. Results order by
    /// similarity, then recency, then id.
    pub async fn search(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchHit>, ReverieError> {
        let index = self.index.read().await;
        query::execute(
            &self.db,
            &index,
            &self.cache,
            self.dimension,
            query,
            k,
            threshold,
        )
        .await
    }

    /// Number of durable records.
    pub async fn len(&self) -> Result<usize, ReverieError> {
        let _guard = self.index.read().await;
        queries::vectors::count(&self.db).await
    }

    pub async fn is_empty(&self) -> Result<bool, ReverieError> {
        Ok(self.len().await? == 0)
    }

    /// Records created inside an inclusive window, oldest first.
    pub async fn records_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RecordSummary>, ReverieError> {
        let _guard = self.index.read().await;
        let rows = queries::vectors::created_between(
            &self.db,
            &format_rfc3339(start),
            &format_rfc3339(end),
        )
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for (id, doc, created_at) in rows {
            let metadata: Value = serde_json::from_str(&doc).map_err(storage_error)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(storage_error)?
                .with_timezone(&Utc);
            out.push(RecordSummary {
                id,
                metadata,
                created_at,
            });
        }
        Ok(out)
    }

    /// Re-run clustering for the inverted-file strategy and persist the
    /// resulting snapshot. A no-op under any other strategy.
    pub async fn rebuild_clusters(&self) -> Result<(), ReverieError> {
        let mut index = self.index.write().await;
        let AnyIndex::Ivf(ivf) = &mut *index else {
            return Ok(());
        };
        ivf.train();
        let centroids = ivf.centroids().to_vec();
        let mut assignments: Vec<(String, i64)> = ivf
            .assignments()
            .iter()
            .map(|(id, &cluster)| (id.clone(), cluster as i64))
            .collect();
        assignments.sort();
        queries::clusters::persist(&self.db, &centroids, &assignments).await?;
        info!(clusters = centroids.len(), "clusters rebuilt");
        Ok(())
    }

    /// Drop every cached vector. Subsequent searches refill from the
    /// database; results are unaffected.
    pub fn flush_cache(&self) {
        cache::lock(&self.cache).clear();
        debug!("vector cache flushed");
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), ReverieError> {
        self.db.close().await
    }
}
