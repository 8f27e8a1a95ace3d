// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRUD for the `vectors` table. Embeddings cross this boundary as f32
//! slices and are packed to little-endian blobs here; metadata documents
//! are serialized before the call so JSON errors never surface inside a
//! connection closure.

use rusqlite::{params, params_from_iter, OptionalExtension};
use serde_json::Value;

use crate::codec::{blob_to_vec, vec_to_blob};
use crate::database::{map_tr_err, Database};
use reverie_core::ReverieError;

fn json_error(e: serde_json::Error) -> ReverieError {
    ReverieError::Storage { source: Box::new(e) }
}

/// Insert or fully replace a row. `created_at` is only written on first
/// insert; replacing keeps the original creation time.
pub async fn upsert(
    db: &Database,
    id: &str,
    embedding: &[f32],
    metadata: &Value,
    norm: f32,
    now: &str,
) -> Result<(), ReverieError> {
    let id = id.to_string();
    let blob = vec_to_blob(embedding);
    let doc = serde_json::to_string(metadata).map_err(json_error)?;
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO vectors (id, embedding, metadata, norm, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     embedding = excluded.embedding,
                     metadata = excluded.metadata,
                     norm = excluded.norm,
                     updated_at = excluded.updated_at",
                params![id, blob, doc, norm, now, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Replace only the embedding of an existing row. Returns false when no
/// row carries this id.
pub async fn update_embedding(
    db: &Database,
    id: &str,
    embedding: &[f32],
    norm: f32,
    now: &str,
) -> Result<bool, ReverieError> {
    let id = id.to_string();
    let blob = vec_to_blob(embedding);
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE vectors SET embedding = ?2, norm = ?3, updated_at = ?4 WHERE id = ?1",
                params![id, blob, norm, now],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Replace only the metadata document of an existing row. Returns false
/// when no row carries this id.
pub async fn set_metadata(
    db: &Database,
    id: &str,
    metadata: &Value,
    now: &str,
) -> Result<bool, ReverieError> {
    let id = id.to_string();
    let doc = serde_json::to_string(metadata).map_err(json_error)?;
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE vectors SET metadata = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, doc, now],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a row if present. Deleting an absent id is not an error.
pub async fn delete(db: &Database, id: &str) -> Result<(), ReverieError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM vectors WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_metadata(db: &Database, id: &str) -> Result<Option<Value>, ReverieError> {
    let id = id.to_string();
    let text = db
        .connection()
        .call(move |conn| {
            let text = conn
                .query_row(
                    "SELECT metadata FROM vectors WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(text)
        })
        .await
        .map_err(map_tr_err)?;
    match text {
        Some(text) => Ok(Some(serde_json::from_str(&text).map_err(json_error)?)),
        None => Ok(None),
    }
}

/// Batched embedding fetch for cache misses. Ids not present in the table
/// are silently absent from the result.
pub async fn embeddings_by_ids(
    db: &Database,
    ids: &[String],
) -> Result<Vec<(String, Vec<f32>)>, ReverieError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql =
                format!("SELECT id, embedding FROM vectors WHERE id IN ({placeholders})");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob_to_vec(&blob)))
            })?;
            let mut out = Vec::with_capacity(ids.len());
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Metadata and recency for ranking, keyed by id. Documents come back as
/// raw JSON text; the query engine parses them outside the connection.
pub async fn metadata_rows_by_ids(
    db: &Database,
    ids: &[String],
) -> Result<Vec<(String, String, String)>, ReverieError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT id, metadata, updated_at FROM vectors WHERE id IN ({placeholders})"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            let mut out = Vec::with_capacity(ids.len());
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Full scan used to rebuild the in-memory index on open.
pub async fn all_embeddings(db: &Database) -> Result<Vec<(String, Vec<f32>)>, ReverieError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, embedding FROM vectors")?;
            let rows = stmt.query_map([], |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob_to_vec(&blob)))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count(db: &Database) -> Result<usize, ReverieError> {
    db.connection()
        .call(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get(0))?;
            Ok(n as usize)
        })
        .await
        .map_err(map_tr_err)
}

/// Rows created inside an inclusive window, oldest first. Timestamps are
/// RFC 3339 with a fixed-width millisecond suffix, so text comparison
/// orders them correctly.
pub async fn created_between(
    db: &Database,
    start: &str,
    end: &str,
) -> Result<Vec<(String, String, String)>, ReverieError> {
    let start = start.to_string();
    let end = end.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, metadata, created_at FROM vectors
                 WHERE created_at >= ?1 AND created_at <= ?2
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![start, end], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (dir, db)
    }

    const T1: &str = "2026-01-10T08:00:00.000Z";
    const T2: &str = "2026-02-10T08:00:00.000Z";

    #[tokio::test]
    async fn upsert_then_fetch_roundtrips() {
        let (_dir, db) = test_db().await;
        let meta = json!({"content": "coffee with ada"});
        upsert(&db, "m1", &[0.6, 0.8], &meta, 1.0, T1).await.unwrap();

        assert_eq!(get_metadata(&db, "m1").await.unwrap(), Some(meta));
        let rows = embeddings_by_ids(&db, &["m1".to_string()]).await.unwrap();
        assert_eq!(rows, vec![("m1".to_string(), vec![0.6, 0.8])]);
    }

    #[tokio::test]
    async fn upsert_replaces_but_keeps_created_at() {
        let (_dir, db) = test_db().await;
        upsert(&db, "m1", &[1.0, 0.0], &json!({"v": 1}), 1.0, T1)
            .await
            .unwrap();
        upsert(&db, "m1", &[0.0, 1.0], &json!({"v": 2}), 2.0, T2)
            .await
            .unwrap();

        let rows = created_between(&db, "2026-01-01T00:00:00.000Z", "2026-01-31T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "m1");
        assert_eq!(rows[0].2, T1);
        assert_eq!(
            get_metadata(&db, "m1").await.unwrap(),
            Some(json!({"v": 2}))
        );
    }

    #[tokio::test]
    async fn update_embedding_reports_missing_rows() {
        let (_dir, db) = test_db().await;
        assert!(!update_embedding(&db, "ghost", &[1.0], 1.0, T1).await.unwrap());

        upsert(&db, "m1", &[1.0], &json!({}), 1.0, T1).await.unwrap();
        assert!(update_embedding(&db, "m1", &[0.5], 0.5, T2).await.unwrap());
        let rows = embeddings_by_ids(&db, &["m1".to_string()]).await.unwrap();
        assert_eq!(rows[0].1, vec![0.5]);
    }

    #[tokio::test]
    async fn set_metadata_bumps_updated_at() {
        let (_dir, db) = test_db().await;
        upsert(&db, "m1", &[1.0], &json!({"a": 1}), 1.0, T1).await.unwrap();
        assert!(set_metadata(&db, "m1", &json!({"a": 2}), T2).await.unwrap());

        let rows = metadata_rows_by_ids(&db, &["m1".to_string()]).await.unwrap();
        assert_eq!(rows[0].2, T2);
        assert!(!set_metadata(&db, "ghost", &json!({}), T2).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, db) = test_db().await;
        upsert(&db, "m1", &[1.0], &json!({}), 1.0, T1).await.unwrap();
        delete(&db, "m1").await.unwrap();
        delete(&db, "m1").await.unwrap();
        assert_eq!(count(&db).await.unwrap(), 0);
        assert_eq!(get_metadata(&db, "m1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn batched_fetch_skips_unknown_ids() {
        let (_dir, db) = test_db().await;
        upsert(&db, "m1", &[1.0], &json!({}), 1.0, T1).await.unwrap();
        let rows = embeddings_by_ids(&db, &["m1".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(embeddings_by_ids(&db, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_between_is_inclusive_and_ordered() {
        let (_dir, db) = test_db().await;
        upsert(&db, "a", &[1.0], &json!({}), 1.0, "2026-03-01T00:00:00.000Z")
            .await
            .unwrap();
        upsert(&db, "b", &[1.0], &json!({}), 1.0, "2026-03-02T00:00:00.000Z")
            .await
            .unwrap();
        upsert(&db, "c", &[1.0], &json!({}), 1.0, "2026-03-03T00:00:00.000Z")
            .await
            .unwrap();

        let rows = created_between(&db, "2026-03-01T00:00:00.000Z", "2026-03-02T00:00:00.000Z")
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
