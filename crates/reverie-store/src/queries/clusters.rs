// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot of the clustered strategy's training state. Centroids and
//! assignments are replaced together in one transaction so a reopened
//! store never sees half of a rebuild.

use rusqlite::params;

use crate::codec::{blob_to_vec, vec_to_blob};
use crate::database::{map_tr_err, Database};
use reverie_core::ReverieError;

/// Replace the full snapshot atomically.
pub async fn persist(
    db: &Database,
    centroids: &[Vec<f32>],
    assignments: &[(String, i64)],
) -> Result<(), ReverieError> {
    let centroids: Vec<Vec<u8>> = centroids.iter().map(|c| vec_to_blob(c)).collect();
    let assignments = assignments.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM ivf_assignments", [])?;
            tx.execute("DELETE FROM ivf_centroids", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO ivf_centroids (cluster_id, centroid) VALUES (?1, ?2)",
                )?;
                for (i, blob) in centroids.iter().enumerate() {
                    stmt.execute(params![i as i64, blob])?;
                }
            }
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO ivf_assignments (id, cluster_id) VALUES (?1, ?2)",
                )?;
                for (id, cluster) in &assignments {
                    stmt.execute(params![id, cluster])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Centroids in cluster-id order. Empty when the store was never trained.
pub async fn load_centroids(db: &Database) -> Result<Vec<Vec<f32>>, ReverieError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT centroid FROM ivf_centroids ORDER BY cluster_id ASC")?;
            let rows = stmt.query_map([], |row| {
                let blob: Vec<u8> = row.get(0)?;
                Ok(blob_to_vec(&blob))
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

pub async fn load_assignments(db: &Database) -> Result<Vec<(String, i64)>, ReverieError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, cluster_id FROM ivf_assignments")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Record where one freshly written vector landed.
pub async fn upsert_assignment(db: &Database, id: &str, cluster: i64) -> Result<(), ReverieError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ivf_assignments (id, cluster_id) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET cluster_id = excluded.cluster_id",
                params![id, cluster],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_assignment(db: &Database, id: &str) -> Result<(), ReverieError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM ivf_assignments WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
