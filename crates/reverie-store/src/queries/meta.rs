// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value rows describing the store itself, such as the fixed embedding
//! dimension and the strategy that last owned the index.

use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use reverie_core::ReverieError;

pub async fn get(db: &Database, key: &str) -> Result<Option<String>, ReverieError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM store_meta WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set(db: &Database, key: &str, value: &str) -> Result<(), ReverieError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (_dir, db) = test_db().await;
        assert_eq!(get(&db, "dimension").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let (_dir, db) = test_db().await;
        set(&db, "dimension", "384").await.unwrap();
        assert_eq!(get(&db, "dimension").await.unwrap(), Some("384".into()));
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let (_dir, db) = test_db().await;
        set(&db, "strategy", "flat").await.unwrap();
        set(&db, "strategy", "hnsw").await.unwrap();
        assert_eq!(get(&db, "strategy").await.unwrap(), Some("hnsw".into()));
    }
}
