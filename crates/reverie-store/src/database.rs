// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All SQLite work is serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use reverie_core::ReverieError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Convert tokio_rusqlite errors into ReverieError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> ReverieError {
    ReverieError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite connection backing a store.
///
/// Every closure passed to `conn.call()` runs serialized on tokio-rusqlite's
/// background thread, which keeps the durable side single-writer without any
/// extra locking here.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run all
    /// pending migrations. Any failure here is fatal to the instance.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ReverieError> {
        let open_err = |path: &str, e: Box<dyn std::error::Error + Send + Sync>| {
            ReverieError::PersistenceOpen {
                path: path.to_string(),
                source: e,
            }
        };

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| open_err(path, Box::new(e)))?;
            }
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| open_err(path, Box::new(e)))?;

        let pragmas: &'static str = if wal_mode {
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA synchronous=FULL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;"
        };

        conn.call(move |conn| -> Result<(), ReverieError> {
            conn.execute_batch(pragmas)
                .map_err(|e| ReverieError::Storage { source: Box::new(e) })?;
            migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| open_err(path, Box::new(e)))?;

        debug!(path = %path, wal = wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so all committed pages land in the main file.
    pub async fn close(&self) -> Result<(), ReverieError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
