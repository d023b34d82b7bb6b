// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread,
//! which is what makes each conditional transition atomic. Do NOT create
//! additional Connection instances for writes.

use std::path::Path;

use siphon_core::SiphonError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the message state database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL enabled.
    pub async fn open(path: &str) -> Result<Self, SiphonError> {
        Self::open_with(path, true).await
    }

    /// Open (or create) the database, creating parent directories and
    /// running migrations.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, SiphonError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| SiphonError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| SiphonError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.initialize(wal_mode).await?;
        debug!(path, wal_mode, "message store opened");
        Ok(db)
    }

    /// An in-memory database, for tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, SiphonError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| SiphonError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.initialize(false).await?;
        Ok(db)
    }

    async fn initialize(&self, wal_mode: bool) -> Result<(), SiphonError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(run_migrations)
            .await
            .map_err(|e| SiphonError::Storage {
                source: Box::new(e),
            })
    }

    /// Returns a reference to the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), SiphonError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into SiphonError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SiphonError {
    SiphonError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_dirs_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state/siphon.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('messages', 'channel_state', 'worker_lease') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["channel_state", "messages", "worker_lease"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("siphon.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        Database::open(path).await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_enabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
