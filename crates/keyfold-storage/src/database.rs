// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. `Database` is the single writer: do not open further connections
//! for writes.

use std::path::Path;

use keyfold_config::StorageConfig;
use keyfold_core::KeyfoldError;
use tracing::{debug, info};

use crate::migrations;

/// Handle to the Keyfold SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database described by `config`.
    ///
    /// Schema migrations run on a short-lived blocking connection before the
    /// long-lived async connection is opened.
    pub async fn open(config: &StorageConfig) -> Result<Self, KeyfoldError> {
        let path = config.database_path.clone();
        let wal_mode = config.wal_mode;

        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(KeyfoldError::storage)?;
        }

        let migrate_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), KeyfoldError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(KeyfoldError::storage)?;
            if wal_mode {
                let mode: String = conn
                    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                    .map_err(KeyfoldError::storage)?;
                debug!(mode = %mode, "journal mode set");
            }
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| KeyfoldError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(KeyfoldError::storage)?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), KeyfoldError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("wal checkpoint complete");
        Ok(())
    }
}

/// Convert tokio-rusqlite errors into [`KeyfoldError::Storage`].
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> KeyfoldError {
    KeyfoldError::storage(e)
}
