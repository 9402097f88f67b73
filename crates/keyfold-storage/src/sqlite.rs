// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`KeyValueStore`].

use async_trait::async_trait;
use keyfold_config::StorageConfig;
use keyfold_core::{KeyValueStore, KeyfoldError};
use rusqlite::params;
use tracing::debug;

use crate::database::{Database, map_tr_err};

/// Key-value byte store backed by the `kv_store` table.
///
/// Each `put` is a single `INSERT OR REPLACE`, so a slot is always either the
/// previous value or the new one.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config` and wrap it as a store.
    pub async fn open(config: &StorageConfig) -> Result<Self, KeyfoldError> {
        Ok(Self::new(Database::open(config).await?))
    }

    /// Wrap an already-open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyfoldError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, Vec<u8>>(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyfoldError> {
        let key_owned = key.to_string();
        let len = value.len();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    params![key_owned, value, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(key = %key, bytes = len, "slot written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyfoldError> {
        let key_owned = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key_owned])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(key = %key, "slot cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").display().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let (store, _dir) = open_test_store().await;
        assert!(store.get("keyfold.vault").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_returns_bytes() {
        let (store, _dir) = open_test_store().await;
        store.put("slot", b"envelope-1".to_vec()).await.unwrap();
        assert_eq!(store.get("slot").await.unwrap().unwrap(), b"envelope-1");
    }

    #[tokio::test]
    async fn put_overwrites_wholesale() {
        let (store, _dir) = open_test_store().await;
        store.put("slot", b"a much longer first value".to_vec()).await.unwrap();
        store.put("slot", b"short".to_vec()).await.unwrap();
        assert_eq!(store.get("slot").await.unwrap().unwrap(), b"short");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _dir) = open_test_store().await;
        store.put("slot", vec![1, 2, 3]).await.unwrap();
        store.delete("slot").await.unwrap();
        store.delete("slot").await.unwrap();
        assert!(store.get("slot").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("nested/dir/keyfold.db").display().to_string(),
            wal_mode: true,
        };

        let store = SqliteStore::open(&config).await.unwrap();
        store.put("slot", b"persisted".to_vec()).await.unwrap();
        store.database().checkpoint().await.unwrap();
        drop(store);

        let reopened = SqliteStore::open(&config).await.unwrap();
        assert_eq!(reopened.get("slot").await.unwrap().unwrap(), b"persisted");
    }

    #[tokio::test]
    async fn migrations_are_rerunnable() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("twice.db").display().to_string(),
            wal_mode: false,
        };
        let _first = SqliteStore::open(&config).await.unwrap();
        let second = SqliteStore::open(&config).await;
        assert!(second.is_ok());
    }
}
