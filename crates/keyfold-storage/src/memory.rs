// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`KeyValueStore`] for tests and ephemeral sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use keyfold_core::{KeyValueStore, KeyfoldError};
use tokio::sync::RwLock;

/// Volatile key-value store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyfoldError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyfoldError> {
        self.slots.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyfoldError> {
        self.slots.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        store.put("k", b"v1".to_vec()).await.unwrap();
        store.put("k", b"v2".to_vec()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("k").await.unwrap().unwrap(), b"v2");

        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}
