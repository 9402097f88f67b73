// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`KeyValueStore`] with switchable write faults.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use keyfold_core::{KeyValueStore, KeyfoldError};
use keyfold_storage::MemoryStore;
use tokio::sync::{Notify, watch};

/// In-memory store whose writes can be made to fail or to stall until
/// released. Reads always succeed.
#[derive(Debug)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_puts: AtomicBool,
    puts: AtomicUsize,
    gate: watch::Sender<bool>,
    put_waiting: Notify,
}

impl Default for FaultyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultyStore {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: MemoryStore::new(),
            fail_puts: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
            gate,
            put_waiting: Notify::new(),
        }
    }

    /// Make every subsequent `put` fail with a storage error (or succeed again).
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Stall subsequent writes until [`FaultyStore::release_puts`] is called.
    pub fn hold_puts(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_puts(&self) {
        self.gate.send_replace(true);
    }

    /// Resolves once a write is stalled behind [`FaultyStore::hold_puts`].
    pub async fn put_stalled(&self) {
        self.put_waiting.notified().await;
    }

    /// Number of successful writes so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyfoldError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyfoldError> {
        let mut gate = self.gate.subscribe();
        let open = *gate.borrow_and_update();
        if !open {
            self.put_waiting.notify_one();
            gate.wait_for(|open| *open)
                .await
                .map_err(|e| KeyfoldError::Internal(format!("write gate closed: {e}")))?;
        }
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(KeyfoldError::storage(std::io::Error::other(
                "injected write failure",
            )));
        }
        self.inner.put(key, value).await?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyfoldError> {
        self.inner.delete(key).await
    }
}
