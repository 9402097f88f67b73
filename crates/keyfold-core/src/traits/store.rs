// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key-value byte store used to hold the encrypted envelope.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::KeyfoldError;

/// A local durable key-value byte store.
///
/// Implementations must make `put` replace the previous value wholesale:
/// a reader observes either the old bytes or the new bytes, never a mix.
/// There is exactly one writer per store, so no optimistic-concurrency
/// checks are required.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the bytes stored under `key`, or `None` if the slot is empty.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyfoldError>;

    /// Overwrites the bytes stored under `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyfoldError>;

    /// Removes the value under `key`. Removing an empty slot is a no-op.
    async fn delete(&self, key: &str) -> Result<(), KeyfoldError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyfoldError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyfoldError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), KeyfoldError> {
        (**self).delete(key).await
    }
}
