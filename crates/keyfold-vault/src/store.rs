// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of the encrypted envelope in a single fixed storage slot.

use keyfold_core::{KeyValueStore, KeyfoldError};
use tracing::{debug, info, warn};

use crate::envelope::EncryptedEnvelope;

/// Reads and writes the one envelope slot of a [`KeyValueStore`].
///
/// There is one vault per installation: every save overwrites the slot
/// wholesale and nothing is ever merged.
#[derive(Debug)]
pub struct VaultStore<S> {
    store: S,
    slot: String,
}

impl<S: KeyValueStore> VaultStore<S> {
    pub fn new(store: S, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }

    /// The slot key this store reads and writes.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// The wrapped byte store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Overwrite the stored envelope.
    ///
    /// The envelope is fully serialized before the single write, so a failure
    /// leaves the previous envelope intact.
    pub async fn save(&self, envelope: &EncryptedEnvelope) -> Result<(), KeyfoldError> {
        let bytes = envelope.to_bytes()?;
        self.store.put(&self.slot, bytes).await?;
        debug!(slot = %self.slot, "envelope saved");
        Ok(())
    }

    /// Load the stored envelope.
    ///
    /// Returns `None` when nothing is stored or when the stored bytes are not a
    /// valid envelope: both mean "no vault" to the lock screen.
    pub async fn load(&self) -> Result<Option<EncryptedEnvelope>, KeyfoldError> {
        Ok(self.load_raw().await?.map(|(_, envelope)| envelope))
    }

    /// Whether a readable envelope is stored.
    pub async fn exists(&self) -> Result<bool, KeyfoldError> {
        Ok(self.load().await?.is_some())
    }

    /// The stored envelope bytes, exactly as persisted.
    pub async fn export_blob(&self) -> Result<Vec<u8>, KeyfoldError> {
        match self.load_raw().await? {
            Some((bytes, _)) => {
                info!(slot = %self.slot, bytes = bytes.len(), "vault exported");
                Ok(bytes)
            }
            None => Err(KeyfoldError::NoVault),
        }
    }

    /// Validate `blob` as an envelope and install it, replacing any existing
    /// vault. The blob is never decrypted here.
    ///
    /// An invalid blob yields [`KeyfoldError::ImportFormat`] and the slot is
    /// left untouched.
    pub async fn import_blob(&self, blob: &[u8]) -> Result<EncryptedEnvelope, KeyfoldError> {
        let envelope = EncryptedEnvelope::from_bytes(blob)?;
        self.store.put(&self.slot, blob.to_vec()).await?;
        info!(
            slot = %self.slot,
            version = envelope.version,
            iterations = envelope.iterations,
            "vault imported"
        );
        Ok(envelope)
    }

    async fn load_raw(&self) -> Result<Option<(Vec<u8>, EncryptedEnvelope)>, KeyfoldError> {
        let Some(bytes) = self.store.get(&self.slot).await? else {
            return Ok(None);
        };
        match EncryptedEnvelope::from_bytes(&bytes) {
            Ok(envelope) => Ok(Some((bytes, envelope))),
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "stored envelope unreadable; treating as no vault");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{KEY_LEN, SALT_LEN};
    use crate::model::PlainVault;
    use keyfold_storage::MemoryStore;

    const SLOT: &str = "keyfold.vault";

    fn envelope() -> EncryptedEnvelope {
        EncryptedEnvelope::seal(&[1u8; KEY_LEN], [2u8; SALT_LEN], 1_000, &PlainVault::new())
            .unwrap()
    }

    #[tokio::test]
    async fn load_empty_slot_is_none() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        assert!(store.load().await.unwrap().is_none());
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        let env = envelope();
        store.save(&env).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap(), env);
        assert!(store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn save_overwrites_previous_envelope() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        store.save(&envelope()).await.unwrap();
        let second = envelope();
        store.save(&second).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().iv, second.iv);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn unparseable_slot_reads_as_no_vault() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        store.inner().put(SLOT, b"{\"broken\":true}".to_vec()).await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        assert!(logs_contain("treating as no vault"));
    }

    #[tokio::test]
    async fn export_is_byte_identical_to_stored() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        let env = envelope();
        store.save(&env).await.unwrap();
        let stored = store.inner().get(SLOT).await.unwrap().unwrap();
        assert_eq!(store.export_blob().await.unwrap(), stored);
        assert_eq!(stored, env.to_bytes().unwrap());
    }

    #[tokio::test]
    async fn export_without_vault_fails() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        assert!(matches!(store.export_blob().await, Err(KeyfoldError::NoVault)));
    }

    #[tokio::test]
    async fn import_replaces_existing_vault() {
        let source = VaultStore::new(MemoryStore::new(), SLOT);
        let target = VaultStore::new(MemoryStore::new(), SLOT);
        let imported = envelope();
        source.save(&imported).await.unwrap();
        target.save(&envelope()).await.unwrap();

        let blob = source.export_blob().await.unwrap();
        target.import_blob(&blob).await.unwrap();

        assert_eq!(target.load().await.unwrap().unwrap(), imported);
        assert_eq!(target.export_blob().await.unwrap(), blob);
    }

    #[tokio::test]
    async fn invalid_import_leaves_slot_untouched() {
        let store = VaultStore::new(MemoryStore::new(), SLOT);
        let existing = envelope();
        store.save(&existing).await.unwrap();

        let err = store
            .import_blob(br#"{"version":1,"salt":"AAAAAAAAAAAAAAAAAAAAAA==","iv":"AAAAAAAAAAAAAAAA","iterations":5}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, KeyfoldError::ImportFormat(_)));
        assert_eq!(store.load().await.unwrap().unwrap(), existing);
    }
}
