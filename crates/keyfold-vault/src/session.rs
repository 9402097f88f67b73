// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locked/unlocked lifecycle of the single live vault.
//!
//! A [`Session`] owns the derived key and the plaintext document while
//! unlocked, and nothing at all while locked. Presentation code receives a
//! `Session` handle and goes through it for every read and write; there is no
//! global state.

use std::sync::Arc;

use keyfold_config::VaultConfig;
use keyfold_core::{KeyValueStore, KeyfoldError, Operation};
use secrecy::{ExposeSecret, SecretString};
use strum::Display;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::autosave::Debouncer;
use crate::envelope::{self, EncryptedEnvelope};
use crate::kdf::{self, SALT_LEN, VaultKey};
use crate::model::PlainVault;
use crate::store::VaultStore;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Locked,
    Unlocked,
}

/// Key material and document held while unlocked. Dropping it zeroizes the key.
struct Unlocked {
    key: VaultKey,
    salt: [u8; SALT_LEN],
    iterations: u32,
    vault: PlainVault,
    dirty: bool,
    /// Bumped by every accepted mutation.
    generation: u64,
}

impl Unlocked {
    fn seal(&self) -> Result<EncryptedEnvelope, KeyfoldError> {
        EncryptedEnvelope::seal(&self.key, self.salt, self.iterations, &self.vault)
    }
}

enum SessionState {
    Locked,
    Unlocked(Unlocked),
}

struct Inner<S> {
    store: VaultStore<S>,
    config: VaultConfig,
    state: Mutex<SessionState>,
    /// Held for the duration of any derive/encrypt/write sequence.
    crypto_flight: Mutex<()>,
    autosave: Debouncer,
}

/// Handle to the vault session. Cloning is cheap and every clone drives the
/// same session.
pub struct Session<S: KeyValueStore> {
    inner: Arc<Inner<S>>,
}

impl<S: KeyValueStore> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self.inner.state.try_lock() {
            Ok(state) => match *state {
                SessionState::Locked => "locked",
                SessionState::Unlocked(_) => "unlocked",
            },
            Err(_) => "busy",
        };
        f.debug_struct("Session")
            .field("slot", &self.inner.store.slot())
            .field("status", &status)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Create a locked session over `store`, using `config.storage_key` as the
    /// envelope slot.
    pub fn new(store: S, config: VaultConfig) -> Self {
        let store = VaultStore::new(store, config.storage_key.clone());
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                state: Mutex::new(SessionState::Locked),
                crypto_flight: Mutex::new(()),
                autosave: Debouncer::default(),
            }),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.inner.config
    }

    pub fn vault_store(&self) -> &VaultStore<S> {
        &self.inner.store
    }

    pub async fn status(&self) -> SessionStatus {
        match *self.inner.state.lock().await {
            SessionState::Locked => SessionStatus::Locked,
            SessionState::Unlocked(_) => SessionStatus::Unlocked,
        }
    }

    pub async fn is_unlocked(&self) -> bool {
        self.status().await == SessionStatus::Unlocked
    }

    /// Whether a readable envelope is stored. Drives the lock screen's choice
    /// between "create" and "unlock".
    pub async fn vault_exists(&self) -> Result<bool, KeyfoldError> {
        self.inner.store.exists().await
    }

    /// Whether a debounced save is scheduled and has not run yet.
    pub fn save_pending(&self) -> bool {
        self.inner.autosave.is_pending()
    }

    /// Whether edits are waiting for the next save.
    pub async fn has_unsaved_changes(&self) -> bool {
        match &*self.inner.state.lock().await {
            SessionState::Unlocked(unlocked) => unlocked.dirty,
            SessionState::Locked => false,
        }
    }

    /// Create a new, empty vault and unlock it.
    ///
    /// The password must be at least `min_password_length` characters and
    /// match `confirm`. An existing vault is never overwritten here; use
    /// [`Session::import_blob`] to replace one.
    pub async fn create_vault(
        &self,
        password: &SecretString,
        confirm: &SecretString,
    ) -> Result<(), KeyfoldError> {
        let _flight = self.begin(Operation::CreateVault)?;

        let min_len = self.inner.config.effective_min_password_length();
        if password.expose_secret().chars().count() < min_len {
            return Err(KeyfoldError::Validation(format!(
                "password must be at least {min_len} characters"
            )));
        }
        if password.expose_secret() != confirm.expose_secret() {
            return Err(KeyfoldError::Validation(
                "passwords do not match".to_string(),
            ));
        }
        if self.is_unlocked().await {
            return Err(KeyfoldError::Validation(
                "lock the current vault before creating a new one".to_string(),
            ));
        }
        let iterations = self.inner.config.kdf_iterations;
        if !envelope::supported_iterations(iterations) {
            return Err(KeyfoldError::Validation(format!(
                "kdf_iterations must be between 1 and {}, got {iterations}",
                envelope::MAX_ITERATIONS
            )));
        }
        if self.inner.store.exists().await? {
            return Err(KeyfoldError::Validation(
                "a vault already exists; import or unlock it instead".to_string(),
            ));
        }

        let derived = kdf::derive(password, None, iterations).await?;
        let unlocked = Unlocked {
            key: derived.key,
            salt: derived.salt,
            iterations: derived.iterations,
            vault: PlainVault::new(),
            dirty: false,
            generation: 0,
        };
        self.inner.store.save(&unlocked.seal()?).await?;

        *self.inner.state.lock().await = SessionState::Unlocked(unlocked);
        info!(iterations, "vault created");
        Ok(())
    }

    /// Unlock the stored vault.
    ///
    /// The key is derived with the salt and iteration count stored in the
    /// envelope, not the configured defaults. A wrong password and a damaged
    /// envelope both yield [`KeyfoldError::Authentication`].
    pub async fn unlock(&self, password: &SecretString) -> Result<(), KeyfoldError> {
        let _flight = self.begin(Operation::Unlock)?;

        if self.is_unlocked().await {
            return Err(KeyfoldError::Validation(
                "vault is already unlocked".to_string(),
            ));
        }
        let envelope = self.inner.store.load().await?.ok_or(KeyfoldError::NoVault)?;

        let derived = kdf::derive(password, Some(envelope.salt), envelope.iterations).await?;
        let vault = match envelope.open(&derived.key) {
            Ok(vault) => vault,
            Err(KeyfoldError::Decryption) => {
                warn!("unlock rejected");
                return Err(KeyfoldError::Authentication);
            }
            Err(e) => return Err(e),
        };
        if let Err(e) = vault.validate() {
            warn!(error = %e, "vault document failed integrity check");
        }

        let (people, items) = (vault.people.len(), vault.items.len());
        *self.inner.state.lock().await = SessionState::Unlocked(Unlocked {
            key: derived.key,
            salt: derived.salt,
            iterations: derived.iterations,
            vault,
            dirty: false,
            generation: 0,
        });
        info!(
            version = envelope.version,
            iterations = envelope.iterations,
            people,
            items,
            "vault unlocked"
        );
        Ok(())
    }

    /// Lock the session, discarding the key and document.
    ///
    /// Pending edits are written first. The session ends up locked even when
    /// that final write fails; the write error is returned so the caller can
    /// report that the last edits were lost.
    pub async fn lock(&self) -> Result<(), KeyfoldError> {
        self.inner.autosave.cancel();
        let _flight = self.inner.crypto_flight.lock().await;

        let previous = std::mem::replace(&mut *self.inner.state.lock().await, SessionState::Locked);
        let SessionState::Unlocked(unlocked) = previous else {
            return Ok(());
        };

        let flushed = if unlocked.dirty {
            match unlocked.seal() {
                Ok(envelope) => self.inner.store.save(&envelope).await,
                Err(e) => Err(e),
            }
        } else {
            Ok(())
        };
        drop(unlocked);

        match &flushed {
            Ok(()) => info!("vault locked"),
            Err(e) => warn!(error = %e, "vault locked; final save failed and recent edits were lost"),
        }
        flushed
    }

    /// Apply `f` to the document and schedule a save.
    ///
    /// `f` runs against a working copy that replaces the document only when
    /// `f` returns `Ok`, so a failed mutation leaves nothing half-applied.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, KeyfoldError>
    where
        F: FnOnce(&mut PlainVault) -> Result<T, KeyfoldError> + Send,
        T: Send,
    {
        let value = {
            let mut state = self.inner.state.lock().await;
            let SessionState::Unlocked(unlocked) = &mut *state else {
                return Err(KeyfoldError::Locked);
            };
            let mut working = unlocked.vault.clone();
            let value = f(&mut working)?;
            unlocked.vault = working;
            unlocked.dirty = true;
            unlocked.generation += 1;
            value
        };
        self.schedule_autosave();
        Ok(value)
    }

    /// Read from the document without copying it.
    pub async fn read<T, F>(&self, f: F) -> Result<T, KeyfoldError>
    where
        F: FnOnce(&PlainVault) -> T + Send,
    {
        match &*self.inner.state.lock().await {
            SessionState::Unlocked(unlocked) => Ok(f(&unlocked.vault)),
            SessionState::Locked => Err(KeyfoldError::Locked),
        }
    }

    /// A copy of the current document.
    pub async fn snapshot(&self) -> Result<PlainVault, KeyfoldError> {
        self.read(PlainVault::clone).await
    }

    /// Re-encrypt the whole document under a fresh nonce and overwrite the
    /// stored envelope. Writes even when nothing changed.
    pub async fn persist(&self) -> Result<(), KeyfoldError> {
        let _flight = self.begin(Operation::Persist)?;
        self.inner.autosave.cancel();
        self.write_current(false).await?;
        debug!("vault persisted");
        Ok(())
    }

    /// The stored envelope bytes, after flushing any pending edits.
    pub async fn export_blob(&self) -> Result<Vec<u8>, KeyfoldError> {
        {
            let _flight = self.inner.crypto_flight.lock().await;
            match self.write_current(true).await {
                Ok(_) | Err(KeyfoldError::Locked) => {}
                Err(e) => return Err(e),
            }
        }
        self.inner.store.export_blob().await
    }

    /// Replace the stored vault with `blob`.
    ///
    /// The blob is validated before anything changes. A valid import locks
    /// the session without saving pending edits, since they belong to the
    /// vault being replaced; the imported vault must then be unlocked with
    /// its own password.
    pub async fn import_blob(&self, blob: &[u8]) -> Result<(), KeyfoldError> {
        let _flight = self.begin(Operation::Import)?;
        EncryptedEnvelope::from_bytes(blob)?;

        self.inner.autosave.cancel();
        let previous = std::mem::replace(&mut *self.inner.state.lock().await, SessionState::Locked);
        if let SessionState::Unlocked(unlocked) = previous {
            if unlocked.dirty {
                warn!("discarding unsaved edits of the replaced vault");
            }
            info!("session locked for import");
        }

        self.inner.store.import_blob(blob).await?;
        Ok(())
    }

    fn begin(&self, operation: Operation) -> Result<MutexGuard<'_, ()>, KeyfoldError> {
        self.inner.crypto_flight.try_lock().map_err(|_| {
            debug!(%operation, "rejected while another operation is in flight");
            KeyfoldError::Busy { operation }
        })
    }

    /// Seal and save the current document. Returns whether a write happened.
    ///
    /// The state lock is released while the store writes, so reads and edits
    /// keep working. Callers hold `crypto_flight`, which keeps the session
    /// from being locked or replaced underneath the write. Edits made during
    /// the write stay dirty.
    async fn write_current(&self, only_if_dirty: bool) -> Result<bool, KeyfoldError> {
        let (envelope, generation) = {
            let state = self.inner.state.lock().await;
            let SessionState::Unlocked(unlocked) = &*state else {
                return Err(KeyfoldError::Locked);
            };
            if only_if_dirty && !unlocked.dirty {
                return Ok(false);
            }
            (unlocked.seal()?, unlocked.generation)
        };

        self.inner.store.save(&envelope).await?;

        if let SessionState::Unlocked(unlocked) = &mut *self.inner.state.lock().await {
            if unlocked.generation == generation {
                unlocked.dirty = false;
            }
        }
        Ok(true)
    }

    fn schedule_autosave(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .autosave
            .schedule(self.inner.config.autosave_debounce(), async move {
                if let Some(inner) = weak.upgrade() {
                    Session { inner }.autosave().await;
                }
            });
    }

    async fn autosave(&self) {
        let _flight = self.inner.crypto_flight.lock().await;
        match self.write_current(true).await {
            Ok(true) => debug!("autosave complete"),
            Ok(false) | Err(KeyfoldError::Locked) => {}
            Err(e) => warn!(error = %e, "autosave failed; changes remain unsaved"),
        }
    }
}
