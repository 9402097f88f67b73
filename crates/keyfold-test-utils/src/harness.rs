// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session fixtures for integration tests.
//!
//! Production iteration counts make every unlock take hundreds of
//! milliseconds, so fixtures use [`fast_vault_config`]. Envelopes still record
//! the count they were sealed with, exactly as in production.

use std::sync::Arc;
use std::time::Duration;

use keyfold_config::{KeyfoldConfig, StorageConfig, VaultConfig};
use keyfold_core::KeyfoldError;
use keyfold_vault::Session;
use secrecy::SecretString;

use crate::faulty_store::FaultyStore;

/// Master password used by fixtures unless overridden.
pub const DEFAULT_PASSWORD: &str = "correcthorse";

/// Vault settings with a cheap KDF. Not accepted by config validation, which
/// is the point: only tests may use it.
pub fn fast_vault_config() -> VaultConfig {
    VaultConfig {
        kdf_iterations: 1_000,
        ..VaultConfig::default()
    }
}

pub fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

/// Builder for [`SessionHarness`].
pub struct SessionHarnessBuilder {
    config: VaultConfig,
    password: Option<String>,
}

impl SessionHarnessBuilder {
    fn new() -> Self {
        Self {
            config: fast_vault_config(),
            password: Some(DEFAULT_PASSWORD.to_string()),
        }
    }

    /// Override the autosave quiescence window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.config.autosave_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.config.kdf_iterations = iterations;
        self
    }

    /// Create the vault with `password` during `build`.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Leave the store empty and the session locked.
    pub fn without_vault(mut self) -> Self {
        self.password = None;
        self
    }

    pub async fn build(self) -> Result<SessionHarness, KeyfoldError> {
        let store = Arc::new(FaultyStore::new());
        let session = Session::new(Arc::clone(&store), self.config);
        if let Some(password) = &self.password {
            let password = secret(password);
            session.create_vault(&password, &password).await?;
        }
        Ok(SessionHarness {
            session,
            store,
            password: self.password,
        })
    }
}

/// A session over a [`FaultyStore`], optionally with a vault already created
/// and unlocked.
pub struct SessionHarness {
    pub session: Session<Arc<FaultyStore>>,
    pub store: Arc<FaultyStore>,
    password: Option<String>,
}

impl SessionHarness {
    pub fn builder() -> SessionHarnessBuilder {
        SessionHarnessBuilder::new()
    }

    /// The master password the vault was created with.
    pub fn password(&self) -> SecretString {
        secret(self.password.as_deref().unwrap_or(DEFAULT_PASSWORD))
    }

    /// A second session sharing this harness's store, as after a restart.
    pub fn reopen(&self) -> Session<Arc<FaultyStore>> {
        Session::new(Arc::clone(&self.store), self.session.config().clone())
    }
}

/// Configuration pointing at a fresh SQLite file in a temporary directory.
/// The directory is removed when this value is dropped.
pub struct TempSqlite {
    pub config: KeyfoldConfig,
    _dir: tempfile::TempDir,
}

impl TempSqlite {
    pub fn new() -> Result<Self, KeyfoldError> {
        let dir = tempfile::TempDir::new().map_err(KeyfoldError::storage)?;
        let database_path = dir.path().join("keyfold.db").to_string_lossy().into_owned();
        let config = KeyfoldConfig {
            vault: fast_vault_config(),
            storage: StorageConfig {
                database_path,
                wal_mode: true,
            },
            ..KeyfoldConfig::default()
        };
        Ok(Self { config, _dir: dir })
    }
}
