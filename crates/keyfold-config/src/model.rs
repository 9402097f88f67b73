// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keyfold vault.
//!
//! Every section denies unknown fields, so a misspelled key is an error
//! rather than a silently ignored setting.

use serde::{Deserialize, Serialize};

/// Default PBKDF2 work factor for newly created vaults.
pub const DEFAULT_KDF_ITERATIONS: u32 = 400_000;

/// Highest work factor an envelope may carry. Envelopes above it are
/// rejected on load, so no vault may be sealed with more.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Floor for the master password length, whatever the configuration says.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Top-level Keyfold configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyfoldConfig {
    /// Vault cryptography and session settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Vault cryptography and session lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// PBKDF2-HMAC-SHA256 iteration count used when creating a vault.
    /// Existing vaults keep the count stored in their envelope.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Minimum master password length in characters.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Quiescence window before an edit burst is re-encrypted and saved.
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// The fixed storage slot holding the envelope.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: default_kdf_iterations(),
            min_password_length: default_min_password_length(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            storage_key: default_storage_key(),
        }
    }
}

impl VaultConfig {
    /// The password length actually enforced: never below
    /// [`MIN_PASSWORD_LENGTH`].
    pub fn effective_min_password_length(&self) -> usize {
        self.min_password_length.max(MIN_PASSWORD_LENGTH)
    }

    /// The autosave window as a [`std::time::Duration`].
    pub fn autosave_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.autosave_debounce_ms)
    }
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

fn default_min_password_length() -> usize {
    MIN_PASSWORD_LENGTH
}

fn default_autosave_debounce_ms() -> u64 {
    800
}

fn default_storage_key() -> String {
    "keyfold.vault".to_string()
}

/// Durable storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("keyfold").join("keyfold.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("keyfold.db"))
        .display()
        .to_string()
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
