// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyfold: a client-side password vault.
//!
//! Folders of credentials are kept in one document, encrypted with a key
//! stretched from the master password, and stored as a single envelope in a
//! local SQLite file. Presentation code opens a [`Session`] and drives the
//! whole lifecycle through it:
//!
//! ```no_run
//! # async fn run() -> Result<(), keyfold::KeyfoldError> {
//! use keyfold::{FolderColor, SecretString};
//!
//! let config = keyfold::load_config()?;
//! keyfold::init_tracing(&config.log.level)?;
//! let session = keyfold::open_session(&config).await?;
//!
//! let password = SecretString::from("correcthorse".to_string());
//! if session.vault_exists().await? {
//!     session.unlock(&password).await?;
//! } else {
//!     session.create_vault(&password, &password).await?;
//! }
//! session.mutate(|v| v.add_person("Alice", FolderColor::Blue)).await?;
//! session.lock().await?;
//! # Ok(())
//! # }
//! ```

use keyfold_storage::SqliteStore;
use tracing::info;

pub use keyfold_config::{KeyfoldConfig, LogConfig, StorageConfig, VaultConfig};
pub use keyfold_core::{KeyValueStore, KeyfoldError, Operation};
pub use keyfold_storage::MemoryStore;
pub use secrecy::SecretString;
pub use keyfold_vault::{
    EncryptedEnvelope, Entry, EntryDraft, FolderColor, Person, PlainVault, Session, SessionStatus,
};

/// A session backed by the configured SQLite file.
pub type SqliteSession = Session<SqliteStore>;

/// Load and validate configuration from the standard file hierarchy and
/// `KEYFOLD_*` environment variables.
///
/// Diagnostics are rendered to stderr; the returned error only counts them.
pub fn load_config() -> Result<KeyfoldConfig, KeyfoldError> {
    keyfold_config::load_and_validate().map_err(|errors| {
        keyfold_config::render_errors(&errors);
        KeyfoldError::Config(format!("{} configuration error(s)", errors.len()))
    })
}

/// Open the configured database and return a locked session over it.
pub async fn open_session(config: &KeyfoldConfig) -> Result<SqliteSession, KeyfoldError> {
    let store = SqliteStore::open(&config.storage).await?;
    info!(
        database = %config.storage.database_path,
        slot = %config.vault.storage_key,
        "vault storage opened"
    );
    Ok(Session::new(store, config.vault.clone()))
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_tracing(level: &str) -> Result<(), KeyfoldError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyfold={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| KeyfoldError::Internal(format!("tracing already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_tracing_init_is_rejected() {
        let _ = init_tracing("debug");
        assert!(matches!(
            init_tracing("debug"),
            Err(KeyfoldError::Internal(_))
        ));
    }
}
