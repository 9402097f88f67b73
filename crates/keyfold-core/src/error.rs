// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyfold vault.

use strum::{Display, EnumString};
use thiserror::Error;

/// Operations that take the session's single-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    CreateVault,
    Unlock,
    Persist,
    Import,
}

/// The primary error type used across all Keyfold crates.
///
/// Every variant is recoverable at the presentation boundary: the caller
/// reports it and may retry. Messages never include secret material.
#[derive(Debug, Error)]
pub enum KeyfoldError {
    /// Bad user input (short or mismatched password, empty folder name,
    /// entry without a folder). No state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unlock attempted while nothing is stored.
    #[error("no vault exists -- create one first")]
    NoVault,

    /// Unlock failed: the password is incorrect or the stored data is corrupt.
    #[error("incorrect password or corrupted vault")]
    Authentication,

    /// AEAD open failed. Produced by the envelope codec only; the session
    /// surfaces it as [`KeyfoldError::Authentication`].
    #[error("decryption failed")]
    Decryption,

    /// An import blob is not a well-formed envelope. Storage is untouched.
    #[error("import format error: {0}")]
    ImportFormat(String),

    /// The operation requires an unlocked session.
    #[error("vault is locked")]
    Locked,

    /// Another operation of the same class is already in flight.
    #[error("{operation} already in progress")]
    Busy { operation: Operation },

    /// Durable store failure (database connection, query, I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cryptographic primitive failure other than authentication
    /// (RNG exhaustion, invalid parameters).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Configuration errors surfaced outside of the diagnostic renderer.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeyfoldError {
    /// Wrap any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        KeyfoldError::Storage {
            source: Box::new(err),
        }
    }
}
