// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted vault core for Keyfold.
//!
//! A master password is stretched with PBKDF2 into an AES-256-GCM key that
//! seals the whole vault document into a single envelope. The envelope is the
//! only thing ever written to storage. [`Session`] owns the locked/unlocked
//! lifecycle and batches edits into debounced saves.

mod autosave;
pub mod crypto;
pub mod envelope;
pub mod kdf;
pub mod model;
pub mod session;
pub mod store;

pub use envelope::{ENVELOPE_VERSION, EncryptedEnvelope};
pub use model::{Entry, EntryDraft, FolderColor, Person, PlainVault};
pub use session::{Session, SessionStatus};
pub use store::VaultStore;
