// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key-value byte stores for the Keyfold vault.
//!
//! [`SqliteStore`] is the production backend: a WAL-mode SQLite file with
//! embedded migrations and a single-writer connection via `tokio-rusqlite`.
//! [`MemoryStore`] keeps slots in a map for tests and throwaway sessions.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
