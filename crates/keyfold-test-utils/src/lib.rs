// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keyfold integration tests.
//!
//! # Components
//!
//! - [`FaultyStore`] - in-memory store that can fail or stall writes on demand
//! - [`SessionHarness`] - a session over a `FaultyStore` with a fast KDF
//! - [`TempSqlite`] - a throwaway on-disk configuration for SQLite tests

pub mod faulty_store;
pub mod harness;

pub use faulty_store::FaultyStore;
pub use harness::{DEFAULT_PASSWORD, SessionHarness, TempSqlite, fast_vault_config, secret};
