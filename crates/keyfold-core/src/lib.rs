// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyfold password vault.
//!
//! Provides the error taxonomy shared by every crate in the workspace and the
//! [`KeyValueStore`] trait behind which the durable storage slot lives.

pub mod error;
pub mod traits;

pub use error::{KeyfoldError, Operation};
pub use traits::KeyValueStore;
