// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the vault core and its environment.

pub mod store;

pub use store::KeyValueStore;
