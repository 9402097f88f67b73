// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every open. Refinery tracks applied versions in `refinery_schema_history`.

use keyfold_core::KeyfoldError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), KeyfoldError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(KeyfoldError::storage)?;
    Ok(())
}
