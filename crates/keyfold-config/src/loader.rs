// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keyfold.toml` > `~/.config/keyfold/keyfold.toml` > `/etc/keyfold/keyfold.toml`
//! with environment variable overrides via `KEYFOLD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeyfoldConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keyfold/keyfold.toml`
/// 3. `~/.config/keyfold/keyfold.toml`
/// 4. `./keyfold.toml`
/// 5. `KEYFOLD_*` environment variables
pub fn load_config() -> Result<KeyfoldConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KeyfoldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfoldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeyfoldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfoldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeyfoldConfig::default()))
        .merge(Toml::file(crate::SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keyfold/keyfold.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(crate::LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `KEYFOLD_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `KEYFOLD_VAULT_KDF_ITERATIONS` is `vault.kdf_iterations`.
fn env_provider() -> Env {
    Env::prefixed("KEYFOLD_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        for section in SECTIONS {
            if let Some(rest) = key
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.into()
    })
}

/// Top-level config sections, matched as env var prefixes.
const SECTIONS: [&str; 3] = ["vault", "storage", "log"];
