// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Keyfold vault.
//!
//! TOML configuration with strict key checking (`deny_unknown_fields`), XDG
//! file hierarchy lookup, `KEYFOLD_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = keyfold_config::load_and_validate().expect("config errors");
//! println!("iterations: {}", config.vault.kdf_iterations);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    DEFAULT_KDF_ITERATIONS, KeyfoldConfig, LogConfig, MAX_KDF_ITERATIONS, MIN_PASSWORD_LENGTH,
    StorageConfig, VaultConfig,
};

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keyfold.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keyfold/keyfold.toml";

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<KeyfoldConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeyfoldConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the TOML files of the hierarchy so diagnostics can point into them.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("keyfold/keyfold.toml"));
    }
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(LOCAL_CONFIG_FILE))
            .unwrap_or_else(|_| LOCAL_CONFIG_FILE.into()),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
