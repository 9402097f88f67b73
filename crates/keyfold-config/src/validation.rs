// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{KeyfoldConfig, MAX_KDF_ITERATIONS, MIN_PASSWORD_LENGTH};

/// Lowest PBKDF2 work factor accepted for new vaults.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Accepted range for the autosave quiescence window.
pub const AUTOSAVE_DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 50..=60_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &KeyfoldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !(MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&config.vault.kdf_iterations) {
        fail(format!(
            "vault.kdf_iterations must be between {MIN_KDF_ITERATIONS} and {MAX_KDF_ITERATIONS}, got {}",
            config.vault.kdf_iterations
        ));
    }

    if config.vault.min_password_length < MIN_PASSWORD_LENGTH {
        fail(format!(
            "vault.min_password_length must be at least {MIN_PASSWORD_LENGTH}, got {}",
            config.vault.min_password_length
        ));
    }

    if !AUTOSAVE_DEBOUNCE_RANGE_MS.contains(&config.vault.autosave_debounce_ms) {
        fail(format!(
            "vault.autosave_debounce_ms must be between {} and {}, got {}",
            AUTOSAVE_DEBOUNCE_RANGE_MS.start(),
            AUTOSAVE_DEBOUNCE_RANGE_MS.end(),
            config.vault.autosave_debounce_ms
        ));
    }

    if config.vault.storage_key.trim().is_empty() {
        fail("vault.storage_key must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&KeyfoldConfig::default()).is_ok());
    }

    #[test]
    fn low_iteration_count_fails_validation() {
        let mut config = KeyfoldConfig::default();
        config.vault.kdf_iterations = 1_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "kdf_iterations"));
    }

    #[test]
    fn iteration_count_above_envelope_limit_fails_validation() {
        let mut config = KeyfoldConfig::default();
        config.vault.kdf_iterations = MAX_KDF_ITERATIONS + 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "kdf_iterations"));

        config.vault.kdf_iterations = MAX_KDF_ITERATIONS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn short_min_password_length_fails_validation() {
        let mut config = KeyfoldConfig::default();
        config.vault.min_password_length = 4;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "min_password_length"));
    }

    #[test]
    fn debounce_out_of_range_fails_validation() {
        let mut config = KeyfoldConfig::default();
        config.vault.autosave_debounce_ms = 10;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "autosave_debounce_ms"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = KeyfoldConfig::default();
        config.vault.storage_key = "  ".to_string();
        config.storage.database_path = String::new();
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_error(&errors, "storage_key"));
        assert!(has_error(&errors, "database_path"));
        assert!(has_error(&errors, "log.level"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = KeyfoldConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
