// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: known log levels, non-empty
//! paths, and well-formed, unique autoload names.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::diagnostic::ConfigError;
use crate::model::BlizzardConfig;

/// Log levels accepted by `host.log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns all collected errors rather than failing on the first one.
pub fn validate_config(config: &BlizzardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.host.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "host.log_level `{}` is not one of: {}",
                config.host.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    check_paths("plugins.search_paths", &config.plugins.search_paths, &mut errors);
    check_paths("plugins.directories", &config.plugins.directories, &mut errors);

    let mut seen = HashSet::new();
    for (i, name) in config.plugins.autoload.iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("plugins.autoload[{i}] must not be empty"),
            });
            continue;
        }
        if name.contains('/') || name.contains('\\') {
            errors.push(ConfigError::Validation {
                message: format!(
                    "plugins.autoload[{i}] `{name}` must be a plugin name, not a path; use plugins.directories for paths"
                ),
            });
        }
        if !seen.insert(name.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate plugin `{name}` in plugins.autoload"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_paths(key: &str, paths: &[PathBuf], errors: &mut Vec<ConfigError>) {
    for (i, path) in paths.iter().enumerate() {
        if path.as_os_str().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key}[{i}] must not be empty"),
            });
        }
    }
}
