// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Blizzard plugin host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use blizzard_core::FailurePolicy;
use serde::{Deserialize, Serialize};

/// Top-level Blizzard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlizzardConfig {
    /// Host process settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Plugin discovery settings.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// Host process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// What to do when a plugin fails to load or register.
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            on_failure: FailurePolicy::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Plugin discovery configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Extra directories searched when loading plugins by name.
    /// Searched before the built-in defaults.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Directories whose shared libraries are all loaded at startup.
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// Plugins loaded by name at startup, e.g. `thermostat`.
    #[serde(default)]
    pub autoload: Vec<String>,
}
