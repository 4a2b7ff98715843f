// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./blizzard.toml` > `~/.config/blizzard/blizzard.toml` > `/etc/blizzard/blizzard.toml`
//! with environment variable overrides via `BLIZZARD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BlizzardConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/blizzard/blizzard.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "blizzard.toml";

/// Per-user configuration file under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("blizzard/blizzard.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/blizzard/blizzard.toml` (system-wide)
/// 3. `~/.config/blizzard/blizzard.toml` (user XDG config)
/// 4. `./blizzard.toml` (local directory)
/// 5. `BLIZZARD_*` environment variables
pub fn load_config() -> Result<BlizzardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BlizzardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BlizzardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BlizzardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BlizzardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BlizzardConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `BLIZZARD_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `log_level` and `search_paths` contain underscores.
fn env_provider() -> Env {
    Env::prefixed("BLIZZARD_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a config key path.
pub fn map_env_key(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("host_") {
        format!("host.{rest}")
    } else if let Some(rest) = key.strip_prefix("plugins_") {
        format!("plugins.{rest}")
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_only_rewrite_leading_section() {
        assert_eq!(map_env_key("plugins_host_dirs"), "plugins.host_dirs");
        assert_eq!(map_env_key("host_plugins_x"), "host.plugins_x");
        assert_eq!(map_env_key("other_host_x"), "other_host_x");
    }

    #[test]
    fn env_keys_keep_underscores_inside_names() {
        assert_eq!(map_env_key("host_log_level"), "host.log_level");
        assert_eq!(map_env_key("host_on_failure"), "host.on_failure");
        assert_eq!(map_env_key("plugins_search_paths"), "plugins.search_paths");
        assert_eq!(map_env_key("plugins_autoload"), "plugins.autoload");
    }

    #[test]
    fn user_config_path_ends_with_blizzard_toml() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("blizzard/blizzard.toml"));
        }
    }
}
