// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blizzard describe` command implementation.
//!
//! Turns a `plugin.toml` manifest into the encoded `PluginDescription` a
//! plugin embeds in its registration.

use std::path::Path;

use blizzard_core::{BlizzardError, DataElementList, PluginDescription, PluginSource};
use blizzard_plugin::load_plugin_manifest;
use prost::Message;

use crate::inspect::{PluginSummary, print_json};

/// Parse `manifest` and build its description.
pub fn describe(manifest: &Path) -> Result<PluginDescription, BlizzardError> {
    let description = load_plugin_manifest(manifest)?.into_description();
    tracing::debug!(
        plugin = %description.name,
        methods = description.methods.len(),
        "description built"
    );
    Ok(description)
}

/// Run the `blizzard describe` command.
pub fn run_describe(manifest: &Path, out: Option<&Path>, json: bool) -> Result<(), BlizzardError> {
    let description = describe(manifest)?;

    if let Some(out) = out {
        std::fs::write(out, description.encode_to_vec()).map_err(|e| {
            BlizzardError::Config(format!("failed to write {}: {e}", out.display()))
        })?;
        tracing::info!(path = %out.display(), "description written");
    }

    let summary = PluginSummary::new(&description, &DataElementList::empty(), PluginSource::Static)?;
    if json {
        print_json(&summary)
    } else {
        print!("{}", summary.render());
        Ok(())
    }
}
