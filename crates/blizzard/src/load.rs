// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blizzard load` command implementation.
//!
//! Loads every configured plugin into a host, applying the configured
//! failure policy, and prints what was registered.

use std::path::PathBuf;

use blizzard_config::BlizzardConfig;
use blizzard_core::BlizzardError;
use blizzard_plugin::{LoadPlan, LoadReport, PluginHost, PluginLoader, SkippedPlugin};
use serde::Serialize;

use crate::inspect::{PluginSummary, print_json};

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub plugins: Vec<PluginSummary>,
    pub skipped: Vec<SkippedPlugin>,
}

/// Loader searching configured paths first, then the built-in defaults.
pub fn loader_for(config: &BlizzardConfig) -> PluginLoader {
    let mut loader = PluginLoader::with_search_paths(config.plugins.search_paths.iter().cloned());
    for path in PluginLoader::new().search_paths() {
        if !loader.search_paths().contains(path) {
            loader.add_search_path(path.clone());
        }
    }
    loader
}

/// Load plan from configuration plus directories given on the command line.
pub fn plan_for(config: &BlizzardConfig, extra_dirs: &[PathBuf]) -> LoadPlan {
    let mut directories = config.plugins.directories.clone();
    directories.extend(extra_dirs.iter().cloned());
    LoadPlan {
        directories,
        autoload: config.plugins.autoload.clone(),
        policy: config.host.on_failure,
    }
}

/// Run the `blizzard load` command.
pub fn run_load(
    config: &BlizzardConfig,
    extra_dirs: &[PathBuf],
    json: bool,
) -> Result<(), BlizzardError> {
    let mut host = PluginHost::with_loader(loader_for(config));
    let plan = plan_for(config, extra_dirs);
    if plan.directories.is_empty() && plan.autoload.is_empty() {
        tracing::warn!("no plugin directories or autoload entries configured");
    }

    // SAFETY: Plugins come from directories and names the operator configured.
    let report = unsafe { host.load_configured(&plan) }?;
    let response = respond(&host, report)?;

    if json {
        return print_json(&response);
    }
    for plugin in &response.plugins {
        print!("{}", plugin.render());
    }
    for skipped in &response.skipped {
        println!("skipped {}: {}", skipped.origin, skipped.reason);
    }
    println!(
        "{} plugin(s) loaded, {} skipped",
        response.plugins.len(),
        response.skipped.len()
    );
    Ok(())
}

fn respond(host: &PluginHost, report: LoadReport) -> Result<LoadResponse, BlizzardError> {
    let plugins = report
        .loaded
        .iter()
        .filter_map(|name| host.plugin(name))
        .map(|entry| PluginSummary::new(&entry.description, &entry.elements, entry.source.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LoadResponse {
        plugins,
        skipped: report.skipped,
    })
}
