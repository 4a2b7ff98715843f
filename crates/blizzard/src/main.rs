// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blizzard - a host for bus plugins.
//!
//! This is the binary entry point: it loads configuration, installs the
//! tracing subscriber, and dispatches to the subcommands.

mod describe;
mod inspect;
mod load;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Blizzard - load, inspect, and describe bus plugins.
#[derive(Parser, Debug)]
#[command(name = "blizzard", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the standard hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the configured plugins and list what they expose.
    Load {
        /// Additional directory to load every plugin library from.
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
        /// Output structured JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load a single plugin library and show its registration.
    Inspect {
        /// Path to the shared library.
        path: PathBuf,
        /// Output structured JSON.
        #[arg(long)]
        json: bool,
    },
    /// Build a plugin description from a plugin.toml manifest.
    Describe {
        /// Path to the manifest.
        manifest: PathBuf,
        /// Write the encoded description to this file.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output structured JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => blizzard_config::load_and_validate_path(path),
        None => blizzard_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            blizzard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.host.log_level);

    let result = match cli.command {
        Some(Commands::Load { dirs, json }) => load::run_load(&config, &dirs, json),
        Some(Commands::Inspect { path, json }) => inspect::run_inspect(&config, &path, json),
        Some(Commands::Describe {
            manifest,
            out,
            json,
        }) => describe::run_describe(&manifest, out.as_deref(), json),
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("blizzard: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &blizzard_config::BlizzardConfig) -> Result<(), blizzard_core::BlizzardError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| blizzard_core::BlizzardError::Config(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "blizzard={level},blizzard_plugin={level},blizzard_core={level},blizzard_config={level},warn",
            level = log_level.to_ascii_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn load_accepts_repeated_dirs() {
        let cli = Cli::try_parse_from(["blizzard", "load", "--dir", "/a", "--dir", "/b"]).unwrap();
        match cli.command {
            Some(Commands::Load { dirs, json }) => {
                assert_eq!(dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["blizzard", "config", "--config", "/tmp/b.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));
        assert!(matches!(cli.command, Some(Commands::Config)));
    }

    #[test]
    fn describe_takes_out_and_json() {
        let cli = Cli::try_parse_from([
            "blizzard",
            "describe",
            "plugin.toml",
            "--out",
            "plugin.pb",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Describe {
                manifest,
                out,
                json,
            }) => {
                assert_eq!(manifest, PathBuf::from("plugin.toml"));
                assert_eq!(out, Some(PathBuf::from("plugin.pb")));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_config_renders() {
        assert!(print_config(&blizzard_config::BlizzardConfig::default()).is_ok());
    }
}
