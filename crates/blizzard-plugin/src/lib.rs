// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registration ABI, dynamic loader, host registry, and manifest parser.
//!
//! Plugins built as shared libraries expose their registration through the C
//! ABI in [`abi`], usually via [`export_plugin!`]. The host side loads them
//! with [`PluginLoader`] and routes bus operations through [`PluginHost`].

pub mod abi;
pub mod export;
pub mod ffi;
pub mod host;
pub mod loader;
pub mod manifest;

pub use blizzard_core::Plugin;
pub use host::{LoadPlan, LoadReport, PluginEntry, PluginHost, SkippedPlugin};
pub use loader::{LoadedPlugin, PluginLoader, library_file_name};
pub use manifest::{PluginManifest, SchemaSpec, load_plugin_manifest, parse_plugin_manifest};
