// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by plugins and the host.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of endpoint a data element exposes on the bus.
///
/// The numeric values are part of the C registration ABI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// A readable (and optionally writable) value.
    Property,
    /// A multi-instance table supporting row add/remove.
    Table,
    /// An event that consumers may subscribe to.
    Event,
    /// A remotely invocable method.
    Method,
}

impl ElementType {
    /// ABI discriminant for this element type.
    pub fn as_raw(self) -> u32 {
        match self {
            ElementType::Property => 1,
            ElementType::Table => 2,
            ElementType::Event => 3,
            ElementType::Method => 4,
        }
    }

    /// Parse an ABI discriminant, returning `None` for unknown values.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(ElementType::Property),
            2 => Some(ElementType::Table),
            3 => Some(ElementType::Event),
            4 => Some(ElementType::Method),
            _ => None,
        }
    }
}

/// Where a registered plugin came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PluginSource {
    /// Compiled into the host and registered through the `Plugin` trait.
    Static,
    /// Loaded from a shared library at runtime.
    Dynamic { path: PathBuf },
}

impl std::fmt::Display for PluginSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginSource::Static => write!(f, "static"),
            PluginSource::Dynamic { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Action requested on an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SubscribeAction {
    Subscribe,
    Unsubscribe,
}

/// What the host does when a plugin fails to load or register.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and continue without that plugin.
    #[default]
    Skip,
    /// Abort startup on the first failure.
    Abort,
}
