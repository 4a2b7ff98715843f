// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest parsing from `plugin.toml` files.
//!
//! A manifest names the plugin and declares its methods with parameter and
//! result schemas. It is the source for the plugin's [`PluginDescription`]:
//!
//! ```toml
//! [plugin]
//! name = "thermostat"
//! version = "0.1.0"
//!
//! [[methods]]
//! name = "Device.Thermostat.SetTarget()"
//! parameters_schema = { kind = "object", object = { properties = {
//!     celsius = { kind = "basic", basic = "integer" },
//! } } }
//! result_schema = { kind = "basic", basic = "string" }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use blizzard_core::registration::validate_element_name;
use blizzard_core::{BasicType, BlizzardError, Descriptor, MethodDescription, PluginDescription};
use serde::{Deserialize, Serialize};

/// Parsed plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    /// Semantic version string.
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub methods: Vec<MethodManifest>,
}

/// One `[[methods]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodManifest {
    /// Bus name of the method element, e.g. `Device.Reboot()`.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters_schema: Option<SchemaSpec>,
    #[serde(default)]
    pub result_schema: Option<SchemaSpec>,
}

/// Schema as written in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaSpec {
    Basic { basic: BasicName },
    List { list: ListSpec },
    Object { object: ObjectSpec },
    Optional { optional: OptionalSpec },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSpec {
    pub items: Box<SchemaSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalSpec {
    pub item: Box<SchemaSpec>,
}

/// Basic type names accepted in manifests.
///
/// Sized and unsigned integer names all map to `integer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicName {
    Boolean,
    #[serde(
        alias = "int",
        alias = "int8",
        alias = "int16",
        alias = "int32",
        alias = "int64",
        alias = "sint32",
        alias = "sint64",
        alias = "uint8",
        alias = "uint16",
        alias = "uint32",
        alias = "uint64"
    )]
    Integer,
    Double,
    String,
    Bytes,
    #[serde(alias = "object")]
    AnyObject,
}

impl From<BasicName> for BasicType {
    fn from(name: BasicName) -> Self {
        match name {
            BasicName::Boolean => BasicType::Boolean,
            BasicName::Integer => BasicType::Integer,
            BasicName::Double => BasicType::Double,
            BasicName::String => BasicType::String,
            BasicName::Bytes => BasicType::Bytes,
            BasicName::AnyObject => BasicType::AnyObject,
        }
    }
}

impl SchemaSpec {
    pub fn to_descriptor(&self) -> Descriptor {
        match self {
            SchemaSpec::Basic { basic } => Descriptor::basic((*basic).into()),
            SchemaSpec::List { list } => Descriptor::list(list.items.to_descriptor()),
            SchemaSpec::Object { object } => Descriptor::object(
                object
                    .properties
                    .iter()
                    .map(|(key, spec)| (key.as_str(), spec.to_descriptor())),
            ),
            SchemaSpec::Optional { optional } => {
                Descriptor::optional(optional.item.to_descriptor())
            }
        }
    }
}

impl PluginManifest {
    /// Build the plugin description, packing schemas into `Any`.
    pub fn into_description(self) -> PluginDescription {
        let mut description = PluginDescription::named(self.name).with_version(self.version);
        if let Some(text) = self.description {
            description = description.with_description(text);
        }
        description.author = self.author.unwrap_or_default();
        for method in self.methods {
            let mut entry = MethodDescription::new(method.name);
            entry.description = method.description.unwrap_or_default();
            if let Some(schema) = &method.parameters_schema {
                entry = entry.with_parameters(&schema.to_descriptor());
            }
            if let Some(schema) = &method.result_schema {
                entry = entry.with_result(&schema.to_descriptor());
            }
            description = description.with_method(entry);
        }
        description
    }
}

#[derive(Debug, Deserialize)]
struct PluginManifestFile {
    plugin: PluginSection,
    #[serde(default)]
    methods: Vec<MethodManifest>,
}

#[derive(Debug, Deserialize)]
struct PluginSection {
    name: String,
    version: String,
    description: Option<String>,
    author: Option<String>,
}

/// Parse a plugin manifest from TOML content.
///
/// Validates that the name is non-empty, the version is valid semver, and
/// method names are well formed and unique.
pub fn parse_plugin_manifest(toml_content: &str) -> Result<PluginManifest, BlizzardError> {
    let file: PluginManifestFile = toml::from_str(toml_content)
        .map_err(|e| BlizzardError::Config(format!("invalid plugin manifest: {e}")))?;
    let section = file.plugin;

    if section.name.trim().is_empty() {
        return Err(BlizzardError::Config(
            "plugin manifest: name must not be empty".to_string(),
        ));
    }
    semver::Version::parse(&section.version).map_err(|e| {
        BlizzardError::Config(format!(
            "plugin manifest: invalid version '{}': {e}",
            section.version
        ))
    })?;

    let mut seen = HashSet::new();
    for method in &file.methods {
        validate_element_name(&method.name)
            .map_err(|e| BlizzardError::Config(format!("plugin manifest: {e}")))?;
        if !seen.insert(method.name.as_str()) {
            return Err(BlizzardError::Config(format!(
                "plugin manifest: method '{}' is declared more than once",
                method.name
            )));
        }
    }

    Ok(PluginManifest {
        name: section.name,
        version: section.version,
        description: section.description,
        author: section.author,
        methods: file.methods,
    })
}

/// Read and parse a `plugin.toml` file.
pub fn load_plugin_manifest(path: impl AsRef<Path>) -> Result<PluginManifest, BlizzardError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        BlizzardError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    parse_plugin_manifest(&content)
}
