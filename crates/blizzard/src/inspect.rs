// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blizzard inspect` command implementation, plus the plugin summary shared
//! by the other commands.

use std::path::Path;

use blizzard_config::BlizzardConfig;
use blizzard_core::{BlizzardError, DataElementList, ElementType, PluginDescription, PluginSource};
use serde::Serialize;

use crate::load::loader_for;

/// Structured plugin summary for `--json` mode.
#[derive(Debug, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub description: String,
    pub source: PluginSource,
    pub elements: Vec<ElementSummary>,
    pub methods: Vec<MethodSummary>,
}

#[derive(Debug, Serialize)]
pub struct ElementSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
}

#[derive(Debug, Serialize)]
pub struct MethodSummary {
    pub name: String,
    pub description: String,
    pub parameters: Option<String>,
    pub result: Option<String>,
}

impl PluginSummary {
    pub fn new(
        description: &PluginDescription,
        elements: &DataElementList,
        source: PluginSource,
    ) -> Result<Self, BlizzardError> {
        let methods = description
            .methods
            .iter()
            .map(|method| {
                Ok(MethodSummary {
                    name: method.name.clone(),
                    description: method.description.clone(),
                    parameters: method.parameters_descriptor()?.map(|d| d.summary()),
                    result: method.result_descriptor()?.map(|d| d.summary()),
                })
            })
            .collect::<Result<Vec<_>, BlizzardError>>()?;

        Ok(Self {
            name: description.name.clone(),
            version: description.version.clone(),
            description: description.description.clone(),
            source,
            elements: elements
                .iter()
                .map(|element| ElementSummary {
                    name: element.name().to_string(),
                    element_type: element.element_type(),
                })
                .collect(),
            methods,
        })
    }

    /// Human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let version = if self.version.is_empty() {
            String::new()
        } else {
            format!(" {}", self.version)
        };
        out.push_str(&format!("{}{version} ({})\n", self.name, self.source));
        if !self.description.is_empty() {
            out.push_str(&format!("  {}\n", self.description));
        }
        if self.elements.is_empty() {
            out.push_str("  no exposed elements\n");
        }
        for element in &self.elements {
            out.push_str(&format!("  {:<8} {}\n", element.element_type, element.name));
        }
        for method in &self.methods {
            out.push_str(&format!(
                "  {}({}) -> {}\n",
                method.name.trim_end_matches("()"),
                method.parameters.as_deref().unwrap_or(""),
                method.result.as_deref().unwrap_or("()")
            ));
        }
        out
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), BlizzardError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| BlizzardError::Config(format!("failed to render JSON: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Run the `blizzard inspect` command.
pub fn run_inspect(config: &BlizzardConfig, path: &Path, json: bool) -> Result<(), BlizzardError> {
    let loader = loader_for(config);
    // SAFETY: The operator named this library explicitly on the command line.
    let loaded = unsafe { loader.load_from_path(path) }?;
    let summary = PluginSummary::new(
        loaded.registration.description(),
        loaded.registration.elements(),
        loaded.source.clone(),
    )?;

    if json {
        print_json(&summary)
    } else {
        print!("{}", summary.render());
        Ok(())
    }
}
