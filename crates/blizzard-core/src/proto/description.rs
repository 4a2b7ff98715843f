// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blizzard.plugin.description` metadata messages.

use super::{Any, Descriptor};
use crate::error::BlizzardError;

/// Identity and interface metadata a plugin publishes when it registers.
///
/// Only `name` is required. Everything else may be left at its default.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PluginDescription {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub author: String,
    #[prost(message, repeated, tag = "5")]
    pub methods: Vec<MethodDescription>,
}

/// Interface of one method element: its name and packed parameter/result
/// descriptors.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MethodDescription {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(message, optional, tag = "3")]
    pub parameters: Option<Any>,
    #[prost(message, optional, tag = "4")]
    pub result: Option<Any>,
}

impl ::prost::Name for PluginDescription {
    const NAME: &'static str = "PluginDescription";
    const PACKAGE: &'static str = "blizzard.plugin.description";

    fn type_url() -> String {
        super::any::type_url_for(&Self::full_name())
    }
}

impl PluginDescription {
    /// A description carrying only the plugin's identity.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_method(mut self, method: MethodDescription) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescription> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl MethodDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parameters(mut self, descriptor: &Descriptor) -> Self {
        self.parameters = Some(Any::pack(descriptor));
        self
    }

    pub fn with_result(mut self, descriptor: &Descriptor) -> Self {
        self.result = Some(Any::pack(descriptor));
        self
    }

    /// Unpacked parameter descriptor, if one was declared.
    pub fn parameters_descriptor(&self) -> Result<Option<Descriptor>, BlizzardError> {
        self.parameters.as_ref().map(Any::unpack).transpose()
    }

    /// Unpacked result descriptor, if one was declared.
    pub fn result_descriptor(&self) -> Result<Option<Descriptor>, BlizzardError> {
        self.result.as_ref().map(Any::unpack).transpose()
    }
}
