// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Blizzard plugin host.

use thiserror::Error;

/// The primary error type used across plugin registration, loading, and dispatch.
#[derive(Debug, Error)]
pub enum BlizzardError {
    /// Configuration or manifest errors (invalid TOML, bad field values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The plugin's registration function returned nothing.
    #[error("registration unavailable for plugin `{plugin}`")]
    RegistrationUnavailable { plugin: String },

    /// The registration was returned but is not internally consistent.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// The plugin was built against a different registration ABI.
    #[error("ABI version mismatch: expected {expected}, got {actual}")]
    AbiMismatch { expected: u32, actual: u32 },

    /// The shared library could not be opened.
    #[error("failed to load plugin library {path}: {message}")]
    Load { path: String, message: String },

    /// A required exported symbol is missing from the library.
    #[error("missing plugin entry point `{symbol}` in {path}")]
    MissingSymbol { symbol: String, path: String },

    /// A plugin with the same name is already registered.
    #[error("plugin already registered: {0}")]
    DuplicatePlugin(String),

    /// A data element with the same name is already exposed.
    #[error("data element `{element}` already registered by plugin `{owner}`")]
    DuplicateElement { element: String, owner: String },

    /// No plugin with the given name is registered.
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    /// No data element with the given name is exposed.
    #[error("data element not found: {0}")]
    ElementNotFound(String),

    /// The element does not implement the requested callback.
    #[error("operation `{operation}` is not supported by element `{element}`")]
    Unsupported { element: String, operation: String },

    /// A value does not conform to its declared schema.
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// A protobuf payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// An element handler reported a failure.
    #[error("handler error in `{element}`: {message}")]
    Handler { element: String, message: String },
}

impl BlizzardError {
    /// Shorthand for [`BlizzardError::Unsupported`].
    pub fn unsupported(element: &str, operation: &str) -> Self {
        Self::Unsupported {
            element: element.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Shorthand for [`BlizzardError::Handler`].
    pub fn handler(element: &str, message: impl Into<String>) -> Self {
        Self::Handler {
            element: element.to_string(),
            message: message.into(),
        }
    }
}
