// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protobuf messages exchanged across the plugin boundary.
//!
//! The plugin description and the schema/value types are plain `prost`
//! messages. They travel as encoded bytes over the C ABI and as owned values
//! through the Rust API.

pub mod any;
pub mod description;
pub mod descriptor;
pub mod value;

pub use any::Any;
pub use description::{MethodDescription, PluginDescription};
pub use descriptor::{BasicType, Descriptor};
pub use value::Value;
