// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Blizzard plugin host.
//!
//! This crate defines the plugin registration contract: the [`Plugin`]
//! capability trait, the [`PluginRegistration`] a plugin produces, the bus
//! [`DataElement`]s it exposes, and the protobuf messages (plugin
//! description, schema descriptors, values) that travel with it.

pub mod error;
pub mod proto;
pub mod registration;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::BlizzardError;
pub use proto::{Any, BasicType, Descriptor, MethodDescription, PluginDescription, Value};
pub use registration::{DataElement, DataElementList, PluginRegistration};
pub use traits::{ElementHandler, Plugin};
pub use types::{ElementType, FailurePolicy, PluginSource, SubscribeAction};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn element_type_round_trips_through_abi_and_text() {
        for variant in [
            ElementType::Property,
            ElementType::Table,
            ElementType::Event,
            ElementType::Method,
        ] {
            assert_eq!(ElementType::from_raw(variant.as_raw()), Some(variant));
            let parsed = ElementType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(parsed, variant);
        }
        assert_eq!(ElementType::from_raw(0), None);
        assert_eq!(ElementType::from_raw(99), None);
    }

    #[test]
    fn element_type_serializes_lowercase() {
        let json = serde_json::to_string(&ElementType::Method).expect("should serialize");
        assert_eq!(json, "\"method\"");
    }

    struct Counter;

    impl ElementHandler for Counter {}

    #[test]
    fn closures_implement_plugin() {
        let calls = AtomicUsize::new(0);
        let plugin = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(PluginRegistration::new(
                DataElementList::new(vec![DataElement::event("Device.Tick!", Arc::new(Counter))]),
                PluginDescription::named("ticker"),
            ))
        };
        let first = plugin.register().expect("registration");
        let second = plugin.register().expect("registration");
        assert_eq!(first.element_count(), 1);
        assert_eq!(second.element_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unavailable_plugin_returns_none() {
        let plugin = || -> Option<PluginRegistration> { None };
        assert!(Plugin::register(&plugin).is_none());
    }
}
