// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blizzard.descriptor` schema messages.
//!
//! A [`Descriptor`] describes the shape of a [`Value`](super::Value): a basic
//! scalar, a homogeneous list, an object with named properties, or an
//! optional wrapper around another descriptor.

use std::collections::BTreeMap;

/// Scalar types a basic descriptor may name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BasicType {
    Unspecified = 0,
    Boolean = 1,
    Integer = 2,
    Double = 3,
    String = 4,
    Bytes = 5,
    AnyObject = 6,
}

impl BasicType {
    /// Lowercase name used in manifests and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            BasicType::Unspecified => "unspecified",
            BasicType::Boolean => "boolean",
            BasicType::Integer => "integer",
            BasicType::Double => "double",
            BasicType::String => "string",
            BasicType::Bytes => "bytes",
            BasicType::AnyObject => "any_object",
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Descriptor {
    #[prost(oneof = "descriptor::Kind", tags = "1, 2, 3, 4")]
    pub kind: Option<descriptor::Kind>,
}

pub mod descriptor {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(enumeration = "super::BasicType", tag = "1")]
        Basic(i32),
        #[prost(message, tag = "2")]
        List(super::List),
        #[prost(message, tag = "3")]
        Object(super::Object),
        #[prost(message, tag = "4")]
        Optional(super::Optional),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct List {
    #[prost(message, optional, boxed, tag = "1")]
    pub items: Option<Box<Descriptor>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Object {
    #[prost(btree_map = "string, message", tag = "1")]
    pub properties: BTreeMap<String, Descriptor>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Optional {
    #[prost(message, optional, boxed, tag = "1")]
    pub item: Option<Box<Descriptor>>,
}

impl ::prost::Name for Descriptor {
    const NAME: &'static str = "Descriptor";
    const PACKAGE: &'static str = "blizzard.descriptor";

    fn type_url() -> String {
        super::any::type_url_for(&Self::full_name())
    }
}

impl Descriptor {
    pub fn basic(basic: BasicType) -> Self {
        Self {
            kind: Some(descriptor::Kind::Basic(basic as i32)),
        }
    }

    pub fn list(items: Descriptor) -> Self {
        Self {
            kind: Some(descriptor::Kind::List(List {
                items: Some(Box::new(items)),
            })),
        }
    }

    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Descriptor)>,
    {
        Self {
            kind: Some(descriptor::Kind::Object(Object {
                properties: properties
                    .into_iter()
                    .map(|(key, value)| (key.into(), value))
                    .collect(),
            })),
        }
    }

    pub fn optional(item: Descriptor) -> Self {
        Self {
            kind: Some(descriptor::Kind::Optional(Optional {
                item: Some(Box::new(item)),
            })),
        }
    }

    /// Short human-readable rendering, e.g. `list<integer>`.
    pub fn summary(&self) -> String {
        match &self.kind {
            None => "unset".to_string(),
            Some(descriptor::Kind::Basic(raw)) => BasicType::try_from(*raw)
                .map(|b| b.as_str().to_string())
                .unwrap_or_else(|_| format!("basic({raw})")),
            Some(descriptor::Kind::List(list)) => format!(
                "list<{}>",
                list.items.as_deref().map(Self::summary).unwrap_or_default()
            ),
            Some(descriptor::Kind::Optional(opt)) => format!(
                "optional<{}>",
                opt.item.as_deref().map(Self::summary).unwrap_or_default()
            ),
            Some(descriptor::Kind::Object(object)) => {
                let fields: Vec<String> = object
                    .properties
                    .iter()
                    .map(|(key, desc)| format!("{key}: {}", desc.summary()))
                    .collect();
                format!("{{{}}}", fields.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn summary_renders_nested_shapes() {
        let desc = Descriptor::object([
            ("count", Descriptor::basic(BasicType::Integer)),
            (
                "tags",
                Descriptor::optional(Descriptor::list(Descriptor::basic(BasicType::String))),
            ),
        ]);
        assert_eq!(desc.summary(), "{count: integer, tags: optional<list<string>>}");
    }

    #[test]
    fn nested_descriptor_survives_encoding() {
        let desc = Descriptor::list(Descriptor::object([(
            "id",
            Descriptor::basic(BasicType::Integer),
        )]));
        let bytes = desc.encode_to_vec();
        let decoded = Descriptor::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, desc);
    }
}
