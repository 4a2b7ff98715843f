// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blizzard.value` dynamic value messages.
//!
//! Values cross the plugin boundary as encoded protobuf bytes. An unset
//! `kind` means the value is absent.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
    #[prost(oneof = "value::Kind", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub kind: Option<value::Kind>,
}

pub mod value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(bool, tag = "1")]
        Boolean(bool),
        #[prost(int64, tag = "2")]
        Integer(i64),
        #[prost(double, tag = "3")]
        Double(f64),
        #[prost(string, tag = "4")]
        String(String),
        #[prost(bytes = "vec", tag = "5")]
        Bytes(Vec<u8>),
        #[prost(message, tag = "6")]
        Object(super::Object),
        #[prost(message, tag = "7")]
        List(super::List),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Object {
    #[prost(message, repeated, tag = "1")]
    pub children: Vec<ObjectEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObjectEntry {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Value>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct List {
    #[prost(message, repeated, tag = "1")]
    pub elements: Vec<Value>,
}

impl ::prost::Name for Value {
    const NAME: &'static str = "Value";
    const PACKAGE: &'static str = "blizzard.value";

    fn type_url() -> String {
        super::any::type_url_for(&Self::full_name())
    }
}

impl Value {
    pub fn boolean(value: bool) -> Self {
        Self::from_kind(value::Kind::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::from_kind(value::Kind::Integer(value))
    }

    pub fn double(value: f64) -> Self {
        Self::from_kind(value::Kind::Double(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::from_kind(value::Kind::String(value.into()))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::from_kind(value::Kind::Bytes(value.into()))
    }

    pub fn list(elements: impl IntoIterator<Item = Value>) -> Self {
        Self::from_kind(value::Kind::List(List {
            elements: elements.into_iter().collect(),
        }))
    }

    pub fn object<K, I>(children: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::from_kind(value::Kind::Object(Object {
            children: children
                .into_iter()
                .map(|(key, value)| ObjectEntry {
                    key: key.into(),
                    value: Some(value),
                })
                .collect(),
        }))
    }

    fn from_kind(kind: value::Kind) -> Self {
        Self { kind: Some(kind) }
    }

    pub fn is_absent(&self) -> bool {
        self.kind.is_none()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            Some(value::Kind::Boolean(b)) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.kind {
            Some(value::Kind::Integer(i)) => Some(i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self.kind {
            Some(value::Kind::Double(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            Some(value::Kind::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.kind {
            Some(value::Kind::List(list)) => Some(&list.elements),
            _ => None,
        }
    }

    /// Look up an object property. Returns `None` for non-objects, missing
    /// keys, and entries whose value is unset.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.kind {
            Some(value::Kind::Object(object)) => object
                .children
                .iter()
                .find(|entry| entry.key == key)
                .and_then(|entry| entry.value.as_ref()),
            _ => None,
        }
    }

    /// Name of the value's kind as used in schema error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            None => "absent",
            Some(value::Kind::Boolean(_)) => "boolean",
            Some(value::Kind::Integer(_)) => "integer",
            Some(value::Kind::Double(_)) => "double",
            Some(value::Kind::String(_)) => "string",
            Some(value::Kind::Bytes(_)) => "bytes",
            Some(value::Kind::Object(_)) => "object",
            Some(value::Kind::List(_)) => "list",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(value)
    }
}
