// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `google.protobuf.Any` envelope for schema payloads.

use prost::Name;

use crate::error::BlizzardError;

/// Prefix used for every type URL packed by Blizzard.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com";

pub(crate) fn type_url_for(full_name: &str) -> String {
    format!("{TYPE_URL_PREFIX}/{full_name}")
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

impl Any {
    /// Pack a named message.
    pub fn pack<M: Name>(message: &M) -> Self {
        Self {
            type_url: M::type_url(),
            value: message.encode_to_vec(),
        }
    }

    /// Unpack into `M`, failing if the type URL names a different message.
    pub fn unpack<M: Name + Default>(&self) -> Result<M, BlizzardError> {
        let expected = M::type_url();
        if self.type_url != expected {
            return Err(BlizzardError::Schema(format!(
                "expected Any of type `{expected}`, found `{}`",
                self.type_url
            )));
        }
        Ok(M::decode(self.value.as_slice())?)
    }
}
