// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Callback table for a bus data element.

use crate::error::BlizzardError;
use crate::proto::Value;
use crate::types::SubscribeAction;

/// Callbacks the host dispatches to when a data element is accessed.
///
/// Every callback receives the full element name so one handler may serve
/// several elements. Callbacks that an element does not support keep the
/// default implementation, which reports [`BlizzardError::Unsupported`].
pub trait ElementHandler: Send + Sync {
    /// Read a property value.
    fn get(&self, element: &str) -> Result<Value, BlizzardError> {
        Err(BlizzardError::unsupported(element, "get"))
    }

    /// Write a property value.
    fn set(&self, element: &str, value: Value) -> Result<(), BlizzardError> {
        let _ = value;
        Err(BlizzardError::unsupported(element, "set"))
    }

    /// Add a row to a table, returning the new instance number.
    ///
    /// `alias` is never `Some("")`; an empty alias travels as `None`.
    fn add_row(&self, table: &str, alias: Option<&str>) -> Result<u32, BlizzardError> {
        let _ = alias;
        Err(BlizzardError::unsupported(table, "add_row"))
    }

    /// Remove a table row by its full row name.
    fn remove_row(&self, row: &str) -> Result<(), BlizzardError> {
        Err(BlizzardError::unsupported(row, "remove_row"))
    }

    /// Accept or drop a subscription to an event element.
    fn subscribe(&self, event: &str, action: SubscribeAction) -> Result<(), BlizzardError> {
        let _ = action;
        Err(BlizzardError::unsupported(event, "subscribe"))
    }

    /// Invoke a method element.
    fn invoke(&self, method: &str, params: Value) -> Result<Value, BlizzardError> {
        let _ = params;
        Err(BlizzardError::unsupported(method, "invoke"))
    }
}
