// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side consumption of a raw registration.
//!
//! [`registration_from_raw`] validates the raw struct, copies out the element
//! names and the description, and wraps each element's callback table in an
//! [`ElementHandler`]. The handlers share a guard that keeps the plugin's
//! memory borrowed until the last of them is dropped, then returns it through
//! the plugin's release function.

use std::ffi::{CStr, CString, c_int};
use std::sync::Arc;

use blizzard_core::{
    BlizzardError, DataElement, DataElementList, ElementHandler, ElementType, PluginDescription,
    PluginRegistration, SubscribeAction, Value,
};
use libloading::Library;
use prost::Message;

use crate::abi::{
    BLIZZARD_ABI_VERSION, RawCallbackFn, RawCallbackTable, RawPluginRegistration, RawSink,
    ReleaseFn, STATUS_ERROR, STATUS_INVALID_INPUT, STATUS_OK, STATUS_UNSUPPORTED,
};

/// Borrow of a plugin-owned registration.
struct RawRegistrationGuard {
    raw: *const RawPluginRegistration,
    release: Option<ReleaseFn>,
    // Declared last so the library is unloaded after `release` has run.
    _library: Option<Arc<Library>>,
}

// SAFETY: The guard only hands `raw` back to the plugin's release function.
// Plugins must tolerate callbacks and release from any thread.
unsafe impl Send for RawRegistrationGuard {}
unsafe impl Sync for RawRegistrationGuard {}

impl Drop for RawRegistrationGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            // SAFETY: `raw` came from the matching register function and is
            // released exactly once, while the library is still loaded.
            unsafe { release(self.raw) };
        }
    }
}

/// [`ElementHandler`] forwarding to a plugin's raw callback table.
struct FfiElementHandler {
    callbacks: RawCallbackTable,
    _guard: Arc<RawRegistrationGuard>,
}

// SAFETY: See `RawRegistrationGuard`. The callback table holds plain function
// pointers and an opaque context owned by the plugin.
unsafe impl Send for FfiElementHandler {}
unsafe impl Sync for FfiElementHandler {}

impl FfiElementHandler {
    fn call(
        &self,
        operation: &str,
        callback: Option<RawCallbackFn>,
        name: &str,
        input: &[u8],
    ) -> Result<Vec<u8>, BlizzardError> {
        let Some(callback) = callback else {
            return Err(BlizzardError::unsupported(name, operation));
        };
        let c_name = CString::new(name)
            .map_err(|_| BlizzardError::handler(name, "element name contains a NUL byte"))?;

        let mut output = Vec::new();
        let mut sink = RawSink::for_vec(&mut output);
        // SAFETY: The guard keeps the registration and library alive; the
        // name, input, and sink outlive the call.
        let status = unsafe {
            callback(
                self.callbacks.context,
                c_name.as_ptr(),
                input.as_ptr(),
                input.len(),
                &mut sink,
            )
        };
        status_to_result(status, operation, name, output)
    }

    fn call_value(
        &self,
        operation: &str,
        callback: Option<RawCallbackFn>,
        name: &str,
        input: &[u8],
    ) -> Result<Value, BlizzardError> {
        let output = self.call(operation, callback, name, input)?;
        Ok(Value::decode(output.as_slice())?)
    }
}

fn status_to_result(
    status: c_int,
    operation: &str,
    name: &str,
    output: Vec<u8>,
) -> Result<Vec<u8>, BlizzardError> {
    let message = || String::from_utf8_lossy(&output).into_owned();
    match status {
        STATUS_OK => Ok(output),
        STATUS_UNSUPPORTED => Err(BlizzardError::unsupported(name, operation)),
        STATUS_INVALID_INPUT => Err(BlizzardError::Schema(message())),
        STATUS_ERROR => Err(BlizzardError::handler(name, message())),
        other => Err(BlizzardError::handler(
            name,
            format!("{operation} returned unknown status {other}"),
        )),
    }
}

impl ElementHandler for FfiElementHandler {
    fn get(&self, element: &str) -> Result<Value, BlizzardError> {
        self.call_value("get", self.callbacks.get, element, &[])
    }

    fn set(&self, element: &str, value: Value) -> Result<(), BlizzardError> {
        self.call("set", self.callbacks.set, element, &value.encode_to_vec())
            .map(drop)
    }

    fn add_row(&self, table: &str, alias: Option<&str>) -> Result<u32, BlizzardError> {
        let output = self.call(
            "add_row",
            self.callbacks.add_row,
            table,
            alias.unwrap_or_default().as_bytes(),
        )?;
        let bytes: [u8; 4] = output.as_slice().try_into().map_err(|_| {
            BlizzardError::handler(table, format!("add_row returned {} bytes", output.len()))
        })?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn remove_row(&self, row: &str) -> Result<(), BlizzardError> {
        self.call("remove_row", self.callbacks.remove_row, row, &[])
            .map(drop)
    }

    fn subscribe(&self, event: &str, action: SubscribeAction) -> Result<(), BlizzardError> {
        let flag = match action {
            SubscribeAction::Subscribe => 1u8,
            SubscribeAction::Unsubscribe => 0u8,
        };
        self.call("subscribe", self.callbacks.subscribe, event, &[flag])
            .map(drop)
    }

    fn invoke(&self, method: &str, params: Value) -> Result<Value, BlizzardError> {
        self.call_value("invoke", self.callbacks.invoke, method, &params.encode_to_vec())
    }
}

/// Consume the result of a plugin's register function.
///
/// `origin` names the plugin in errors (usually the library path). On error
/// the registration is still handed to `release`.
///
/// # Safety
///
/// `raw` must be null or point to a registration laid out per the ABI, whose
/// pointers stay valid until `release` is called. `library`, when given, must
/// be the library that produced `raw` and its callbacks.
pub unsafe fn registration_from_raw(
    raw: *const RawPluginRegistration,
    release: Option<ReleaseFn>,
    library: Option<Arc<Library>>,
    origin: &str,
) -> Result<PluginRegistration, BlizzardError> {
    if raw.is_null() {
        return Err(BlizzardError::RegistrationUnavailable {
            plugin: origin.to_string(),
        });
    }
    let guard = Arc::new(RawRegistrationGuard {
        raw,
        release,
        _library: library,
    });

    // SAFETY: Non-null, and the caller guarantees the layout.
    let reg = unsafe { &*raw };
    if reg.abi_version != BLIZZARD_ABI_VERSION {
        return Err(BlizzardError::AbiMismatch {
            expected: BLIZZARD_ABI_VERSION,
            actual: reg.abi_version,
        });
    }

    // SAFETY: Caller guarantees a non-null description is readable.
    let Some(description_bytes) = (unsafe { reg.description_bytes() }) else {
        return Err(BlizzardError::InvalidRegistration(format!(
            "{origin}: registration has no plugin description ({} elements declared)",
            reg.element_count
        )));
    };
    if reg.elements.is_null() && reg.element_count > 0 {
        return Err(BlizzardError::InvalidRegistration(format!(
            "{origin}: element count is {} but the element list is null",
            reg.element_count
        )));
    }
    let description = PluginDescription::decode(description_bytes)?;

    // SAFETY: Checked above that a non-zero count comes with a non-null array.
    let raw_elements = unsafe { reg.elements() };
    let mut elements = Vec::with_capacity(raw_elements.len());
    for (index, raw_element) in raw_elements.iter().enumerate() {
        if raw_element.name.is_null() {
            return Err(BlizzardError::InvalidRegistration(format!(
                "{origin}: data element #{index} has no name"
            )));
        }
        // SAFETY: Non-null and NUL-terminated per the ABI.
        let name = unsafe { CStr::from_ptr(raw_element.name) }
            .to_str()
            .map_err(|_| {
                BlizzardError::InvalidRegistration(format!(
                    "{origin}: data element #{index} name is not valid UTF-8"
                ))
            })?
            .to_string();
        let element_type = ElementType::from_raw(raw_element.element_type).ok_or_else(|| {
            BlizzardError::InvalidRegistration(format!(
                "{origin}: data element `{name}` has unknown type {}",
                raw_element.element_type
            ))
        })?;
        let handler: Arc<dyn ElementHandler> = Arc::new(FfiElementHandler {
            callbacks: raw_element.callbacks,
            _guard: Arc::clone(&guard),
        });
        elements.push(DataElement::new(name, element_type, handler));
    }

    let registration = PluginRegistration::new(DataElementList::new(elements), description);
    registration.validate()?;
    Ok(registration)
}
