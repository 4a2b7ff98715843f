// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin-side conversion of a [`PluginRegistration`] into the C ABI.
//!
//! Rust plugins normally use [`export_plugin!`](crate::export_plugin), which
//! generates both exported symbols on top of the functions here.

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use blizzard_core::{BlizzardError, ElementHandler, PluginRegistration, SubscribeAction, Value};
use prost::Message;

use crate::abi::{
    BLIZZARD_ABI_VERSION, RawCallbackTable, RawDataElement, RawPluginRegistration, RawSink,
    STATUS_ERROR, STATUS_INVALID_INPUT, STATUS_OK, STATUS_UNSUPPORTED,
};

/// Owned allocation behind an exported registration.
///
/// `raw` is the first field so a pointer to it is a pointer to the whole
/// allocation, which is how [`release_registration`] recovers it.
#[repr(C)]
struct ExportedRegistration {
    raw: RawPluginRegistration,
    _names: Vec<CString>,
    _elements: Vec<RawDataElement>,
    _description: Vec<u8>,
    _slots: Vec<Box<HandlerSlot>>,
}

/// Callback context: the handler an element's callbacks dispatch to.
struct HandlerSlot {
    handler: Arc<dyn ElementHandler>,
}

/// Convert a registration into a leaked raw pointer, or null for `None`.
///
/// The pointer must eventually be passed to [`release_registration`].
pub fn export_registration(registration: Option<PluginRegistration>) -> *const RawPluginRegistration {
    let Some(registration) = registration else {
        return std::ptr::null();
    };
    match build(registration) {
        Ok(exported) => Box::into_raw(Box::new(exported)).cast_const().cast(),
        Err(err) => {
            tracing::error!(error = %err, "failed to export plugin registration");
            std::ptr::null()
        }
    }
}

/// Free a registration produced by [`export_registration`].
///
/// # Safety
///
/// `registration` must be null or a pointer returned by
/// [`export_registration`] that has not been released yet.
pub unsafe fn release_registration(registration: *const RawPluginRegistration) {
    if registration.is_null() {
        return;
    }
    // SAFETY: Caller guarantees the pointer came from `export_registration`,
    // which boxed an `ExportedRegistration` whose first field is `raw`.
    drop(unsafe { Box::from_raw(registration.cast_mut().cast::<ExportedRegistration>()) });
}

fn build(registration: PluginRegistration) -> Result<ExportedRegistration, BlizzardError> {
    let (elements, description) = registration.into_parts();
    let description = description.encode_to_vec();

    let mut names = Vec::with_capacity(elements.len());
    let mut slots = Vec::with_capacity(elements.len());
    let mut raw_elements = Vec::with_capacity(elements.len());

    for element in &elements {
        let name = CString::new(element.name()).map_err(|_| {
            BlizzardError::InvalidRegistration(format!(
                "data element name `{}` contains a NUL byte",
                element.name().escape_debug()
            ))
        })?;
        let mut slot = Box::new(HandlerSlot {
            handler: Arc::clone(element.handler()),
        });
        let context: *mut HandlerSlot = &mut *slot;

        raw_elements.push(RawDataElement {
            name: name.as_ptr(),
            element_type: element.element_type().as_raw(),
            callbacks: RawCallbackTable {
                context: context.cast(),
                get: Some(get_trampoline),
                set: Some(set_trampoline),
                add_row: Some(add_row_trampoline),
                remove_row: Some(remove_row_trampoline),
                subscribe: Some(subscribe_trampoline),
                invoke: Some(invoke_trampoline),
            },
        });
        names.push(name);
        slots.push(slot);
    }

    Ok(ExportedRegistration {
        raw: RawPluginRegistration {
            abi_version: BLIZZARD_ABI_VERSION,
            elements: if raw_elements.is_empty() {
                std::ptr::null()
            } else {
                raw_elements.as_ptr()
            },
            element_count: raw_elements.len(),
            description: description.as_ptr(),
            description_len: description.len(),
        },
        _names: names,
        _elements: raw_elements,
        _description: description,
        _slots: slots,
    })
}

/// Outcome of a callback body before it is mapped to a status code.
type CallbackResult = Result<Vec<u8>, BlizzardError>;

/// Shared trampoline body: decode arguments, run `body` without letting a
/// panic unwind into the host, and report the outcome through `sink`.
///
/// # Safety
///
/// Arguments must satisfy the [`RawCallbackFn`](crate::abi::RawCallbackFn)
/// contract and `context` must point to a live `HandlerSlot`.
unsafe fn dispatch(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
    body: impl FnOnce(&dyn ElementHandler, &str, &[u8]) -> CallbackResult,
) -> c_int {
    if context.is_null() || name.is_null() || sink.is_null() {
        return STATUS_INVALID_INPUT;
    }
    // SAFETY: Caller guarantees `context` is a live `HandlerSlot`, `name` is
    // NUL-terminated, `input` covers `input_len` bytes, and `sink` is valid.
    let (slot, name, input, sink) = unsafe {
        let input: &[u8] = if input.is_null() || input_len == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(input, input_len)
        };
        (
            &*context.cast::<HandlerSlot>(),
            CStr::from_ptr(name),
            input,
            &mut *sink,
        )
    };
    let Ok(name) = name.to_str() else {
        // SAFETY: `sink` is valid for this callback.
        unsafe { sink.write_bytes(b"element name is not valid UTF-8") };
        return STATUS_INVALID_INPUT;
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| body(slot.handler.as_ref(), name, input)))
        .unwrap_or_else(|_| Err(BlizzardError::handler(name, "handler panicked")));

    // SAFETY: `sink` is valid for this callback.
    unsafe {
        match outcome {
            Ok(output) => {
                sink.write_bytes(&output);
                STATUS_OK
            }
            Err(BlizzardError::Unsupported { .. }) => STATUS_UNSUPPORTED,
            Err(BlizzardError::Schema(message)) => {
                sink.write_bytes(message.as_bytes());
                STATUS_INVALID_INPUT
            }
            Err(BlizzardError::Handler { message, .. }) => {
                sink.write_bytes(message.as_bytes());
                STATUS_ERROR
            }
            Err(other) => {
                sink.write_bytes(other.to_string().as_bytes());
                STATUS_ERROR
            }
        }
    }
}

fn decode_value(input: &[u8]) -> Result<Value, BlizzardError> {
    Value::decode(input).map_err(|err| BlizzardError::Schema(format!("undecodable value: {err}")))
}

unsafe extern "C" fn get_trampoline(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int {
    // SAFETY: Forwarded from the host under the callback contract.
    unsafe {
        dispatch(context, name, input, input_len, sink, |handler, name, _| {
            Ok(handler.get(name)?.encode_to_vec())
        })
    }
}

unsafe extern "C" fn set_trampoline(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int {
    // SAFETY: Forwarded from the host under the callback contract.
    unsafe {
        dispatch(context, name, input, input_len, sink, |handler, name, input| {
            handler.set(name, decode_value(input)?)?;
            Ok(Vec::new())
        })
    }
}

unsafe extern "C" fn add_row_trampoline(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int {
    // SAFETY: Forwarded from the host under the callback contract.
    unsafe {
        dispatch(context, name, input, input_len, sink, |handler, name, input| {
            let alias = std::str::from_utf8(input)
                .map_err(|_| BlizzardError::Schema("row alias is not valid UTF-8".to_string()))?;
            let alias = (!alias.is_empty()).then_some(alias);
            Ok(handler.add_row(name, alias)?.to_le_bytes().to_vec())
        })
    }
}

unsafe extern "C" fn remove_row_trampoline(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int {
    // SAFETY: Forwarded from the host under the callback contract.
    unsafe {
        dispatch(context, name, input, input_len, sink, |handler, name, _| {
            handler.remove_row(name)?;
            Ok(Vec::new())
        })
    }
}

unsafe extern "C" fn subscribe_trampoline(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int {
    // SAFETY: Forwarded from the host under the callback contract.
    unsafe {
        dispatch(context, name, input, input_len, sink, |handler, name, input| {
            let action = match input {
                [1] => SubscribeAction::Subscribe,
                [0] => SubscribeAction::Unsubscribe,
                _ => {
                    return Err(BlizzardError::Schema(
                        "subscribe action must be a single 0 or 1 byte".to_string(),
                    ));
                }
            };
            handler.subscribe(name, action)?;
            Ok(Vec::new())
        })
    }
}

unsafe extern "C" fn invoke_trampoline(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int {
    // SAFETY: Forwarded from the host under the callback contract.
    unsafe {
        dispatch(context, name, input, input_len, sink, |handler, name, input| {
            Ok(handler.invoke(name, decode_value(input)?)?.encode_to_vec())
        })
    }
}

/// Export a Rust [`Plugin`](blizzard_core::Plugin) from a `cdylib`.
///
/// The argument is an expression evaluated on every call of the exported
/// register function, so each call builds a fresh plugin value and shares no
/// state with earlier calls.
///
/// ```ignore
/// blizzard_plugin::export_plugin!(Thermostat::default());
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($constructor:expr) => {
        /// Registration entry point resolved by the Blizzard loader.
        #[unsafe(no_mangle)]
        pub extern "C" fn blizzard_plugin_register() -> *const $crate::abi::RawPluginRegistration {
            let registration = ::std::panic::catch_unwind(|| {
                let plugin = $constructor;
                $crate::Plugin::register(&plugin)
            })
            .unwrap_or(None);
            $crate::export::export_registration(registration)
        }

        /// Releases a registration returned by `blizzard_plugin_register`.
        ///
        /// # Safety
        ///
        /// `registration` must come from `blizzard_plugin_register` in this
        /// library and must not have been released already.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn blizzard_plugin_release(
            registration: *const $crate::abi::RawPluginRegistration,
        ) {
            // SAFETY: Forwarded from the caller's contract.
            unsafe { $crate::export::release_registration(registration) }
        }
    };
}
