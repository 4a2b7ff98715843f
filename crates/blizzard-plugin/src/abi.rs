// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! C-compatible registration ABI.
//!
//! A plugin library exports one required symbol and one optional symbol:
//!
//! ```c
//! const RawPluginRegistration* blizzard_plugin_register(void);
//! void blizzard_plugin_release(const RawPluginRegistration*);
//! ```
//!
//! `blizzard_plugin_register` returns null when registration cannot proceed.
//! The registration stays owned by the plugin. The host borrows it while any
//! element handler built from it is alive and then hands it back through
//! `blizzard_plugin_release`, if the library exports it. Libraries without a
//! release symbol must return static data.
//!
//! Values and the plugin description cross the boundary as encoded protobuf
//! bytes. Callback output is written through a host-provided [`RawSink`] so
//! the plugin never has to free memory on the host's behalf.

use std::ffi::{c_char, c_int, c_void};

/// Current ABI version. Plugins must match this version to be loaded.
pub const BLIZZARD_ABI_VERSION: u32 = 1;

/// Name of the required registration symbol.
pub const REGISTER_SYMBOL: &str = "blizzard_plugin_register";

/// Name of the optional release symbol.
pub const RELEASE_SYMBOL: &str = "blizzard_plugin_release";

/// Callback completed; any output is in the sink.
pub const STATUS_OK: c_int = 0;
/// The element does not implement this callback.
pub const STATUS_UNSUPPORTED: c_int = 1;
/// The callback failed; the sink holds a UTF-8 message.
pub const STATUS_ERROR: c_int = 2;
/// The input did not match what the element expects; the sink holds a UTF-8 message.
pub const STATUS_INVALID_INPUT: c_int = 3;

/// Signature of `blizzard_plugin_register`.
pub type RegisterFn = unsafe extern "C" fn() -> *const RawPluginRegistration;

/// Signature of `blizzard_plugin_release`.
pub type ReleaseFn = unsafe extern "C" fn(*const RawPluginRegistration);

/// Uniform element callback.
///
/// Arguments: the callback table's `context`, the NUL-terminated element (or
/// row) name, an input buffer, and the sink for output. The meaning of input
/// and output depends on the operation:
///
/// | operation    | input                         | output                 |
/// |--------------|-------------------------------|------------------------|
/// | `get`        | empty                         | encoded `Value`        |
/// | `set`        | encoded `Value`               | empty                  |
/// | `add_row`    | UTF-8 alias, empty for none   | instance number, u32 LE|
/// | `remove_row` | empty                         | empty                  |
/// | `subscribe`  | one byte: 1 = sub, 0 = unsub  | empty                  |
/// | `invoke`     | encoded `Value` parameters    | encoded `Value` result |
pub type RawCallbackFn = unsafe extern "C" fn(
    context: *mut c_void,
    name: *const c_char,
    input: *const u8,
    input_len: usize,
    sink: *mut RawSink,
) -> c_int;

/// Host-owned output buffer handed to callbacks.
#[repr(C)]
pub struct RawSink {
    pub target: *mut c_void,
    pub write: unsafe extern "C" fn(target: *mut c_void, data: *const u8, len: usize),
}

impl RawSink {
    /// Sink appending to `buffer`. The sink must not outlive the buffer.
    pub fn for_vec(buffer: &mut Vec<u8>) -> Self {
        Self {
            target: (buffer as *mut Vec<u8>).cast(),
            write: write_to_vec,
        }
    }

    /// Write `bytes` through the sink.
    ///
    /// # Safety
    ///
    /// The sink must have been provided by the host for the current callback.
    pub unsafe fn write_bytes(&mut self, bytes: &[u8]) {
        // SAFETY: Caller guarantees the sink is live for this callback.
        unsafe { (self.write)(self.target, bytes.as_ptr(), bytes.len()) }
    }
}

unsafe extern "C" fn write_to_vec(target: *mut c_void, data: *const u8, len: usize) {
    if target.is_null() || data.is_null() || len == 0 {
        return;
    }
    // SAFETY: `target` was produced by `RawSink::for_vec` and the buffer is
    // borrowed for the duration of the callback. `data` points to `len` bytes.
    unsafe {
        let buffer = &mut *target.cast::<Vec<u8>>();
        buffer.extend_from_slice(std::slice::from_raw_parts(data, len));
    }
}

/// Callback table for one data element.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawCallbackTable {
    /// Opaque plugin pointer passed back to every callback.
    pub context: *mut c_void,
    pub get: Option<RawCallbackFn>,
    pub set: Option<RawCallbackFn>,
    pub add_row: Option<RawCallbackFn>,
    pub remove_row: Option<RawCallbackFn>,
    pub subscribe: Option<RawCallbackFn>,
    pub invoke: Option<RawCallbackFn>,
}

impl RawCallbackTable {
    /// Table with no callbacks.
    pub const fn empty() -> Self {
        Self {
            context: std::ptr::null_mut(),
            get: None,
            set: None,
            add_row: None,
            remove_row: None,
            subscribe: None,
            invoke: None,
        }
    }
}

/// One bus data element as laid out across the ABI.
#[repr(C)]
pub struct RawDataElement {
    /// NUL-terminated element name.
    pub name: *const c_char,
    /// `ElementType` discriminant (1 = property, 2 = table, 3 = event, 4 = method).
    pub element_type: u32,
    pub callbacks: RawCallbackTable,
}

/// Registration returned by `blizzard_plugin_register`.
#[repr(C)]
pub struct RawPluginRegistration {
    /// Must equal [`BLIZZARD_ABI_VERSION`].
    pub abi_version: u32,
    /// Array of `element_count` data elements. May be null when the count is 0.
    pub elements: *const RawDataElement,
    pub element_count: usize,
    /// Encoded `PluginDescription`. Must not be null.
    pub description: *const u8,
    pub description_len: usize,
}

impl RawPluginRegistration {
    /// View the element array.
    ///
    /// # Safety
    ///
    /// `elements` must point to `element_count` valid items, or be null with a
    /// count of zero.
    pub unsafe fn elements(&self) -> &[RawDataElement] {
        if self.elements.is_null() || self.element_count == 0 {
            &[]
        } else {
            // SAFETY: Caller guarantees `elements` points to a valid array.
            unsafe { std::slice::from_raw_parts(self.elements, self.element_count) }
        }
    }

    /// View the encoded description bytes, or `None` if the pointer is null.
    ///
    /// # Safety
    ///
    /// A non-null `description` must point to `description_len` readable bytes.
    pub unsafe fn description_bytes(&self) -> Option<&[u8]> {
        if self.description.is_null() {
            None
        } else if self.description_len == 0 {
            Some(&[])
        } else {
            // SAFETY: Caller guarantees the buffer is readable.
            Some(unsafe { std::slice::from_raw_parts(self.description, self.description_len) })
        }
    }
}
