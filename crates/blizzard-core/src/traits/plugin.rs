// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin capability interface.

use crate::registration::PluginRegistration;

/// Implemented by every plugin.
///
/// The host calls [`Plugin::register`] once per load and consumes the result
/// immediately. Implementations must not perform I/O or touch the bus here;
/// they only build the element list and description. Returning `None` marks
/// the plugin as unavailable.
pub trait Plugin: Send + Sync {
    fn register(&self) -> Option<PluginRegistration>;
}

impl<F> Plugin for F
where
    F: Fn() -> Option<PluginRegistration> + Send + Sync,
{
    fn register(&self) -> Option<PluginRegistration> {
        self()
    }
}
