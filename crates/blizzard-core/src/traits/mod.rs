// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between plugins and the host.
//!
//! A plugin implements [`Plugin`] to produce its registration and supplies an
//! [`ElementHandler`] for each data element it exposes.

pub mod handler;
pub mod plugin;

pub use handler::ElementHandler;
pub use plugin::Plugin;
