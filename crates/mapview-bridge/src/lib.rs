// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Native side of the Android map view.
//!
//! The library binds the wrapper class's native methods to a map engine. At
//! load it resolves and pins the value classes it converts to and from, then
//! registers one entry point per method. Each call crosses the boundary
//! through [`dispatch::invoke`], which checks the map handle, converts the
//! arguments, forwards to the engine and turns any failure into a managed
//! exception with a default return value.
//!
//! The runtime is reached through [`host::HostEnv`]. On Android that is
//! `android::JniHost`; the `test-host` feature provides an in-memory runtime
//! so the whole bridge runs under `cargo test`.

pub mod boundary;
pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod handles;
pub mod headless;
pub mod host;
pub mod logging;
pub mod marshal;
pub mod metadata;
mod ops;
pub mod signature;

#[cfg(any(test, feature = "test-host"))]
pub mod testing;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(test)]
mod tests;

pub use bridge::Bridge;
pub use dispatch::{METHODS, Op};
pub use error::{BridgeError, Result};
pub use handles::MapHandle;
pub use host::{HostEnv, HostRef, HostValue};
