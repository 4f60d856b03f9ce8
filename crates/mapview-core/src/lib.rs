// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Map view core: types, errors and engine traits shared by the bridge.

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::BridgeConfig;
pub use error::MapviewError;
pub use types::*;
