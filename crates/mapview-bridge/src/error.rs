// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge error taxonomy.
//
// Every variant except `ExceptionPending` is raised into the managed runtime
// by `boundary::raise`; `ExceptionPending` means the host already holds the
// exception describing the failure.

use mapview_core::MapviewError;
use thiserror::Error;

use crate::host::HostError;

/// Prefix of every managed exception that reports an engine failure.
pub const NATIVE_EXCEPTION_PREFIX: &str = "Unhandled native exception: ";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    /// A non-null reference parameter arrived null. Raised as a
    /// `NullPointerException` carrying the message verbatim.
    #[error("{0}")]
    NullArgument(&'static str),

    /// The host runtime already has an exception pending.
    #[error("managed exception pending")]
    ExceptionPending,

    /// A host call failed without leaving an exception behind.
    #[error("Host runtime failure: {0}")]
    Host(String),

    /// A value could not be converted between representations.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// The engine returned an error.
    #[error("Unhandled native exception: {0}")]
    Native(String),

    /// The operation panicked.
    #[error("Unhandled native exception: {0}")]
    Fault(String),

    /// The engine factory could not produce an instance.
    #[error("Unable to create NativeMapView: {0}")]
    Construction(String),

    /// The engine reported that a GL resource could not be set up.
    #[error("{0}")]
    Unable(&'static str),

    /// A non-zero handle that does not name a live map.
    #[error("Map handle {0:#x} does not refer to a live map")]
    StaleHandle(i64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Load-time metadata resolution failed.
    #[error("failed to resolve {0}")]
    Resolve(String),

    /// The dispatch table or an invocation does not match a method signature.
    #[error("dispatch error: {0}")]
    Dispatch(String),
}

impl From<HostError> for BridgeError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::ExceptionPending => BridgeError::ExceptionPending,
            HostError::Failed(message) => BridgeError::Host(message),
        }
    }
}

impl From<MapviewError> for BridgeError {
    fn from(err: MapviewError) -> Self {
        BridgeError::Native(err.to_string())
    }
}

/// Alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_carry_the_native_prefix() {
        let err: BridgeError = MapviewError::Engine("style not loaded".into()).into();
        assert_eq!(err.to_string(), "Unhandled native exception: style not loaded");
        assert!(err.to_string().starts_with(NATIVE_EXCEPTION_PREFIX));
    }

    #[test]
    fn faults_share_the_native_prefix() {
        let err = BridgeError::Fault("index out of bounds".into());
        assert!(err.to_string().starts_with(NATIVE_EXCEPTION_PREFIX));
    }

    #[test]
    fn pending_host_errors_stay_pending() {
        assert_eq!(
            BridgeError::from(HostError::ExceptionPending),
            BridgeError::ExceptionPending
        );
    }
}
