// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exception translation at the native boundary.
//
// Every operation runs inside `guard`. Errors and panics never cross into the
// managed runtime as unwinds; they become exactly one pending managed
// exception and the operation returns its default value.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use crate::error::{BridgeError, Result};
use crate::host::{HostEnv, HostValue};
use crate::metadata::MetadataCache;

/// Run `op` and translate its failure into a managed exception.
///
/// `default` is returned whenever the operation does not complete.
pub fn guard<H, F>(
    cache: &MetadataCache,
    host: &mut H,
    name: &str,
    default: HostValue,
    op: F,
) -> HostValue
where
    H: HostEnv + ?Sized,
    F: FnOnce(&mut H) -> Result<HostValue>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| op(&mut *host)));
    let err = match outcome {
        Ok(Ok(value)) => return value,
        Ok(Err(err)) => err,
        Err(payload) => BridgeError::Fault(panic_message(payload.as_ref())),
    };
    raise(cache, host, name, &err);
    default
}

/// Raise `err` into the host unless an exception is already pending there.
pub fn raise<H: HostEnv + ?Sized>(
    cache: &MetadataCache,
    host: &mut H,
    name: &str,
    err: &BridgeError,
) {
    if host.exception_pending() {
        warn!(target: "mapview::jni", op = name, error = %err, "managed exception already pending");
        return;
    }
    let class = match err {
        BridgeError::NullArgument(_) => cache.null_pointer_exception,
        _ => cache.runtime_exception,
    };
    let message = err.to_string();
    warn!(target: "mapview::jni", op = name, error = %message, "raising managed exception");
    if let Err(throw_err) = host.throw_new(class, &message) {
        error!(
            target: "mapview::jni",
            op = name,
            error = %throw_err,
            "failed to raise managed exception"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use mapview_core::BridgeConfig;

    use super::*;
    use crate::error::NATIVE_EXCEPTION_PREFIX;
    use crate::testing::TestHost;

    fn setup() -> (TestHost, MetadataCache) {
        let mut host = TestHost::new();
        let (cache, _) = MetadataCache::load(&mut host, &BridgeConfig::default()).unwrap();
        (host, cache)
    }

    #[test]
    fn success_passes_the_value_through() {
        let (mut host, cache) = setup();
        let value = guard(&cache, &mut host, "nativeGetZoom", HostValue::Double(0.0), |_| {
            Ok(HostValue::Double(3.5))
        });
        assert_eq!(value, HostValue::Double(3.5));
        assert!(host.take_exception().is_none());
    }

    #[test]
    fn engine_error_becomes_runtime_exception() {
        let (mut host, cache) = setup();
        let value = guard(&cache, &mut host, "nativeGetZoom", HostValue::Double(0.0), |_| {
            Err(BridgeError::Native("style not loaded".into()))
        });
        assert_eq!(value, HostValue::Double(0.0));
        let thrown = host.take_exception().unwrap();
        assert_eq!(thrown.class, "java/lang/RuntimeException");
        assert_eq!(thrown.message, format!("{NATIVE_EXCEPTION_PREFIX}style not loaded"));
    }

    #[test]
    fn panic_is_caught_with_its_message() {
        let (mut host, cache) = setup();
        let value = guard(&cache, &mut host, "nativeRun", HostValue::Void, |_| {
            panic!("render thread gone");
        });
        assert_eq!(value, HostValue::Void);
        let thrown = host.take_exception().unwrap();
        assert_eq!(thrown.message, "Unhandled native exception: render thread gone");
    }

    #[test]
    fn null_argument_becomes_null_pointer_exception() {
        let (mut host, cache) = setup();
        guard(&cache, &mut host, "nativeSetStyleUrl", HostValue::Void, |_| {
            Err(BridgeError::NullArgument("String cannot be null."))
        });
        let thrown = host.take_exception().unwrap();
        assert_eq!(thrown.class, "java/lang/NullPointerException");
        assert_eq!(thrown.message, "String cannot be null.");
    }

    #[test]
    fn pending_exception_wins() {
        let (mut host, cache) = setup();
        guard(&cache, &mut host, "nativeGetStyleJson", HostValue::Void, |host| {
            host.fail_allocations(true);
            Ok(HostValue::Object(crate::marshal::export_string(host, "{}")?))
        });
        assert_eq!(host.thrown().len(), 1);
        assert_eq!(host.take_exception().unwrap().class, "java/lang/OutOfMemoryError");
    }
}
