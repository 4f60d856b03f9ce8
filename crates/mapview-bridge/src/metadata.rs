// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Class, constructor, field and method ids resolved once at library load.

use mapview_core::BridgeConfig;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::host::{Callbacks, ClassRef, FieldId, HostEnv, HostError, MethodId};

const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";
const NULL_POINTER_EXCEPTION: &str = "java/lang/NullPointerException";
const LIST: &str = "java/util/List";
const ARRAY_LIST: &str = "java/util/ArrayList";

/// A pinned value class with its constructor and `double` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueClass<const N: usize> {
    pub class: ClassRef,
    pub constructor: MethodId,
    pub fields: [FieldId; N],
}

/// Everything the bridge looks up in the managed runtime, held for as long
/// as the library stays loaded.
#[derive(Debug)]
pub struct MetadataCache {
    /// `lon`, `lat`.
    pub lon_lat: ValueClass<2>,
    /// `lon`, `lat`, `zoom`.
    pub lon_lat_zoom: ValueClass<3>,
    pub runtime_exception: ClassRef,
    pub null_pointer_exception: ClassRef,
    /// `List.toArray()`.
    pub list_to_array: MethodId,
    pub array_list: ClassRef,
    pub array_list_constructor: MethodId,
    pub array_list_add: MethodId,
    /// Wrapper callbacks delivered through the engine observer.
    pub callbacks: Callbacks,
    // Pinned references in acquisition order.
    pins: Vec<ClassRef>,
}

impl MetadataCache {
    /// Resolve and pin everything. Returns the cache together with the
    /// (unpinned) wrapper class, which is only needed for registration.
    ///
    /// On failure every reference pinned so far is released again, so a
    /// failed load leaves nothing behind.
    pub fn load<H: HostEnv + ?Sized>(
        host: &mut H,
        config: &BridgeConfig,
    ) -> Result<(Self, ClassRef)> {
        let mut pins = Vec::with_capacity(5);
        match resolve(host, config, &mut pins) {
            Ok((mut cache, wrapper)) => {
                cache.pins = pins;
                debug!(pinned = cache.pins.len(), "metadata cache loaded");
                Ok((cache, wrapper))
            }
            Err(err) => {
                warn!(error = %err, pinned = pins.len(), "metadata load failed; rolling back");
                for class in pins.into_iter().rev() {
                    host.unpin(class);
                }
                Err(err)
            }
        }
    }

    /// Release every pinned reference, newest first.
    pub fn release<H: HostEnv + ?Sized>(self, host: &mut H) {
        debug!(pinned = self.pins.len(), "releasing metadata cache");
        for class in self.pins.into_iter().rev() {
            host.unpin(class);
        }
    }

    /// Number of references this cache keeps pinned.
    pub fn pinned(&self) -> usize {
        self.pins.len()
    }
}

fn resolve<H: HostEnv + ?Sized>(
    host: &mut H,
    config: &BridgeConfig,
    pins: &mut Vec<ClassRef>,
) -> Result<(MetadataCache, ClassRef)> {
    let names = &config.classes;

    let lon_lat = value_class(host, pins, &names.lon_lat, "(DD)V", ["lon", "lat"])?;
    let lon_lat_zoom = value_class(
        host,
        pins,
        &names.lon_lat_zoom,
        "(DDD)V",
        ["lon", "lat", "zoom"],
    )?;

    let wrapper = class(host, &names.map_view)?;
    let callbacks = Callbacks {
        on_map_changed: method(host, wrapper, &names.map_view, "onMapChanged", "()V")?,
        on_fps_changed: method(host, wrapper, &names.map_view, "onFpsChanged", "(D)V")?,
    };

    let runtime_exception = pinned_class(host, pins, RUNTIME_EXCEPTION)?;
    let null_pointer_exception = pinned_class(host, pins, NULL_POINTER_EXCEPTION)?;

    let list = class(host, LIST)?;
    let list_to_array = method(host, list, LIST, "toArray", "()[Ljava/lang/Object;")?;

    let array_list = pinned_class(host, pins, ARRAY_LIST)?;
    let array_list_constructor = method(host, array_list, ARRAY_LIST, "<init>", "()V")?;
    let array_list_add = method(host, array_list, ARRAY_LIST, "add", "(Ljava/lang/Object;)Z")?;

    let cache = MetadataCache {
        lon_lat,
        lon_lat_zoom,
        runtime_exception,
        null_pointer_exception,
        list_to_array,
        array_list,
        array_list_constructor,
        array_list_add,
        callbacks,
        pins: Vec::new(),
    };
    Ok((cache, wrapper))
}

fn value_class<H: HostEnv + ?Sized, const N: usize>(
    host: &mut H,
    pins: &mut Vec<ClassRef>,
    name: &str,
    constructor: &str,
    fields: [&str; N],
) -> Result<ValueClass<N>> {
    let class = pinned_class(host, pins, name)?;
    let constructor = method(host, class, name, "<init>", constructor)?;
    let mut ids = [FieldId::from_raw(0); N];
    for (id, field) in ids.iter_mut().zip(fields) {
        *id = host
            .field_id(class, field, "D")
            .map_err(|e| resolve_error(e, format!("field {name}.{field}")))?;
    }
    Ok(ValueClass {
        class,
        constructor,
        fields: ids,
    })
}

fn class<H: HostEnv + ?Sized>(host: &mut H, name: &str) -> Result<ClassRef> {
    host.find_class(name)
        .map_err(|e| resolve_error(e, format!("class {name}")))
}

fn pinned_class<H: HostEnv + ?Sized>(
    host: &mut H,
    pins: &mut Vec<ClassRef>,
    name: &str,
) -> Result<ClassRef> {
    let local = class(host, name)?;
    let global = host
        .pin(local)
        .map_err(|e| resolve_error(e, format!("global reference to {name}")))?;
    pins.push(global);
    Ok(global)
}

fn method<H: HostEnv + ?Sized>(
    host: &mut H,
    class: ClassRef,
    class_name: &str,
    name: &str,
    signature: &str,
) -> Result<MethodId> {
    host.method_id(class, name, signature)
        .map_err(|e| resolve_error(e, format!("method {class_name}.{name}{signature}")))
}

fn resolve_error(err: HostError, what: String) -> BridgeError {
    match err {
        HostError::ExceptionPending => BridgeError::Resolve(format!("{what} (exception pending)")),
        HostError::Failed(message) => BridgeError::Resolve(format!("{what}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;

    #[test]
    fn load_pins_five_classes() {
        let mut host = TestHost::new();
        let (cache, _wrapper) = MetadataCache::load(&mut host, &BridgeConfig::default()).unwrap();
        assert_eq!(cache.pinned(), 5);
        assert_eq!(host.live_globals(), 5);
        assert_ne!(cache.lon_lat.fields[0], cache.lon_lat.fields[1]);

        cache.release(&mut host);
        assert_eq!(host.live_globals(), 0);
    }

    #[test]
    fn failed_load_rolls_back() {
        let mut host = TestHost::new();
        host.remove_class("java/util/ArrayList");
        let err = MetadataCache::load(&mut host, &BridgeConfig::default()).unwrap_err();
        assert!(err.to_string().contains("java/util/ArrayList"), "{err}");
        assert_eq!(host.live_globals(), 0);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let mut host = TestHost::new();
        host.remove_member("com/mapbox/mapboxgl/lib/LonLatZoom", "zoom");
        let err = MetadataCache::load(&mut host, &BridgeConfig::default()).unwrap_err();
        assert!(err.to_string().contains("LonLatZoom.zoom"), "{err}");
        assert_eq!(host.live_globals(), 0);
    }

    #[test]
    fn configured_class_names_are_used() {
        let mut host = TestHost::new();
        let mut config = BridgeConfig::default();
        config.classes.map_view = "org/example/MissingView".into();
        let err = MetadataCache::load(&mut host, &config).unwrap_err();
        assert!(err.to_string().contains("org/example/MissingView"));
    }
}
