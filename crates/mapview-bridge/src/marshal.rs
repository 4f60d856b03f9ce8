// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversions between managed values and native ones.
//
// Strings travel as UTF-16 code units and are copied on both sides; nothing
// returned from here aliases managed memory. Null references are rejected
// with the message the managed side expects in its `NullPointerException`.

use mapview_core::{LonLat, LonLatZoom};

use crate::error::{BridgeError, Result};
use crate::host::{HostEnv, HostRef, HostValue};
use crate::metadata::MetadataCache;

pub const NULL_STRING: &str = "String cannot be null.";
pub const NULL_LIST: &str = "List cannot be null.";
pub const NULL_LIST_ELEMENT: &str = "List cannot contain null elements.";
pub const NULL_LON_LAT: &str = "LonLat cannot be null.";
pub const NULL_LON_LAT_ZOOM: &str = "LonLatZoom cannot be null.";

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Copy a managed string into a Rust `String`.
pub fn import_string<H: HostEnv + ?Sized>(host: &mut H, string: HostRef) -> Result<String> {
    if string.is_null() {
        return Err(BridgeError::NullArgument(NULL_STRING));
    }
    let units = host.string_units(string)?;
    String::from_utf16(&units).map_err(|e| BridgeError::Conversion(e.to_string()))
}

/// Allocate a managed string holding `value`.
pub fn export_string<H: HostEnv + ?Sized>(host: &mut H, value: &str) -> Result<HostRef> {
    let units: Vec<u16> = value.encode_utf16().collect();
    Ok(host.new_string(&units)?)
}

// ---------------------------------------------------------------------------
// String lists
// ---------------------------------------------------------------------------

/// Copy a `java.util.List<String>` in order. A null element fails the whole
/// import.
pub fn import_list<H: HostEnv + ?Sized>(
    host: &mut H,
    cache: &MetadataCache,
    list: HostRef,
) -> Result<Vec<String>> {
    if list.is_null() {
        return Err(BridgeError::NullArgument(NULL_LIST));
    }
    let array = host.call_object_method(list, cache.list_to_array, &[])?;
    if array.is_null() {
        return Err(BridgeError::Host("List.toArray() returned null".into()));
    }
    let imported = import_elements(host, array);
    host.delete_local(array);
    imported
}

fn import_elements<H: HostEnv + ?Sized>(host: &mut H, array: HostRef) -> Result<Vec<String>> {
    let len = host.array_length(array)?;
    let mut out = Vec::with_capacity(len);
    for index in 0..len {
        let element = host.array_element(array, index)?;
        if element.is_null() {
            return Err(BridgeError::NullArgument(NULL_LIST_ELEMENT));
        }
        let value = import_string(host, element);
        host.delete_local(element);
        out.push(value?);
    }
    Ok(out)
}

/// Build a new `java.util.ArrayList` holding `values` in order.
pub fn export_list<H: HostEnv + ?Sized>(
    host: &mut H,
    cache: &MetadataCache,
    values: &[String],
) -> Result<HostRef> {
    let list = host.new_object(cache.array_list, cache.array_list_constructor, &[])?;
    for value in values {
        let string = match export_string(host, value) {
            Ok(string) => string,
            Err(err) => {
                host.delete_local(list);
                return Err(err);
            }
        };
        let added =
            host.call_boolean_method(list, cache.array_list_add, &[HostValue::Object(string)]);
        host.delete_local(string);
        if let Err(err) = added {
            host.delete_local(list);
            return Err(err.into());
        }
    }
    Ok(list)
}

// ---------------------------------------------------------------------------
// Value objects
// ---------------------------------------------------------------------------

pub fn import_lon_lat<H: HostEnv + ?Sized>(
    host: &mut H,
    cache: &MetadataCache,
    object: HostRef,
) -> Result<LonLat> {
    if object.is_null() {
        return Err(BridgeError::NullArgument(NULL_LON_LAT));
    }
    let [lon, lat] = cache.lon_lat.fields;
    Ok(LonLat::new(
        host.double_field(object, lon)?,
        host.double_field(object, lat)?,
    ))
}

pub fn export_lon_lat<H: HostEnv + ?Sized>(
    host: &mut H,
    cache: &MetadataCache,
    value: LonLat,
) -> Result<HostRef> {
    let args = [HostValue::Double(value.lon), HostValue::Double(value.lat)];
    Ok(host.new_object(cache.lon_lat.class, cache.lon_lat.constructor, &args)?)
}

pub fn import_lon_lat_zoom<H: HostEnv + ?Sized>(
    host: &mut H,
    cache: &MetadataCache,
    object: HostRef,
) -> Result<LonLatZoom> {
    if object.is_null() {
        return Err(BridgeError::NullArgument(NULL_LON_LAT_ZOOM));
    }
    let [lon, lat, zoom] = cache.lon_lat_zoom.fields;
    Ok(LonLatZoom::new(
        host.double_field(object, lon)?,
        host.double_field(object, lat)?,
        host.double_field(object, zoom)?,
    ))
}

pub fn export_lon_lat_zoom<H: HostEnv + ?Sized>(
    host: &mut H,
    cache: &MetadataCache,
    value: LonLatZoom,
) -> Result<HostRef> {
    let args = [
        HostValue::Double(value.lon),
        HostValue::Double(value.lat),
        HostValue::Double(value.zoom),
    ];
    Ok(host.new_object(
        cache.lon_lat_zoom.class,
        cache.lon_lat_zoom.constructor,
        &args,
    )?)
}
