// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Value types exchanged between the managed wrapper and the map engine.

use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A longitude/latitude pair plus a zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLatZoom {
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
}

impl LonLatZoom {
    pub fn new(lon: f64, lat: f64, zoom: f64) -> Self {
        Self { lon, lat, zoom }
    }

    /// The centre coordinate without the zoom component.
    pub fn lon_lat(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }
}

/// Logical size of the map view in density-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u16,
    pub height: u16,
    /// Device pixels per logical pixel.
    pub pixel_ratio: f32,
}

/// Physical size of the GL framebuffer backing the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferSize {
    pub width: u16,
    pub height: u16,
}

/// Filesystem locations handed to the engine when a map is created.
///
/// The bridge passes these through untouched; existence is the engine's
/// concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorePaths {
    /// Tile and resource cache directory.
    pub cache: PathBuf,
    /// Application data directory.
    pub data: PathBuf,
    /// Location of the bundled resources (the APK on Android).
    pub assets: PathBuf,
}

/// Platform drawing surface (an `ANativeWindow*` on Android).
///
/// The bridge acquires the window from the host and hands ownership of that
/// reference to the engine; it never dereferences the pointer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeWindow(NonNull<c_void>);

impl NativeWindow {
    /// Wrap a raw window pointer, returning `None` for null.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

// SAFETY: the window is an opaque token moved between the UI thread and the
// render thread; all access goes through the platform's thread-safe window API.
unsafe impl Send for NativeWindow {}
unsafe impl Sync for NativeWindow {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_window_is_rejected() {
        assert!(NativeWindow::from_raw(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn lon_lat_zoom_projects_to_lon_lat() {
        let llz = LonLatZoom::new(13.4, 52.5, 9.0);
        assert_eq!(llz.lon_lat(), LonLat::new(13.4, 52.5));
    }
}
