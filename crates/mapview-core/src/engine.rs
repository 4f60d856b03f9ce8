// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits for the native map engine.
//
// The bridge never interprets map semantics: each trait method corresponds to
// one forwarded wrapper call. Methods take `&self` because the render loop
// (`run`) blocks on one thread while camera and style calls arrive from the
// UI thread; engines synchronise internally.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::types::{FramebufferSize, LonLat, LonLatZoom, NativeWindow, StorePaths, ViewportSize};

/// A complete map engine session, one per managed wrapper object.
pub trait MapEngine:
    DisplayControl
    + RenderLoop
    + StyleControl
    + CameraControl
    + DebugControl
    + NetworkControl
    + Send
    + Sync
{
    /// Short engine name for diagnostics (e.g. "mbgl", "headless").
    fn engine_name(&self) -> &str;
}

/// EGL display, context and surface management.
pub trait DisplayControl {
    /// Returns `Ok(false)` when the display could not be initialised.
    fn initialize_display(&self) -> Result<bool>;
    fn terminate_display(&self) -> Result<()>;
    /// Returns `Ok(false)` when the context could not be created.
    fn initialize_context(&self) -> Result<bool>;
    fn terminate_context(&self) -> Result<()>;
    /// Takes ownership of the acquired window reference.
    fn create_surface(&self, window: NativeWindow) -> Result<bool>;
    fn destroy_surface(&self) -> Result<()>;
}

/// Render thread lifecycle and frame scheduling.
pub trait RenderLoop {
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;
    /// Runs the render loop; may block until [`RenderLoop::terminate`].
    fn run(&self) -> Result<()>;
    fn rerender(&self) -> Result<()>;
    fn update(&self) -> Result<()>;
    fn terminate(&self) -> Result<()>;
    fn needs_swap(&self) -> Result<bool>;
    fn swapped(&self) -> Result<()>;
    fn resize(&self, viewport: ViewportSize) -> Result<()>;
    fn resize_framebuffer(
        &self,
        viewport: ViewportSize,
        framebuffer: FramebufferSize,
    ) -> Result<()>;
}

/// Style loading and style classes.
pub trait StyleControl {
    fn set_applied_classes(&self, classes: Vec<String>) -> Result<()>;
    fn applied_classes(&self) -> Result<Vec<String>>;
    fn set_default_transition_duration(&self, duration: Duration) -> Result<()>;
    fn default_transition_duration(&self) -> Result<Duration>;
    fn set_style_url(&self, url: &str) -> Result<()>;
    fn set_style_json(&self, json: &str, base: &str) -> Result<()>;
    fn style_json(&self) -> Result<String>;
}

/// Camera movement. Screen coordinates are in logical pixels, angles in
/// degrees.
pub trait CameraControl {
    fn cancel_transitions(&self) -> Result<()>;

    fn move_by(&self, dx: f64, dy: f64, duration: Duration) -> Result<()>;
    fn set_lon_lat(&self, lon_lat: LonLat, duration: Duration) -> Result<()>;
    fn lon_lat(&self) -> Result<LonLat>;
    fn start_panning(&self) -> Result<()>;
    fn stop_panning(&self) -> Result<()>;
    fn reset_position(&self) -> Result<()>;

    fn scale_by(&self, ds: f64, cx: f64, cy: f64, duration: Duration) -> Result<()>;
    fn set_scale(&self, scale: f64, cx: f64, cy: f64, duration: Duration) -> Result<()>;
    fn scale(&self) -> Result<f64>;
    fn set_zoom(&self, zoom: f64, duration: Duration) -> Result<()>;
    fn zoom(&self) -> Result<f64>;
    fn set_lon_lat_zoom(&self, lon_lat_zoom: LonLatZoom, duration: Duration) -> Result<()>;
    fn lon_lat_zoom(&self) -> Result<LonLatZoom>;
    fn reset_zoom(&self) -> Result<()>;
    fn start_scaling(&self) -> Result<()>;
    fn stop_scaling(&self) -> Result<()>;
    fn min_zoom(&self) -> Result<f64>;
    fn max_zoom(&self) -> Result<f64>;

    fn rotate_by(&self, sx: f64, sy: f64, ex: f64, ey: f64, duration: Duration) -> Result<()>;
    fn set_bearing(&self, degrees: f64, duration: Duration) -> Result<()>;
    /// Rotate about a screen point instead of the view centre.
    fn set_bearing_around(&self, degrees: f64, cx: f64, cy: f64) -> Result<()>;
    fn bearing(&self) -> Result<f64>;
    fn reset_north(&self) -> Result<()>;
    fn start_rotating(&self) -> Result<()>;
    fn stop_rotating(&self) -> Result<()>;
}

/// Debug overlays and FPS reporting.
pub trait DebugControl {
    fn set_debug(&self, enabled: bool) -> Result<()>;
    fn toggle_debug(&self) -> Result<()>;
    fn debug(&self) -> Result<bool>;
    /// Start or stop `MapObserver::fps_changed` notifications.
    fn enable_fps(&self, enabled: bool) -> Result<()>;
}

/// File source settings.
pub trait NetworkControl {
    fn set_access_token(&self, token: &str) -> Result<()>;
    fn access_token(&self) -> Result<String>;
    fn set_reachability(&self, reachable: bool) -> Result<()>;
}

/// Notifications delivered from the engine back to the managed wrapper.
///
/// May be invoked from the render thread.
pub trait MapObserver: Send + Sync {
    fn map_changed(&self);
    fn fps_changed(&self, fps: f64);
}

/// Creates engine instances for the bridge.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        paths: StorePaths,
        observer: Arc<dyn MapObserver>,
    ) -> Result<Arc<dyn MapEngine>>;
}
