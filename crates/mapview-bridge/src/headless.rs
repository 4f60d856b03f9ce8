// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless engine for hosts without a GL map engine linked in.
//
// Keeps camera, style and render-loop state without drawing anything. Every
// command is appended to a bounded journal, and a single fault can be armed to make
// the next command fail or panic, so host-side integration tests can observe
// exactly what reached the engine.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use mapview_core::engine::{
    CameraControl, DebugControl, DisplayControl, EngineFactory, MapEngine, MapObserver,
    NetworkControl, RenderLoop, StyleControl,
};
use mapview_core::error::{MapviewError, Result};
use mapview_core::{FramebufferSize, LonLat, LonLatZoom, NativeWindow, StorePaths, ViewportSize};
use tracing::{debug, trace};

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Commands kept in [`HeadlessEngine::journal`]; older entries are dropped.
pub const JOURNAL_CAPACITY: usize = 256;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Observer that discards every notification.
pub struct NullObserver;

impl MapObserver for NullObserver {
    fn map_changed(&self) {}
    fn fps_changed(&self, _fps: f64) {}
}

/// A failure armed with [`HeadlessEngine::arm_fault`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// The next command returns `MapviewError::Engine` with this message.
    Error(String),
    /// The next command panics with this message.
    Panic(String),
}

/// Factory producing [`HeadlessEngine`]s. Remembers what it created so tests
/// can reach the engine behind a handle.
#[derive(Default)]
pub struct HeadlessFactory {
    created: Mutex<Vec<Weak<HeadlessEngine>>>,
}

impl HeadlessFactory {
    /// The most recently created engine that is still alive.
    pub fn last_created(&self) -> Option<Arc<HeadlessEngine>> {
        lock(&self.created).iter().rev().find_map(Weak::upgrade)
    }

    /// Number of created engines that have not been dropped yet.
    pub fn live(&self) -> usize {
        lock(&self.created)
            .iter()
            .filter(|engine| engine.strong_count() > 0)
            .count()
    }
}

impl EngineFactory for HeadlessFactory {
    fn create(
        &self,
        paths: StorePaths,
        observer: Arc<dyn MapObserver>,
    ) -> Result<Arc<dyn MapEngine>> {
        debug!(cache = %paths.cache.display(), "creating headless map");
        let engine = Arc::new(HeadlessEngine::new(paths, observer));
        let mut created = lock(&self.created);
        created.retain(|engine| engine.strong_count() > 0);
        created.push(Arc::downgrade(&engine));
        Ok(engine)
    }
}

struct State {
    display: bool,
    context: bool,
    surface: Option<NativeWindow>,
    running: bool,
    paused: bool,
    terminated: bool,
    needs_swap: bool,
    frames: u64,
    last_frame: Option<Instant>,
    viewport: Option<ViewportSize>,
    framebuffer: Option<FramebufferSize>,

    classes: Vec<String>,
    transition: Duration,
    style_url: Option<String>,
    style_base: String,
    style_json: String,

    access_token: String,
    reachable: bool,

    center: LonLat,
    zoom: f64,
    bearing: f64,
    panning: bool,
    scaling: bool,
    rotating: bool,

    debug: bool,
    fps: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            display: false,
            context: false,
            surface: None,
            running: false,
            paused: false,
            terminated: false,
            needs_swap: false,
            frames: 0,
            last_frame: None,
            viewport: None,
            framebuffer: None,
            classes: Vec::new(),
            transition: Duration::ZERO,
            style_url: None,
            style_base: String::new(),
            style_json: String::new(),
            access_token: String::new(),
            reachable: true,
            center: LonLat::default(),
            zoom: MIN_ZOOM,
            bearing: 0.0,
            panning: false,
            scaling: false,
            rotating: false,
            debug: false,
            fps: false,
        }
    }
}

/// State-only map engine.
pub struct HeadlessEngine {
    paths: StorePaths,
    observer: Arc<dyn MapObserver>,
    state: Mutex<State>,
    journal: Mutex<VecDeque<&'static str>>,
    fault: Mutex<Option<Fault>>,
}

impl HeadlessEngine {
    pub fn new(paths: StorePaths, observer: Arc<dyn MapObserver>) -> Self {
        Self {
            paths,
            observer,
            state: Mutex::new(State::default()),
            journal: Mutex::new(VecDeque::with_capacity(JOURNAL_CAPACITY)),
            fault: Mutex::new(None),
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Names of the most recent commands, oldest first. At most
    /// [`JOURNAL_CAPACITY`] entries are retained.
    pub fn journal(&self) -> Vec<&'static str> {
        lock(&self.journal).iter().copied().collect()
    }

    /// Make the next command fail or panic.
    pub fn arm_fault(&self, fault: Fault) {
        *lock(&self.fault) = Some(fault);
    }

    /// Whether a surface is attached.
    pub fn has_surface(&self) -> bool {
        self.state().surface.is_some()
    }

    /// Frames produced by `run`, `rerender` and `update`.
    pub fn frames(&self) -> u64 {
        self.state().frames
    }

    pub fn viewport(&self) -> Option<ViewportSize> {
        self.state().viewport
    }

    pub fn framebuffer(&self) -> Option<FramebufferSize> {
        self.state().framebuffer
    }

    pub fn is_reachable(&self) -> bool {
        self.state().reachable
    }

    pub fn fps_enabled(&self) -> bool {
        self.state().fps
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Gesture flags as `(panning, scaling, rotating)`.
    pub fn gestures(&self) -> (bool, bool, bool) {
        let state = self.state();
        (state.panning, state.scaling, state.rotating)
    }

    /// The style URL and the base URL of the last inline style.
    pub fn style_source(&self) -> (Option<String>, String) {
        let state = self.state();
        (state.style_url.clone(), state.style_base.clone())
    }

    fn enter(&self, command: &'static str) -> Result<()> {
        trace!(command, "headless command");
        {
            let mut journal = lock(&self.journal);
            if journal.len() == JOURNAL_CAPACITY {
                journal.pop_front();
            }
            journal.push_back(command);
        }
        let fault = lock(&self.fault).take();
        match fault {
            None => Ok(()),
            Some(Fault::Error(message)) => Err(MapviewError::Engine(message)),
            Some(Fault::Panic(message)) => panic!("{message}"),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    fn changed(&self) {
        self.observer.map_changed();
    }

    fn render_frame(&self) {
        let fps = {
            let mut state = self.state();
            if state.terminated || state.paused {
                return;
            }
            state.frames += 1;
            state.needs_swap = true;
            let now = Instant::now();
            let elapsed = state.last_frame.replace(now).map(|last| now - last);
            match (state.fps, elapsed) {
                (true, Some(elapsed)) if !elapsed.is_zero() => Some(1.0 / elapsed.as_secs_f64()),
                (true, _) => Some(0.0),
                (false, _) => None,
            }
        };
        if let Some(fps) = fps {
            self.observer.fps_changed(fps);
        }
    }

    fn viewport_centre(&self) -> (f64, f64) {
        self.state().viewport.map_or((0.0, 0.0), |viewport| {
            (f64::from(viewport.width) / 2.0, f64::from(viewport.height) / 2.0)
        })
    }
}

impl MapEngine for HeadlessEngine {
    fn engine_name(&self) -> &str {
        "headless"
    }
}

impl DisplayControl for HeadlessEngine {
    fn initialize_display(&self) -> Result<bool> {
        self.enter("initialize_display")?;
        self.state().display = true;
        Ok(true)
    }

    fn terminate_display(&self) -> Result<()> {
        self.enter("terminate_display")?;
        let mut state = self.state();
        state.display = false;
        state.context = false;
        Ok(())
    }

    fn initialize_context(&self) -> Result<bool> {
        self.enter("initialize_context")?;
        let mut state = self.state();
        state.context = state.display;
        Ok(state.context)
    }

    fn terminate_context(&self) -> Result<()> {
        self.enter("terminate_context")?;
        self.state().context = false;
        Ok(())
    }

    fn create_surface(&self, window: NativeWindow) -> Result<bool> {
        self.enter("create_surface")?;
        let mut state = self.state();
        if !(state.display && state.context) {
            return Ok(false);
        }
        state.surface = Some(window);
        Ok(true)
    }

    fn destroy_surface(&self) -> Result<()> {
        self.enter("destroy_surface")?;
        self.state().surface = None;
        Ok(())
    }
}

impl RenderLoop for HeadlessEngine {
    fn start(&self) -> Result<()> {
        self.enter("start")?;
        let mut state = self.state();
        state.running = true;
        state.terminated = false;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.enter("stop")?;
        self.state().running = false;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.enter("pause")?;
        self.state().paused = true;
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        self.enter("resume")?;
        self.state().paused = false;
        Ok(())
    }

    /// There is no render thread; `run` produces a single frame.
    fn run(&self) -> Result<()> {
        self.enter("run")?;
        self.render_frame();
        Ok(())
    }

    fn rerender(&self) -> Result<()> {
        self.enter("rerender")?;
        self.render_frame();
        Ok(())
    }

    fn update(&self) -> Result<()> {
        self.enter("update")?;
        self.render_frame();
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        self.enter("terminate")?;
        let mut state = self.state();
        state.terminated = true;
        state.running = false;
        Ok(())
    }

    fn needs_swap(&self) -> Result<bool> {
        self.enter("needs_swap")?;
        Ok(self.state().needs_swap)
    }

    fn swapped(&self) -> Result<()> {
        self.enter("swapped")?;
        self.state().needs_swap = false;
        Ok(())
    }

    fn resize(&self, viewport: ViewportSize) -> Result<()> {
        self.enter("resize")?;
        self.state().viewport = Some(viewport);
        self.changed();
        Ok(())
    }

    fn resize_framebuffer(
        &self,
        viewport: ViewportSize,
        framebuffer: FramebufferSize,
    ) -> Result<()> {
        self.enter("resize_framebuffer")?;
        {
            let mut state = self.state();
            state.viewport = Some(viewport);
            state.framebuffer = Some(framebuffer);
        }
        self.changed();
        Ok(())
    }
}

impl StyleControl for HeadlessEngine {
    fn set_applied_classes(&self, classes: Vec<String>) -> Result<()> {
        self.enter("set_applied_classes")?;
        self.state().classes = classes;
        self.changed();
        Ok(())
    }

    fn applied_classes(&self) -> Result<Vec<String>> {
        self.enter("applied_classes")?;
        Ok(self.state().classes.clone())
    }

    fn set_default_transition_duration(&self, duration: Duration) -> Result<()> {
        self.enter("set_default_transition_duration")?;
        self.state().transition = duration;
        Ok(())
    }

    fn default_transition_duration(&self) -> Result<Duration> {
        self.enter("default_transition_duration")?;
        Ok(self.state().transition)
    }

    fn set_style_url(&self, url: &str) -> Result<()> {
        self.enter("set_style_url")?;
        self.state().style_url = Some(url.to_owned());
        self.changed();
        Ok(())
    }

    fn set_style_json(&self, json: &str, base: &str) -> Result<()> {
        self.enter("set_style_json")?;
        let document: serde_json::Value =
            serde_json::from_str(json).map_err(|e| MapviewError::Style(e.to_string()))?;
        if !document.is_object() {
            return Err(MapviewError::Style("style root must be an object".into()));
        }
        {
            let mut state = self.state();
            state.style_json = json.to_owned();
            state.style_base = base.to_owned();
            state.style_url = None;
        }
        self.changed();
        Ok(())
    }

    fn style_json(&self) -> Result<String> {
        self.enter("style_json")?;
        Ok(self.state().style_json.clone())
    }
}

impl CameraControl for HeadlessEngine {
    fn cancel_transitions(&self) -> Result<()> {
        self.enter("cancel_transitions")?;
        Ok(())
    }

    fn move_by(&self, dx: f64, dy: f64, _duration: Duration) -> Result<()> {
        self.enter("move_by")?;
        {
            let mut state = self.state();
            let world = world_size(state.zoom);
            let (x, y) = project(state.center, world);
            state.center = unproject(x - dx, y - dy, world);
        }
        self.changed();
        Ok(())
    }

    fn set_lon_lat(&self, lon_lat: LonLat, _duration: Duration) -> Result<()> {
        self.enter("set_lon_lat")?;
        self.state().center = lon_lat;
        self.changed();
        Ok(())
    }

    fn lon_lat(&self) -> Result<LonLat> {
        self.enter("lon_lat")?;
        Ok(self.state().center)
    }

    fn start_panning(&self) -> Result<()> {
        self.enter("start_panning")?;
        self.state().panning = true;
        Ok(())
    }

    fn stop_panning(&self) -> Result<()> {
        self.enter("stop_panning")?;
        self.state().panning = false;
        Ok(())
    }

    fn reset_position(&self) -> Result<()> {
        self.enter("reset_position")?;
        self.state().center = LonLat::default();
        self.changed();
        Ok(())
    }

    /// The anchor point is ignored; headless maps scale about the centre.
    fn scale_by(&self, ds: f64, _cx: f64, _cy: f64, _duration: Duration) -> Result<()> {
        self.enter("scale_by")?;
        if !(ds > 0.0) {
            return Err(MapviewError::Engine(format!("scale factor must be positive, got {ds}")));
        }
        {
            let mut state = self.state();
            state.zoom = clamp_zoom(state.zoom + ds.log2())?;
        }
        self.changed();
        Ok(())
    }

    fn set_scale(&self, scale: f64, _cx: f64, _cy: f64, _duration: Duration) -> Result<()> {
        self.enter("set_scale")?;
        if !(scale > 0.0) {
            return Err(MapviewError::Engine(format!("scale must be positive, got {scale}")));
        }
        self.state().zoom = clamp_zoom(scale.log2())?;
        self.changed();
        Ok(())
    }

    fn scale(&self) -> Result<f64> {
        self.enter("scale")?;
        Ok(self.state().zoom.exp2())
    }

    fn set_zoom(&self, zoom: f64, _duration: Duration) -> Result<()> {
        self.enter("set_zoom")?;
        self.state().zoom = clamp_zoom(zoom)?;
        self.changed();
        Ok(())
    }

    fn zoom(&self) -> Result<f64> {
        self.enter("zoom")?;
        Ok(self.state().zoom)
    }

    fn set_lon_lat_zoom(&self, lon_lat_zoom: LonLatZoom, _duration: Duration) -> Result<()> {
        self.enter("set_lon_lat_zoom")?;
        let zoom = clamp_zoom(lon_lat_zoom.zoom)?;
        {
            let mut state = self.state();
            state.center = lon_lat_zoom.lon_lat();
            state.zoom = zoom;
        }
        self.changed();
        Ok(())
    }

    fn lon_lat_zoom(&self) -> Result<LonLatZoom> {
        self.enter("lon_lat_zoom")?;
        let state = self.state();
        Ok(LonLatZoom::new(state.center.lon, state.center.lat, state.zoom))
    }

    fn reset_zoom(&self) -> Result<()> {
        self.enter("reset_zoom")?;
        self.state().zoom = MIN_ZOOM;
        self.changed();
        Ok(())
    }

    fn start_scaling(&self) -> Result<()> {
        self.enter("start_scaling")?;
        self.state().scaling = true;
        Ok(())
    }

    fn stop_scaling(&self) -> Result<()> {
        self.enter("stop_scaling")?;
        self.state().scaling = false;
        Ok(())
    }

    fn min_zoom(&self) -> Result<f64> {
        self.enter("min_zoom")?;
        Ok(MIN_ZOOM)
    }

    fn max_zoom(&self) -> Result<f64> {
        self.enter("max_zoom")?;
        Ok(MAX_ZOOM)
    }

    fn rotate_by(&self, sx: f64, sy: f64, ex: f64, ey: f64, _duration: Duration) -> Result<()> {
        self.enter("rotate_by")?;
        let (cx, cy) = self.viewport_centre();
        let start = (sy - cy).atan2(sx - cx);
        let end = (ey - cy).atan2(ex - cx);
        {
            let mut state = self.state();
            state.bearing = normalize_bearing(state.bearing + (end - start).to_degrees());
        }
        self.changed();
        Ok(())
    }

    fn set_bearing(&self, degrees: f64, _duration: Duration) -> Result<()> {
        self.enter("set_bearing")?;
        self.state().bearing = normalize_bearing(degrees);
        self.changed();
        Ok(())
    }

    /// The anchor point is ignored; headless maps rotate about the centre.
    fn set_bearing_around(&self, degrees: f64, _cx: f64, _cy: f64) -> Result<()> {
        self.enter("set_bearing_around")?;
        self.state().bearing = normalize_bearing(degrees);
        self.changed();
        Ok(())
    }

    fn bearing(&self) -> Result<f64> {
        self.enter("bearing")?;
        Ok(self.state().bearing)
    }

    fn reset_north(&self) -> Result<()> {
        self.enter("reset_north")?;
        self.state().bearing = 0.0;
        self.changed();
        Ok(())
    }

    fn start_rotating(&self) -> Result<()> {
        self.enter("start_rotating")?;
        self.state().rotating = true;
        Ok(())
    }

    fn stop_rotating(&self) -> Result<()> {
        self.enter("stop_rotating")?;
        self.state().rotating = false;
        Ok(())
    }
}

impl DebugControl for HeadlessEngine {
    fn set_debug(&self, enabled: bool) -> Result<()> {
        self.enter("set_debug")?;
        self.state().debug = enabled;
        self.changed();
        Ok(())
    }

    fn toggle_debug(&self) -> Result<()> {
        self.enter("toggle_debug")?;
        {
            let mut state = self.state();
            state.debug = !state.debug;
        }
        self.changed();
        Ok(())
    }

    fn debug(&self) -> Result<bool> {
        self.enter("debug")?;
        Ok(self.state().debug)
    }

    fn enable_fps(&self, enabled: bool) -> Result<()> {
        self.enter("enable_fps")?;
        let mut state = self.state();
        state.fps = enabled;
        state.last_frame = None;
        Ok(())
    }
}

impl NetworkControl for HeadlessEngine {
    fn set_access_token(&self, token: &str) -> Result<()> {
        self.enter("set_access_token")?;
        self.state().access_token = token.to_owned();
        Ok(())
    }

    fn access_token(&self) -> Result<String> {
        self.enter("access_token")?;
        Ok(self.state().access_token.clone())
    }

    fn set_reachability(&self, reachable: bool) -> Result<()> {
        self.enter("set_reachability")?;
        self.state().reachable = reachable;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn clamp_zoom(zoom: f64) -> Result<f64> {
    if !zoom.is_finite() {
        return Err(MapviewError::Engine(format!("zoom must be finite, got {zoom}")));
    }
    Ok(zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

// Spherical mercator, origin at the top-left corner of the world square.
fn project(lon_lat: LonLat, world: f64) -> (f64, f64) {
    let lat = lon_lat.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = (lon_lat.lon + 180.0) / 360.0 * world;
    let y = (180.0 - (PI / 4.0 + lat.to_radians() / 2.0).tan().ln().to_degrees()) / 360.0 * world;
    (x, y)
}

fn unproject(x: f64, y: f64, world: f64) -> LonLat {
    let lon = x / world * 360.0 - 180.0;
    let y2 = 180.0 - y / world * 360.0;
    let lat = (y2.to_radians().exp().atan().to_degrees() * 2.0) - 90.0;
    LonLat::new(lon, lat.clamp(-MAX_LATITUDE, MAX_LATITUDE))
}
