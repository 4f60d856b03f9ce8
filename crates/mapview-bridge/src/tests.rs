// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end scenarios: a `TestHost` calls the registered natives the way the
// managed wrapper would and observes the headless engine behind the handle.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use mapview_core::BridgeConfig;
use tracing_subscriber::fmt::MakeWriter;

use crate::bridge::Bridge;
use crate::error::NATIVE_EXCEPTION_PREFIX;
use crate::headless::{Fault, HeadlessEngine, HeadlessFactory, JOURNAL_CAPACITY};
use crate::host::{HostRef, HostValue};
use crate::marshal::{NULL_LIST, NULL_LIST_ELEMENT, NULL_LON_LAT, NULL_LON_LAT_ZOOM, NULL_STRING};
use crate::ops::{GL_CONTEXT_FAILED, GL_SURFACE_FAILED, NULL_SURFACE};
use crate::testing::{TestHost, Thrown};

const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";
const NULL_POINTER_EXCEPTION: &str = "java/lang/NullPointerException";

struct Fixture {
    host: TestHost,
    factory: Arc<HeadlessFactory>,
    bridge: Bridge,
}

impl Fixture {
    fn new() -> Self {
        let mut host = TestHost::new();
        let factory = Arc::new(HeadlessFactory::default());
        let bridge = Bridge::attach(&mut host, BridgeConfig::default(), factory.clone()).unwrap();
        Self {
            host,
            factory,
            bridge,
        }
    }

    fn call(&mut self, name: &str, args: &[HostValue]) -> HostValue {
        self.host.call(&self.bridge, name, args)
    }

    fn create(&mut self) -> i64 {
        let cache = self.host.string("/cache");
        let data = self.host.string("/data");
        let apk = self.host.string("/apk");
        let handle = self.call("nativeCreate", &[cache.into(), data.into(), apk.into()]);
        handle.as_long().unwrap()
    }

    fn engine(&self) -> Arc<HeadlessEngine> {
        self.factory.last_created().unwrap()
    }

    fn only_exception(&mut self) -> Thrown {
        assert_eq!(self.host.thrown().len(), 1, "thrown: {:?}", self.host.thrown());
        self.host.take_exception().unwrap()
    }
}

#[test]
fn create_zoom_destroy() {
    let mut f = Fixture::new();
    let h = f.create();
    assert_ne!(h, 0);

    let paths = f.engine().paths().clone();
    assert_eq!(paths.cache.to_str(), Some("/cache"));
    assert_eq!(paths.data.to_str(), Some("/data"));
    assert_eq!(paths.assets.to_str(), Some("/apk"));

    f.call("nativeSetZoom", &[HostValue::Long(h), HostValue::Double(10.0), HostValue::Double(0.0)]);
    let zoom = f.call("nativeGetZoom", &[HostValue::Long(h)]);
    assert_eq!(zoom, HostValue::Double(10.0));
    assert!(f.host.observers()[0].map_changes() >= 1);

    f.call("nativeDestroy", &[HostValue::Long(h)]);
    assert_eq!(f.factory.live(), 0);
    assert!(f.host.thrown().is_empty());
}

#[test]
fn null_path_aborts_creation() {
    let mut f = Fixture::new();
    let cache = f.host.string("/cache");
    let apk = f.host.string("/apk");
    let handle = f.call("nativeCreate", &[cache.into(), HostRef::NULL.into(), apk.into()]);

    assert_eq!(handle, HostValue::Long(0));
    assert_eq!(f.factory.live(), 0);
    let thrown = f.only_exception();
    assert_eq!(thrown.class, NULL_POINTER_EXCEPTION);
    assert_eq!(thrown.message, NULL_STRING);
}

#[test]
fn applied_classes_round_trip() {
    let mut f = Fixture::new();
    let h = f.create();
    let classes = f.host.list(&["day", "night"]);
    f.call("nativeSetAppliedClasses", &[HostValue::Long(h), classes.into()]);

    let out = f.call("nativeGetAppliedClasses", &[HostValue::Long(h)]);
    let out = out.as_object().unwrap();
    assert_eq!(
        f.host.read_list(out),
        Some(vec!["day".to_owned(), "night".to_owned()])
    );
    assert_eq!(f.host.live_locals(), 0);
}

#[test]
fn null_list_and_null_element_never_reach_the_engine() {
    let mut f = Fixture::new();
    let h = f.create();
    let before = f.engine().journal();

    f.call("nativeSetAppliedClasses", &[HostValue::Long(h), HostRef::NULL.into()]);
    let thrown = f.host.take_exception().unwrap();
    assert_eq!(thrown.class, NULL_POINTER_EXCEPTION);
    assert_eq!(thrown.message, NULL_LIST);

    let day = f.host.string("day");
    let list = f.host.list_of(vec![day, HostRef::NULL]);
    f.call("nativeSetAppliedClasses", &[HostValue::Long(h), list.into()]);
    let thrown = f.host.take_exception().unwrap();
    assert_eq!(thrown.class, NULL_POINTER_EXCEPTION);
    assert_eq!(thrown.message, NULL_LIST_ELEMENT);

    assert_eq!(f.engine().journal(), before);
    assert_eq!(f.host.calls_while_pending(), 0);
}

#[test]
fn null_surface_is_rejected() {
    let mut f = Fixture::new();
    let h = f.create();
    f.call("nativeCreateSurface", &[HostValue::Long(h), HostRef::NULL.into()]);
    let thrown = f.only_exception();
    assert_eq!(thrown.class, NULL_POINTER_EXCEPTION);
    assert_eq!(thrown.message, NULL_SURFACE);
    assert!(!f.engine().has_surface());
}

#[test]
fn engine_error_raises_one_runtime_exception() {
    let mut f = Fixture::new();
    let h = f.create();
    f.engine().arm_fault(Fault::Error("tile store is read-only".into()));

    let zoom = f.call("nativeGetZoom", &[HostValue::Long(h)]);
    assert_eq!(zoom, HostValue::Double(0.0));
    let thrown = f.only_exception();
    assert_eq!(thrown.class, RUNTIME_EXCEPTION);
    assert_eq!(
        thrown.message,
        format!("{NATIVE_EXCEPTION_PREFIX}tile store is read-only")
    );
    assert_eq!(f.host.calls_while_pending(), 0);
}

#[test]
fn engine_panic_is_contained() {
    let mut f = Fixture::new();
    let h = f.create();
    f.engine().arm_fault(Fault::Panic("render thread lost".into()));

    let style = f.call("nativeGetStyleJson", &[HostValue::Long(h)]);
    assert_eq!(style, HostValue::Object(HostRef::NULL));
    let thrown = f.only_exception();
    assert_eq!(thrown.class, RUNTIME_EXCEPTION);
    assert!(thrown.message.starts_with(NATIVE_EXCEPTION_PREFIX));
    assert!(thrown.message.contains("render thread lost"));

    // The map stays usable after the fault.
    let zoom = f.call("nativeGetZoom", &[HostValue::Long(h)]);
    assert_eq!(zoom, HostValue::Double(0.0));
    assert!(f.host.take_exception().is_none());
}

#[test]
fn allocation_failure_keeps_the_host_exception() {
    let mut f = Fixture::new();
    let h = f.create();
    f.host.fail_allocations(true);

    let token = f.call("nativeGetAccessToken", &[HostValue::Long(h)]);
    assert_eq!(token, HostValue::Object(HostRef::NULL));
    let thrown = f.only_exception();
    assert_eq!(thrown.class, "java/lang/OutOfMemoryError");
    assert_eq!(f.host.calls_while_pending(), 0);
}

#[test]
fn overloads_reach_distinct_engine_commands() {
    let mut f = Fixture::new();
    let h = f.create();
    let map = f.engine();

    f.call(
        "nativeResize",
        &[HostValue::Long(h), HostValue::Int(800), HostValue::Int(600), HostValue::Float(2.0)],
    );
    assert_eq!(map.journal().last(), Some(&"resize"));

    f.call(
        "nativeResize",
        &[
            HostValue::Long(h),
            HostValue::Int(800),
            HostValue::Int(600),
            HostValue::Float(2.0),
            HostValue::Int(1600),
            HostValue::Int(1200),
        ],
    );
    assert_eq!(map.journal().last(), Some(&"resize_framebuffer"));
    let framebuffer = map.framebuffer().unwrap();
    assert_eq!((framebuffer.width, framebuffer.height), (1600, 1200));

    let bearing = [HostValue::Long(h), HostValue::Double(90.0), HostValue::Double(0.0)];
    f.call("nativeSetBearing", &bearing);
    assert_eq!(map.journal().last(), Some(&"set_bearing"));

    f.call(
        "nativeSetBearing",
        &[
            HostValue::Long(h),
            HostValue::Double(45.0),
            HostValue::Double(400.0),
            HostValue::Double(300.0),
        ],
    );
    assert_eq!(map.journal().last(), Some(&"set_bearing_around"));
    assert_eq!(f.call("nativeGetBearing", &[HostValue::Long(h)]), HostValue::Double(45.0));
}

#[test]
fn negative_dimension_is_invalid() {
    let mut f = Fixture::new();
    let h = f.create();
    f.call(
        "nativeResize",
        &[HostValue::Long(h), HostValue::Int(-1), HostValue::Int(600), HostValue::Float(1.0)],
    );
    let thrown = f.only_exception();
    assert_eq!(thrown.class, RUNTIME_EXCEPTION);
    assert!(thrown.message.contains("-1"));
    assert!(f.engine().viewport().is_none());
}

#[test]
fn camera_values_cross_as_value_objects() {
    let mut f = Fixture::new();
    let h = f.create();
    let target = f.host.lon_lat_zoom(13.4, 52.5, 11.0);
    f.call("nativeSetLonLatZoom", &[HostValue::Long(h), target.into(), HostValue::Double(0.0)]);

    let out = f.call("nativeGetLonLatZoom", &[HostValue::Long(h)]);
    let camera = f.host.read_lon_lat_zoom(out.as_object().unwrap()).unwrap();
    assert!((camera.lon - 13.4).abs() < 1e-9);
    assert!((camera.lat - 52.5).abs() < 1e-9);
    assert!((camera.zoom - 11.0).abs() < 1e-9);

    let out = f.call("nativeGetLonLat", &[HostValue::Long(h)]);
    let centre = f.host.read_lon_lat(out.as_object().unwrap()).unwrap();
    assert!((centre.lon - 13.4).abs() < 1e-9);
}

#[test]
fn render_cycle() {
    let mut f = Fixture::new();
    let h = f.create();
    let handle = [HostValue::Long(h)];

    f.call("nativeInitializeContext", &handle);
    let thrown = f.host.take_exception().unwrap();
    assert_eq!(thrown.message, GL_CONTEXT_FAILED);

    f.call("nativeInitializeDisplay", &handle);
    f.call("nativeInitializeContext", &handle);
    let surface = f.host.surface();
    f.call("nativeCreateSurface", &[HostValue::Long(h), surface.into()]);
    assert!(f.host.take_exception().is_none());
    assert!(f.engine().has_surface());

    f.call("nativeSetDebug", &[HostValue::Long(h), HostValue::Boolean(true)]);
    assert!(f.engine().fps_enabled());
    f.call("nativeRun", &handle);
    assert_eq!(f.call("nativeNeedsSwap", &handle), HostValue::Boolean(true));
    f.call("nativeSwapped", &handle);
    assert_eq!(f.call("nativeNeedsSwap", &handle), HostValue::Boolean(false));
    assert!(!f.host.observers()[0].fps().is_empty());

    f.call("nativeToggleDebug", &handle);
    assert_eq!(f.call("nativeGetDebug", &handle), HostValue::Boolean(false));
    assert!(!f.engine().fps_enabled());
}

#[test]
fn released_surface_cannot_be_used() {
    let mut f = Fixture::new();
    let h = f.create();
    let surface = f.host.released_surface();
    f.call("nativeCreateSurface", &[HostValue::Long(h), surface.into()]);
    let thrown = f.only_exception();
    assert_eq!(thrown.class, RUNTIME_EXCEPTION);
    assert_eq!(thrown.message, GL_SURFACE_FAILED);
}

#[test]
fn destroyed_handle_is_stale() {
    let mut f = Fixture::new();
    let h = f.create();
    f.call("nativeDestroy", &[HostValue::Long(h)]);

    let zoom = f.call("nativeGetZoom", &[HostValue::Long(h)]);
    assert_eq!(zoom, HostValue::Double(0.0));
    let thrown = f.only_exception();
    assert_eq!(thrown.class, RUNTIME_EXCEPTION);
    assert!(thrown.message.contains("does not refer to a live map"));
}

#[test]
#[should_panic(expected = "null map handle")]
fn zero_handle_is_fatal() {
    let mut f = Fixture::new();
    f.call("nativeGetZoom", &[HostValue::Long(0)]);
}

#[test]
fn reload_starts_from_scratch() {
    let mut f = Fixture::new();
    let h = f.create();
    let Fixture {
        mut host, bridge, ..
    } = f;
    bridge.detach(&mut host);
    assert_eq!(host.live_globals(), 0);

    let factory = Arc::new(HeadlessFactory::default());
    let bridge = Bridge::attach(&mut host, BridgeConfig::default(), factory.clone()).unwrap();
    let zoom = host.call(&bridge, "nativeGetZoom", &[HostValue::Long(h)]);
    assert_eq!(zoom, HostValue::Double(0.0));
    assert!(host.take_exception().is_some());
    bridge.detach(&mut host);
    assert_eq!(host.live_globals(), 0);
}

#[test]
fn null_references_are_rejected_before_the_engine() {
    let mut f = Fixture::new();
    let h = f.create();
    let map = f.engine();
    let json = f.host.string("{}");
    let base = f.host.string("asset://");
    let null = HostValue::Object(HostRef::NULL);
    let zero = HostValue::Double(0.0);

    let cases: [(&str, Vec<HostValue>, &str); 6] = [
        ("nativeSetStyleUrl", vec![HostValue::Long(h), null], NULL_STRING),
        ("nativeSetStyleJson", vec![HostValue::Long(h), null, base.into()], NULL_STRING),
        ("nativeSetStyleJson", vec![HostValue::Long(h), json.into(), null], NULL_STRING),
        ("nativeSetAccessToken", vec![HostValue::Long(h), null], NULL_STRING),
        ("nativeSetLonLat", vec![HostValue::Long(h), null, zero], NULL_LON_LAT),
        ("nativeSetLonLatZoom", vec![HostValue::Long(h), null, zero], NULL_LON_LAT_ZOOM),
    ];
    for (name, args, message) in cases {
        let before = map.journal();
        f.call(name, &args);
        let thrown = f.host.take_exception().unwrap();
        assert_eq!(thrown.class, NULL_POINTER_EXCEPTION, "{name}");
        assert_eq!(thrown.message, message, "{name}");
        assert_eq!(map.journal(), before, "{name} reached the engine");
    }
    assert_eq!(map.style_source(), (None, String::new()));
    assert_eq!(f.host.calls_while_pending(), 0);
}

#[test]
fn style_and_network_settings_reach_the_engine() {
    let mut f = Fixture::new();
    let h = f.create();
    let map = f.engine();

    let url = f.host.string("asset://styles/bright.json");
    f.call("nativeSetStyleUrl", &[HostValue::Long(h), url.into()]);
    assert_eq!(map.style_source().0.as_deref(), Some("asset://styles/bright.json"));

    let json = f.host.string(r#"{"version":8,"layers":[]}"#);
    let base = f.host.string("asset://styles/");
    f.call("nativeSetStyleJson", &[HostValue::Long(h), json.into(), base.into()]);
    assert_eq!(map.style_source(), (None, "asset://styles/".to_owned()));
    let out = f.call("nativeGetStyleJson", &[HostValue::Long(h)]);
    let style = f.host.read_string(out.as_object().unwrap()).unwrap();
    assert!(style.contains("\"version\":8"), "{style}");

    let token = f.host.string("pk.test-token");
    f.call("nativeSetAccessToken", &[HostValue::Long(h), token.into()]);
    let out = f.call("nativeGetAccessToken", &[HostValue::Long(h)]);
    assert_eq!(
        f.host.read_string(out.as_object().unwrap()),
        Some("pk.test-token".to_owned())
    );

    assert!(map.is_reachable());
    f.call("nativeSetReachability", &[HostValue::Long(h), HostValue::Boolean(false)]);
    assert!(!map.is_reachable());
    f.call("nativeSetReachability", &[HostValue::Long(h), HostValue::Boolean(true)]);
    assert!(map.is_reachable());
    assert!(f.host.thrown().is_empty());
}

#[test]
fn gestures_are_routed_to_their_own_commands() {
    let mut f = Fixture::new();
    let h = f.create();
    let map = f.engine();
    let handle = [HostValue::Long(h)];

    f.call("nativeStartScaling", &handle);
    assert_eq!(map.journal().last(), Some(&"start_scaling"));
    assert_eq!(map.gestures(), (false, true, false));

    f.call("nativeStartPanning", &handle);
    assert_eq!(map.gestures(), (true, true, false));

    f.call("nativeStopScaling", &handle);
    assert_eq!(map.journal().last(), Some(&"stop_scaling"));
    assert_eq!(map.gestures(), (true, false, false));

    f.call("nativeStartRotating", &handle);
    f.call("nativeStopPanning", &handle);
    assert_eq!(map.gestures(), (false, false, true));
    f.call("nativeStopRotating", &handle);
    assert_eq!(map.gestures(), (false, false, false));
}

#[test]
fn start_and_stop_toggle_the_render_loop() {
    let mut f = Fixture::new();
    let h = f.create();
    let map = f.engine();
    assert!(!map.is_running());
    f.call("nativeStart", &[HostValue::Long(h)]);
    assert!(map.is_running());
    f.call("nativeStop", &[HostValue::Long(h)]);
    assert!(!map.is_running());
}

#[test]
fn overloads_resolve_by_descriptor() {
    let mut f = Fixture::new();
    let h = f.create();
    let map = f.engine();
    let args = [
        HostValue::Long(h),
        HostValue::Double(30.0),
        HostValue::Double(10.0),
        HostValue::Double(10.0),
    ];
    f.host.call_descriptor(&f.bridge, "nativeSetBearing", "(JDDD)V", &args);
    assert_eq!(map.journal().last(), Some(&"set_bearing_around"));

    let args = [HostValue::Long(h), HostValue::Double(60.0), HostValue::Double(0.0)];
    f.host.call_descriptor(&f.bridge, "nativeSetBearing", "(JDD)V", &args);
    assert_eq!(map.journal().last(), Some(&"set_bearing"));
    assert_eq!(f.call("nativeGetBearing", &[HostValue::Long(h)]), HostValue::Double(60.0));
}

#[test]
fn non_finite_zoom_is_an_engine_error() {
    let mut f = Fixture::new();
    let h = f.create();
    let zoom = [HostValue::Long(h), HostValue::Double(7.0), HostValue::Double(0.0)];
    f.call("nativeSetZoom", &zoom);

    let zoom = [HostValue::Long(h), HostValue::Double(f64::NAN), HostValue::Double(0.0)];
    f.call("nativeSetZoom", &zoom);
    let thrown = f.only_exception();
    assert_eq!(thrown.class, RUNTIME_EXCEPTION);
    assert!(thrown.message.starts_with(NATIVE_EXCEPTION_PREFIX));
    assert_eq!(f.call("nativeGetZoom", &[HostValue::Long(h)]), HostValue::Double(7.0));
}

#[test]
fn per_frame_calls_keep_the_journal_bounded() {
    let mut f = Fixture::new();
    let h = f.create();
    for _ in 0..JOURNAL_CAPACITY * 4 {
        f.call("nativeNeedsSwap", &[HostValue::Long(h)]);
        f.call("nativeSwapped", &[HostValue::Long(h)]);
    }
    let journal = f.engine().journal();
    assert_eq!(journal.len(), JOURNAL_CAPACITY);
    assert_eq!(journal.last(), Some(&"swapped"));
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn calls_are_traced_by_method_name() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();

    let mut f = Fixture::new();
    let h = f.create();
    tracing::subscriber::with_default(subscriber, || {
        let zoom = [HostValue::Long(h), HostValue::Double(3.0), HostValue::Double(0.0)];
        f.call("nativeSetZoom", &zoom);
    });

    let text = capture.text();
    assert!(text.contains("mapview::jni"), "{text}");
    assert!(text.contains("nativeSetZoom"), "{text}");
}
