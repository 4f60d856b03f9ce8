// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for boundary crossings: string import, list and value
// object conversion, and the full dispatch path of a trivial getter. Runs
// against the in-memory host (`--features test-host`).

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use mapview_bridge::headless::HeadlessFactory;
use mapview_bridge::marshal;
use mapview_bridge::testing::TestHost;
use mapview_bridge::{Bridge, HostValue};
use mapview_core::BridgeConfig;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn attached() -> (TestHost, Bridge, i64) {
    let mut host = TestHost::new();
    let bridge = Bridge::attach(
        &mut host,
        BridgeConfig::default(),
        Arc::new(HeadlessFactory::default()),
    )
    .expect("attach");
    let cache = host.string("/cache");
    let data = host.string("/data");
    let apk = host.string("/apk");
    let handle = host
        .call(&bridge, "nativeCreate", &[cache.into(), data.into(), apk.into()])
        .as_long()
        .expect("handle");
    (host, bridge, handle)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_import_string(c: &mut Criterion) {
    let mut host = TestHost::new();
    let ascii = host.string(&"tiles/".repeat(40));
    let mixed = host.string(&"Zürich 東京 🗺 ".repeat(20));

    c.bench_function("import_string_ascii_240", |b| {
        b.iter(|| marshal::import_string(&mut host, black_box(ascii)).expect("import"))
    });
    c.bench_function("import_string_mixed_260", |b| {
        b.iter(|| marshal::import_string(&mut host, black_box(mixed)).expect("import"))
    });
}

fn bench_applied_classes(c: &mut Criterion) {
    let (mut host, bridge, handle) = attached();
    let names: Vec<String> = (0..32).map(|i| format!("layer-class-{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let list = host.list(&refs);

    c.bench_function("set_applied_classes_32", |b| {
        b.iter(|| {
            host.call(
                &bridge,
                "nativeSetAppliedClasses",
                &[HostValue::Long(handle), black_box(list).into()],
            )
        })
    });
    c.bench_function("get_applied_classes_32", |b| {
        b.iter(|| host.call(&bridge, "nativeGetAppliedClasses", &[HostValue::Long(handle)]))
    });
}

fn bench_value_objects(c: &mut Criterion) {
    let (mut host, bridge, handle) = attached();
    let camera = host.lon_lat_zoom(-122.4194, 37.7749, 12.5);

    c.bench_function("import_lon_lat_zoom", |b| {
        b.iter(|| {
            marshal::import_lon_lat_zoom(&mut host, bridge.cache(), black_box(camera))
                .expect("import")
        })
    });
    c.bench_function("get_lon_lat_zoom", |b| {
        b.iter(|| host.call(&bridge, "nativeGetLonLatZoom", &[HostValue::Long(handle)]))
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let (mut host, bridge, handle) = attached();

    c.bench_function("dispatch_get_zoom", |b| {
        b.iter(|| host.call(&bridge, "nativeGetZoom", &[HostValue::Long(black_box(handle))]))
    });
}

criterion_group!(
    benches,
    bench_import_string,
    bench_applied_classes,
    bench_value_objects,
    bench_dispatch,
);
criterion_main!(benches);
