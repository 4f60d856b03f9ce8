// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation bodies. Each one imports its arguments, forwards to the engine
// and exports the result; none of them interprets map semantics.

use std::path::PathBuf;
use std::time::Duration;

use mapview_core::engine::MapEngine;
use mapview_core::{FramebufferSize, StorePaths, ViewportSize};
use tracing::info;

use crate::bridge::Bridge;
use crate::dispatch::Op;
use crate::error::{BridgeError, Result};
use crate::host::{HostEnv, HostRef, HostValue};
use crate::marshal;
use crate::metadata::MetadataCache;

pub const GL_DISPLAY_FAILED: &str = "Unable to initialize GL display.";
pub const GL_CONTEXT_FAILED: &str = "Unable to initialize GL context.";
pub const GL_SURFACE_FAILED: &str = "Unable to create GL surface.";
pub const NULL_SURFACE: &str = "Surface cannot be null.";

/// Positional access to already kind-checked arguments.
struct Args<'a>(&'a [HostValue]);

impl Args<'_> {
    fn get<T>(&self, index: usize, read: impl FnOnce(&HostValue) -> Option<T>) -> Result<T> {
        self.0
            .get(index)
            .and_then(read)
            .ok_or_else(|| BridgeError::Dispatch(format!("argument {index} has the wrong kind")))
    }

    fn long(&self, index: usize) -> Result<i64> {
        self.get(index, HostValue::as_long)
    }

    fn int(&self, index: usize) -> Result<i32> {
        self.get(index, HostValue::as_int)
    }

    fn float(&self, index: usize) -> Result<f32> {
        self.get(index, HostValue::as_float)
    }

    fn double(&self, index: usize) -> Result<f64> {
        self.get(index, HostValue::as_double)
    }

    fn boolean(&self, index: usize) -> Result<bool> {
        self.get(index, HostValue::as_bool)
    }

    fn object(&self, index: usize) -> Result<HostRef> {
        self.get(index, HostValue::as_object)
    }

    /// Camera animation duration, in seconds.
    fn seconds(&self, index: usize) -> Result<Duration> {
        let seconds = self.double(index)?;
        Duration::try_from_secs_f64(seconds)
            .map_err(|e| BridgeError::InvalidArgument(format!("duration {seconds}s: {e}")))
    }

    fn dimension(&self, index: usize, what: &str) -> Result<u16> {
        let value = self.int(index)?;
        u16::try_from(value)
            .map_err(|_| {
                BridgeError::InvalidArgument(format!("{what} {value} is outside 0..=65535"))
            })
    }
}

pub(crate) fn execute<H: HostEnv + ?Sized>(
    bridge: &Bridge,
    host: &mut H,
    wrapper: HostRef,
    op: Op,
    args: &[HostValue],
) -> Result<HostValue> {
    let args = Args(args);
    match op {
        Op::Create => create(bridge, host, wrapper, &args),
        Op::Destroy => {
            let map = bridge.handles().remove(args.long(0)?)?;
            info!(
                target: "mapview::jni",
                handle = args.long(0)?,
                engine = map.engine_name(),
                "map destroyed"
            );
            Ok(HostValue::Void)
        }
        _ => {
            let map = bridge.map(args.long(0)?)?;
            forward(bridge.cache(), host, map.as_ref(), op, &args)
        }
    }
}

fn create<H: HostEnv + ?Sized>(
    bridge: &Bridge,
    host: &mut H,
    wrapper: HostRef,
    args: &Args<'_>,
) -> Result<HostValue> {
    let paths = StorePaths {
        cache: PathBuf::from(marshal::import_string(host, args.object(0)?)?),
        data: PathBuf::from(marshal::import_string(host, args.object(1)?)?),
        assets: PathBuf::from(marshal::import_string(host, args.object(2)?)?),
    };
    let observer = host.observer(wrapper, bridge.cache().callbacks)?;
    let engine = bridge
        .factory()
        .create(paths, observer)
        .map_err(|e| BridgeError::Construction(e.to_string()))?;
    let engine_name = engine.engine_name().to_owned();
    let handle = bridge.handles().insert(engine);
    info!(target: "mapview::jni", handle = handle.to_raw(), engine = %engine_name, "map created");
    Ok(HostValue::Long(handle.to_raw()))
}

fn require(ok: bool, message: &'static str) -> Result<HostValue> {
    if ok {
        Ok(HostValue::Void)
    } else {
        Err(BridgeError::Unable(message))
    }
}

fn forward<H: HostEnv + ?Sized>(
    cache: &MetadataCache,
    host: &mut H,
    map: &dyn MapEngine,
    op: Op,
    args: &Args<'_>,
) -> Result<HostValue> {
    use HostValue::{Boolean, Double, Long, Object, Void};

    let value = match op {
        Op::Create | Op::Destroy => {
            return Err(BridgeError::Dispatch(format!(
                "{} does not operate on a live map",
                op.spec().name
            )));
        }

        // Display
        Op::InitializeDisplay => return require(map.initialize_display()?, GL_DISPLAY_FAILED),
        Op::TerminateDisplay => {
            map.terminate_display()?;
            Void
        }
        Op::InitializeContext => return require(map.initialize_context()?, GL_CONTEXT_FAILED),
        Op::TerminateContext => {
            map.terminate_context()?;
            Void
        }
        Op::CreateSurface => {
            let surface = args.object(1)?;
            if surface.is_null() {
                return Err(BridgeError::NullArgument(NULL_SURFACE));
            }
            let window = host
                .native_window(surface)?
                .ok_or(BridgeError::Unable(GL_SURFACE_FAILED))?;
            return require(map.create_surface(window)?, GL_SURFACE_FAILED);
        }
        Op::DestroySurface => {
            map.destroy_surface()?;
            Void
        }

        // Render loop
        Op::Start => {
            map.start()?;
            Void
        }
        Op::Stop => {
            map.stop()?;
            Void
        }
        Op::Pause => {
            map.pause()?;
            Void
        }
        Op::Resume => {
            map.resume()?;
            Void
        }
        Op::Run => {
            map.run()?;
            Void
        }
        Op::Rerender => {
            map.rerender()?;
            Void
        }
        Op::Update => {
            map.update()?;
            Void
        }
        Op::Terminate => {
            map.terminate()?;
            Void
        }
        Op::NeedsSwap => Boolean(map.needs_swap()?),
        Op::Swapped => {
            map.swapped()?;
            Void
        }
        Op::Resize => {
            map.resize(viewport(args)?)?;
            Void
        }
        Op::ResizeFramebuffer => {
            let framebuffer = FramebufferSize {
                width: args.dimension(4, "framebuffer width")?,
                height: args.dimension(5, "framebuffer height")?,
            };
            map.resize_framebuffer(viewport(args)?, framebuffer)?;
            Void
        }

        // Style
        Op::SetAppliedClasses => {
            let classes = marshal::import_list(host, cache, args.object(1)?)?;
            map.set_applied_classes(classes)?;
            Void
        }
        Op::GetAppliedClasses => {
            let classes = map.applied_classes()?;
            Object(marshal::export_list(host, cache, &classes)?)
        }
        Op::SetDefaultTransitionDuration => {
            let millis = args.long(1)?;
            let millis = u64::try_from(millis).map_err(|_| {
                BridgeError::InvalidArgument(format!("transition duration {millis} ms is negative"))
            })?;
            map.set_default_transition_duration(Duration::from_millis(millis))?;
            Void
        }
        Op::GetDefaultTransitionDuration => {
            let duration = map.default_transition_duration()?;
            Long(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
        }
        Op::SetStyleUrl => {
            let url = marshal::import_string(host, args.object(1)?)?;
            map.set_style_url(&url)?;
            Void
        }
        Op::SetStyleJson => {
            let json = marshal::import_string(host, args.object(1)?)?;
            let base = marshal::import_string(host, args.object(2)?)?;
            map.set_style_json(&json, &base)?;
            Void
        }
        Op::GetStyleJson => Object(marshal::export_string(host, &map.style_json()?)?),

        // File source
        Op::SetAccessToken => {
            let token = marshal::import_string(host, args.object(1)?)?;
            map.set_access_token(&token)?;
            Void
        }
        Op::GetAccessToken => Object(marshal::export_string(host, &map.access_token()?)?),
        Op::SetReachability => {
            map.set_reachability(args.boolean(1)?)?;
            Void
        }

        // Camera: position
        Op::CancelTransitions => {
            map.cancel_transitions()?;
            Void
        }
        Op::MoveBy => {
            map.move_by(args.double(1)?, args.double(2)?, args.seconds(3)?)?;
            Void
        }
        Op::SetLonLat => {
            let lon_lat = marshal::import_lon_lat(host, cache, args.object(1)?)?;
            map.set_lon_lat(lon_lat, args.seconds(2)?)?;
            Void
        }
        Op::GetLonLat => Object(marshal::export_lon_lat(host, cache, map.lon_lat()?)?),
        Op::StartPanning => {
            map.start_panning()?;
            Void
        }
        Op::StopPanning => {
            map.stop_panning()?;
            Void
        }
        Op::ResetPosition => {
            map.reset_position()?;
            Void
        }

        // Camera: scale and zoom
        Op::ScaleBy => {
            map.scale_by(args.double(1)?, args.double(2)?, args.double(3)?, args.seconds(4)?)?;
            Void
        }
        Op::SetScale => {
            map.set_scale(args.double(1)?, args.double(2)?, args.double(3)?, args.seconds(4)?)?;
            Void
        }
        Op::GetScale => Double(map.scale()?),
        Op::SetZoom => {
            map.set_zoom(args.double(1)?, args.seconds(2)?)?;
            Void
        }
        Op::GetZoom => Double(map.zoom()?),
        Op::SetLonLatZoom => {
            let lon_lat_zoom = marshal::import_lon_lat_zoom(host, cache, args.object(1)?)?;
            map.set_lon_lat_zoom(lon_lat_zoom, args.seconds(2)?)?;
            Void
        }
        Op::GetLonLatZoom => {
            Object(marshal::export_lon_lat_zoom(host, cache, map.lon_lat_zoom()?)?)
        }
        Op::ResetZoom => {
            map.reset_zoom()?;
            Void
        }
        Op::StartScaling => {
            map.start_scaling()?;
            Void
        }
        Op::StopScaling => {
            map.stop_scaling()?;
            Void
        }
        Op::GetMinZoom => Double(map.min_zoom()?),
        Op::GetMaxZoom => Double(map.max_zoom()?),

        // Camera: bearing
        Op::RotateBy => {
            map.rotate_by(
                args.double(1)?,
                args.double(2)?,
                args.double(3)?,
                args.double(4)?,
                args.seconds(5)?,
            )?;
            Void
        }
        Op::SetBearing => {
            map.set_bearing(args.double(1)?, args.seconds(2)?)?;
            Void
        }
        Op::SetBearingAround => {
            map.set_bearing_around(args.double(1)?, args.double(2)?, args.double(3)?)?;
            Void
        }
        Op::GetBearing => Double(map.bearing()?),
        Op::ResetNorth => {
            map.reset_north()?;
            Void
        }
        Op::StartRotating => {
            map.start_rotating()?;
            Void
        }
        Op::StopRotating => {
            map.stop_rotating()?;
            Void
        }

        // Debug
        Op::SetDebug => {
            let enabled = args.boolean(1)?;
            map.set_debug(enabled)?;
            map.enable_fps(enabled)?;
            Void
        }
        Op::ToggleDebug => {
            map.toggle_debug()?;
            map.enable_fps(map.debug()?)?;
            Void
        }
        Op::GetDebug => Boolean(map.debug()?),
    };
    Ok(value)
}

fn viewport(args: &Args<'_>) -> Result<ViewportSize> {
    Ok(ViewportSize {
        width: args.dimension(1, "width")?,
        height: args.dimension(2, "height")?,
        pixel_ratio: args.float(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_durations_are_invalid() {
        let values = [HostValue::Long(1), HostValue::Double(-0.5)];
        let err = Args(&values).seconds(1).unwrap_err();
        assert!(err.to_string().starts_with("Invalid argument: duration -0.5s"), "{err}");
    }

    #[test]
    fn dimensions_must_fit_u16() {
        let values = [
            HostValue::Long(1),
            HostValue::Int(65_535),
            HostValue::Int(65_536),
            HostValue::Int(-1),
        ];
        let args = Args(&values);
        assert_eq!(args.dimension(1, "width").unwrap(), u16::MAX);
        assert_eq!(
            args.dimension(2, "width").unwrap_err(),
            BridgeError::InvalidArgument("width 65536 is outside 0..=65535".into())
        );
        assert!(args.dimension(3, "height").is_err());
    }

    #[test]
    fn wrong_kind_is_a_dispatch_error() {
        let values = [HostValue::Int(3)];
        assert!(matches!(Args(&values).long(0), Err(BridgeError::Dispatch(_))));
    }
}
