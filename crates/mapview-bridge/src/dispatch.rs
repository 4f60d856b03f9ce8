// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native method table and call router.
//
// `METHODS` lists every wrapper method the library binds, in `Op` order.
// Registration renders each entry's descriptor from its typed parameters, and
// `invoke` checks incoming arguments against the same parameters, so the two
// always agree.

use std::collections::HashSet;

use mapview_core::config::ClassNames;
use tracing::{debug, info};

use crate::boundary;
use crate::bridge::Bridge;
use crate::error::{BridgeError, Result};
use crate::handles::assert_handle;
use crate::host::{ClassRef, HostEnv, HostRef, HostValue, NativeMethod};
use crate::ops;
use crate::signature::{TypeSig as T, method_descriptor};

/// Every operation reachable from the managed wrapper. Overloads of one Java
/// name are separate variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Destroy,
    InitializeDisplay,
    TerminateDisplay,
    InitializeContext,
    TerminateContext,
    CreateSurface,
    DestroySurface,
    Start,
    Stop,
    Pause,
    Resume,
    Run,
    Rerender,
    Update,
    Terminate,
    NeedsSwap,
    Swapped,
    Resize,
    ResizeFramebuffer,
    SetAppliedClasses,
    GetAppliedClasses,
    SetDefaultTransitionDuration,
    GetDefaultTransitionDuration,
    SetStyleUrl,
    SetStyleJson,
    GetStyleJson,
    SetAccessToken,
    GetAccessToken,
    CancelTransitions,
    MoveBy,
    SetLonLat,
    GetLonLat,
    StartPanning,
    StopPanning,
    ResetPosition,
    ScaleBy,
    SetScale,
    GetScale,
    SetZoom,
    GetZoom,
    SetLonLatZoom,
    GetLonLatZoom,
    ResetZoom,
    StartScaling,
    StopScaling,
    GetMinZoom,
    GetMaxZoom,
    RotateBy,
    SetBearing,
    SetBearingAround,
    GetBearing,
    ResetNorth,
    StartRotating,
    StopRotating,
    SetDebug,
    ToggleDebug,
    GetDebug,
    SetReachability,
}

impl Op {
    pub fn spec(self) -> &'static MethodSpec {
        &METHODS[self as usize]
    }
}

/// One registered native method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Java method name.
    pub name: &'static str,
    pub op: Op,
    pub params: &'static [T],
    pub ret: T,
}

impl MethodSpec {
    pub fn descriptor(&self, classes: &ClassNames) -> String {
        method_descriptor(self.params, self.ret, classes)
    }

    fn check_args(&self, args: &[HostValue]) -> Result<()> {
        let matches = args.len() == self.params.len()
            && self.params.iter().zip(args).all(|(param, arg)| param.accepts(arg));
        if matches {
            Ok(())
        } else {
            Err(BridgeError::Dispatch(format!(
                "{} expects {:?}, received {:?}",
                self.name, self.params, args
            )))
        }
    }
}

const fn m(name: &'static str, op: Op, params: &'static [T], ret: T) -> MethodSpec {
    MethodSpec {
        name,
        op,
        params,
        ret,
    }
}

const HANDLE: &[T] = &[T::Long];

pub const METHOD_COUNT: usize = 59;

#[rustfmt::skip]
pub const METHODS: [MethodSpec; METHOD_COUNT] = [
    m("nativeCreate", Op::Create, &[T::String, T::String, T::String], T::Long),
    m("nativeDestroy", Op::Destroy, HANDLE, T::Void),
    m("nativeInitializeDisplay", Op::InitializeDisplay, HANDLE, T::Void),
    m("nativeTerminateDisplay", Op::TerminateDisplay, HANDLE, T::Void),
    m("nativeInitializeContext", Op::InitializeContext, HANDLE, T::Void),
    m("nativeTerminateContext", Op::TerminateContext, HANDLE, T::Void),
    m("nativeCreateSurface", Op::CreateSurface, &[T::Long, T::Surface], T::Void),
    m("nativeDestroySurface", Op::DestroySurface, HANDLE, T::Void),
    m("nativeStart", Op::Start, HANDLE, T::Void),
    m("nativeStop", Op::Stop, HANDLE, T::Void),
    m("nativePause", Op::Pause, HANDLE, T::Void),
    m("nativeResume", Op::Resume, HANDLE, T::Void),
    m("nativeRun", Op::Run, HANDLE, T::Void),
    m("nativeRerender", Op::Rerender, HANDLE, T::Void),
    m("nativeUpdate", Op::Update, HANDLE, T::Void),
    m("nativeTerminate", Op::Terminate, HANDLE, T::Void),
    m("nativeNeedsSwap", Op::NeedsSwap, HANDLE, T::Boolean),
    m("nativeSwapped", Op::Swapped, HANDLE, T::Void),
    m("nativeResize", Op::Resize, &[T::Long, T::Int, T::Int, T::Float], T::Void),
    m("nativeResize", Op::ResizeFramebuffer, &[T::Long, T::Int, T::Int, T::Float, T::Int, T::Int], T::Void),
    m("nativeSetAppliedClasses", Op::SetAppliedClasses, &[T::Long, T::List], T::Void),
    m("nativeGetAppliedClasses", Op::GetAppliedClasses, HANDLE, T::List),
    m("nativeSetDefaultTransitionDuration", Op::SetDefaultTransitionDuration, &[T::Long, T::Long], T::Void),
    m("nativeGetDefaultTransitionDuration", Op::GetDefaultTransitionDuration, HANDLE, T::Long),
    m("nativeSetStyleUrl", Op::SetStyleUrl, &[T::Long, T::String], T::Void),
    m("nativeSetStyleJson", Op::SetStyleJson, &[T::Long, T::String, T::String], T::Void),
    m("nativeGetStyleJson", Op::GetStyleJson, HANDLE, T::String),
    m("nativeSetAccessToken", Op::SetAccessToken, &[T::Long, T::String], T::Void),
    m("nativeGetAccessToken", Op::GetAccessToken, HANDLE, T::String),
    m("nativeCancelTransitions", Op::CancelTransitions, HANDLE, T::Void),
    m("nativeMoveBy", Op::MoveBy, &[T::Long, T::Double, T::Double, T::Double], T::Void),
    m("nativeSetLonLat", Op::SetLonLat, &[T::Long, T::LonLat, T::Double], T::Void),
    m("nativeGetLonLat", Op::GetLonLat, HANDLE, T::LonLat),
    m("nativeStartPanning", Op::StartPanning, HANDLE, T::Void),
    m("nativeStopPanning", Op::StopPanning, HANDLE, T::Void),
    m("nativeResetPosition", Op::ResetPosition, HANDLE, T::Void),
    m("nativeScaleBy", Op::ScaleBy, &[T::Long, T::Double, T::Double, T::Double, T::Double], T::Void),
    m("nativeSetScale", Op::SetScale, &[T::Long, T::Double, T::Double, T::Double, T::Double], T::Void),
    m("nativeGetScale", Op::GetScale, HANDLE, T::Double),
    m("nativeSetZoom", Op::SetZoom, &[T::Long, T::Double, T::Double], T::Void),
    m("nativeGetZoom", Op::GetZoom, HANDLE, T::Double),
    m("nativeSetLonLatZoom", Op::SetLonLatZoom, &[T::Long, T::LonLatZoom, T::Double], T::Void),
    m("nativeGetLonLatZoom", Op::GetLonLatZoom, HANDLE, T::LonLatZoom),
    m("nativeResetZoom", Op::ResetZoom, HANDLE, T::Void),
    m("nativeStartScaling", Op::StartScaling, HANDLE, T::Void),
    m("nativeStopScaling", Op::StopScaling, HANDLE, T::Void),
    m("nativeGetMinZoom", Op::GetMinZoom, HANDLE, T::Double),
    m("nativeGetMaxZoom", Op::GetMaxZoom, HANDLE, T::Double),
    m("nativeRotateBy", Op::RotateBy, &[T::Long, T::Double, T::Double, T::Double, T::Double, T::Double], T::Void),
    m("nativeSetBearing", Op::SetBearing, &[T::Long, T::Double, T::Double], T::Void),
    m("nativeSetBearing", Op::SetBearingAround, &[T::Long, T::Double, T::Double, T::Double], T::Void),
    m("nativeGetBearing", Op::GetBearing, HANDLE, T::Double),
    m("nativeResetNorth", Op::ResetNorth, HANDLE, T::Void),
    m("nativeStartRotating", Op::StartRotating, HANDLE, T::Void),
    m("nativeStopRotating", Op::StopRotating, HANDLE, T::Void),
    m("nativeSetDebug", Op::SetDebug, &[T::Long, T::Boolean], T::Void),
    m("nativeToggleDebug", Op::ToggleDebug, HANDLE, T::Void),
    m("nativeGetDebug", Op::GetDebug, HANDLE, T::Boolean),
    m("nativeSetReachability", Op::SetReachability, &[T::Long, T::Boolean], T::Void),
];

// `Op::spec` indexes `METHODS` by discriminant.
const _: () = {
    let mut i = 0;
    while i < METHOD_COUNT {
        assert!(METHODS[i].op as usize == i, "METHODS is not in Op order");
        i += 1;
    }
};

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Render `specs` into registration entries, rejecting duplicate
/// name/descriptor pairs.
pub fn native_methods(specs: &[MethodSpec], classes: &ClassNames) -> Result<Vec<NativeMethod>> {
    let mut seen = HashSet::with_capacity(specs.len());
    specs
        .iter()
        .map(|spec| {
            let signature = spec.descriptor(classes);
            if !seen.insert((spec.name, signature.clone())) {
                return Err(BridgeError::Dispatch(format!(
                    "duplicate native method {}{}",
                    spec.name, signature
                )));
            }
            Ok(NativeMethod {
                name: spec.name,
                signature,
                op: spec.op,
            })
        })
        .collect()
}

/// Bind every entry of [`METHODS`] on the wrapper class.
pub fn register<H: HostEnv + ?Sized>(
    host: &mut H,
    wrapper: ClassRef,
    classes: &ClassNames,
) -> Result<usize> {
    let methods = native_methods(&METHODS, classes)?;
    host.register_natives(wrapper, &methods)
        .map_err(|e| {
            BridgeError::Dispatch(format!("RegisterNatives on {} failed: {e}", classes.map_view))
        })?;
    info!(count = methods.len(), class = %classes.map_view, "native methods registered");
    Ok(methods.len())
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Execute `op` on behalf of `wrapper` and return its result.
///
/// Every operation but `Create` takes the map handle first; a zero handle
/// panics here, outside the exception boundary.
pub fn invoke<H: HostEnv + ?Sized>(
    bridge: &Bridge,
    host: &mut H,
    wrapper: HostRef,
    op: Op,
    args: &[HostValue],
) -> HostValue {
    let spec = op.spec();
    debug!(target: "mapview::jni", op = spec.name);
    if let (false, Some(HostValue::Long(raw))) = (op == Op::Create, args.first()) {
        assert_handle(*raw, spec.name);
    }
    boundary::guard(bridge.cache(), host, spec.name, spec.ret.default_value(), |host| {
        spec.check_args(args)?;
        ops::execute(bridge, host, wrapper, op, args)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_complete_and_unique() {
        let methods = native_methods(&METHODS, &ClassNames::default()).unwrap();
        assert_eq!(methods.len(), METHOD_COUNT);
        let ops: HashSet<Op> = METHODS.iter().map(|spec| spec.op).collect();
        assert_eq!(ops.len(), METHOD_COUNT);
    }

    #[test]
    fn overloads_get_distinct_descriptors() {
        let classes = ClassNames::default();
        assert_eq!(Op::Resize.spec().descriptor(&classes), "(JIIF)V");
        assert_eq!(Op::ResizeFramebuffer.spec().descriptor(&classes), "(JIIFII)V");
        assert_eq!(Op::SetBearing.spec().descriptor(&classes), "(JDD)V");
        assert_eq!(Op::SetBearingAround.spec().descriptor(&classes), "(JDDD)V");
    }

    #[test]
    fn descriptors_match_the_wrapper_class() {
        let classes = ClassNames::default();
        let rendered = |op: Op| op.spec().descriptor(&classes);
        assert_eq!(
            rendered(Op::Create),
            "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)J"
        );
        assert_eq!(rendered(Op::CreateSurface), "(JLandroid/view/Surface;)V");
        assert_eq!(
            rendered(Op::SetLonLat),
            "(JLcom/mapbox/mapboxgl/lib/LonLat;D)V"
        );
        assert_eq!(rendered(Op::GetAppliedClasses), "(J)Ljava/util/List;");
        assert_eq!(rendered(Op::RotateBy), "(JDDDDD)V");
        assert_eq!(rendered(Op::SetDefaultTransitionDuration), "(JJ)V");
    }

    #[test]
    fn scaling_gestures_use_their_own_names() {
        assert_eq!(Op::StartScaling.spec().name, "nativeStartScaling");
        assert_eq!(Op::StopScaling.spec().name, "nativeStopScaling");
    }

    #[test]
    fn duplicates_are_rejected() {
        let specs = [METHODS[8], METHODS[8]];
        let err = native_methods(&specs, &ClassNames::default()).unwrap_err();
        assert_eq!(
            err,
            BridgeError::Dispatch("duplicate native method nativeStart(J)V".into())
        );
    }

    #[test]
    fn argument_kinds_are_checked() {
        let spec = Op::SetZoom.spec();
        let doubles = [HostValue::Long(1), HostValue::Double(2.0), HostValue::Double(0.0)];
        let float = [HostValue::Long(1), HostValue::Float(2.0), HostValue::Double(0.0)];
        assert!(spec.check_args(&doubles).is_ok());
        assert!(spec.check_args(&float).is_err());
        assert!(spec.check_args(&[HostValue::Long(1)]).is_err());
    }
}
