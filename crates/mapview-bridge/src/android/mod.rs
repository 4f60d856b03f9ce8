// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android host via JNI.
//
// `JniHost` implements `HostEnv` on top of the `jni` crate for the duration
// of one native call. The typed `extern "system"` shims below are what the
// runtime actually invokes; each one packs its arguments into `HostValue`s
// and hands them to `dispatch::invoke` with the process-wide bridge.
//
// ## Lifecycle
//
// `JNI_OnLoad` (feature `entry-points`) attaches the bridge with the headless
// engine. Applications linking a real engine disable the feature and call
// [`load`] and [`unload`] from their own entry points with their factory.

#![cfg(target_os = "android")]

use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use jni::objects::{GlobalRef, JClass, JFieldID, JMethodID, JObject, JObjectArray};
use jni::signature::{Primitive, ReturnType};
use jni::sys::{
    self, JNI_ERR, JNI_FALSE, JNI_VERSION_1_6, jboolean, jdouble, jfloat, jint, jlong, jobject,
    jvalue,
};
use jni::{JNIEnv, JavaVM};
use mapview_core::BridgeConfig;
use mapview_core::NativeWindow;
use mapview_core::engine::{EngineFactory, MapObserver};
use tracing::{error, info, warn};

use crate::bridge::{Bridge, BridgeSlot};
use crate::dispatch::{self, Op};
use crate::host::{
    Callbacks, ClassRef, FieldId, HostEnv, HostError, HostRef, HostResult, HostValue, MethodId,
    NativeMethod,
};
use crate::logging;

static BRIDGE: BridgeSlot = BridgeSlot::new();

#[link(name = "android")]
unsafe extern "C" {
    fn ANativeWindow_fromSurface(env: *mut sys::JNIEnv, surface: jobject) -> *mut c_void;
}

// ---------------------------------------------------------------------------
// Reference conversions
// ---------------------------------------------------------------------------

fn to_ref(object: jobject) -> HostRef {
    HostRef::from_raw(object as usize)
}

fn as_jobject(object: HostRef) -> jobject {
    object.into_raw() as jobject
}

/// Borrow a raw reference as a `JObject` without taking ownership of it.
fn object<'local>(object: HostRef) -> JObject<'local> {
    // SAFETY: `HostRef`s handed to the host are references obtained from
    // this runtime (arguments, locals or globals) that are still live.
    unsafe { JObject::from_raw(as_jobject(object)) }
}

fn class<'local>(class: ClassRef) -> JClass<'local> {
    // SAFETY: a `ClassRef` always wraps a live `jclass`.
    unsafe { JClass::from_raw(as_jobject(class.0)) }
}

fn method_id(method: MethodId) -> JMethodID {
    // SAFETY: ids are produced by `get_method_id` and stay valid while the
    // declaring class is loaded, which the metadata cache guarantees.
    unsafe { JMethodID::from_raw(method.into_raw() as sys::jmethodID) }
}

fn field_id(field: FieldId) -> JFieldID {
    // SAFETY: as for `method_id`.
    unsafe { JFieldID::from_raw(field.into_raw() as sys::jfieldID) }
}

fn to_jvalue(value: &HostValue) -> jvalue {
    match *value {
        HostValue::Void => jvalue { j: 0 },
        HostValue::Boolean(b) => jvalue { z: jboolean::from(b) },
        HostValue::Int(i) => jvalue { i },
        HostValue::Long(j) => jvalue { j },
        HostValue::Float(f) => jvalue { f },
        HostValue::Double(d) => jvalue { d },
        HostValue::Object(r) => jvalue { l: as_jobject(r) },
    }
}

fn host_err(err: jni::errors::Error) -> HostError {
    match err {
        jni::errors::Error::JavaException => HostError::ExceptionPending,
        other => HostError::Failed(other.to_string()),
    }
}

fn missing(function: &str) -> HostError {
    HostError::Failed(format!("JNI function table has no {function}"))
}

// ---------------------------------------------------------------------------
// HostEnv over JNI
// ---------------------------------------------------------------------------

/// The current thread's `JNIEnv` seen through [`HostEnv`].
pub struct JniHost<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
}

impl<'a, 'local> JniHost<'a, 'local> {
    pub fn new(env: &'a mut JNIEnv<'local>) -> Self {
        Self { env }
    }

    fn pending_or(&mut self, what: &str) -> HostError {
        if self.exception_pending() {
            HostError::ExceptionPending
        } else {
            HostError::Failed(format!("{what} failed"))
        }
    }

    fn describe_and_clear(&mut self) {
        if self.exception_pending() {
            let _ = self.env.exception_describe();
            let _ = self.env.exception_clear();
        }
    }
}

impl HostEnv for JniHost<'_, '_> {
    fn find_class(&mut self, name: &str) -> HostResult<ClassRef> {
        let class = self.env.find_class(name).map_err(host_err)?;
        Ok(ClassRef(to_ref(class.into_raw())))
    }

    fn method_id(
        &mut self,
        class_ref: ClassRef,
        name: &str,
        signature: &str,
    ) -> HostResult<MethodId> {
        let id = self
            .env
            .get_method_id(&class(class_ref), name, signature)
            .map_err(host_err)?;
        Ok(MethodId::from_raw(id.into_raw() as usize))
    }

    fn field_id(
        &mut self,
        class_ref: ClassRef,
        name: &str,
        signature: &str,
    ) -> HostResult<FieldId> {
        let id = self
            .env
            .get_field_id(&class(class_ref), name, signature)
            .map_err(host_err)?;
        Ok(FieldId::from_raw(id.into_raw() as usize))
    }

    fn pin(&mut self, class: ClassRef) -> HostResult<ClassRef> {
        let env = self.env.get_raw();
        // SAFETY: `env` is this thread's JNIEnv and `class` a live reference.
        let global = unsafe {
            let new_global_ref = (**env).NewGlobalRef.ok_or_else(|| missing("NewGlobalRef"))?;
            new_global_ref(env, as_jobject(class.0))
        };
        if global.is_null() {
            return Err(self.pending_or("NewGlobalRef"));
        }
        Ok(ClassRef(to_ref(global)))
    }

    fn unpin(&mut self, class: ClassRef) {
        let env = self.env.get_raw();
        // SAFETY: `class` came from `pin` and is released exactly once.
        unsafe {
            if let Some(delete_global_ref) = (**env).DeleteGlobalRef {
                delete_global_ref(env, as_jobject(class.0));
            }
        }
    }

    fn register_natives(
        &mut self,
        class_ref: ClassRef,
        methods: &[NativeMethod],
    ) -> HostResult<()> {
        let natives: Vec<jni::NativeMethod> = methods
            .iter()
            .map(|method| jni::NativeMethod {
                name: method.name.into(),
                sig: method.signature.as_str().into(),
                fn_ptr: entry_point(method.op),
            })
            .collect();
        self.env
            .register_native_methods(&class(class_ref), &natives)
            .map_err(host_err)
    }

    fn throw_new(&mut self, class_ref: ClassRef, message: &str) -> HostResult<()> {
        self.env
            .throw_new(&class(class_ref), message)
            .map_err(host_err)
    }

    fn exception_pending(&mut self) -> bool {
        self.env.exception_check().unwrap_or(true)
    }

    fn string_units(&mut self, string: HostRef) -> HostResult<Vec<u16>> {
        let env = self.env.get_raw();
        // SAFETY: `string` is a live, non-null `jstring`; the buffer holds
        // exactly `len` code units.
        let units = unsafe {
            let length = (**env).GetStringLength.ok_or_else(|| missing("GetStringLength"))?;
            let region = (**env).GetStringRegion.ok_or_else(|| missing("GetStringRegion"))?;
            let len = length(env, as_jobject(string));
            let mut units = vec![0u16; usize::try_from(len).unwrap_or(0)];
            region(env, as_jobject(string), 0, len, units.as_mut_ptr());
            units
        };
        if self.exception_pending() {
            return Err(HostError::ExceptionPending);
        }
        Ok(units)
    }

    fn new_string(&mut self, units: &[u16]) -> HostResult<HostRef> {
        let len = sys::jsize::try_from(units.len())
            .map_err(|_| {
                HostError::Failed(format!("string of {} units is too long", units.len()))
            })?;
        let env = self.env.get_raw();
        // SAFETY: `units` is valid for `len` reads for the duration of the call.
        let string = unsafe {
            let new_string = (**env).NewString.ok_or_else(|| missing("NewString"))?;
            new_string(env, units.as_ptr(), len)
        };
        if string.is_null() {
            return Err(self.pending_or("NewString"));
        }
        Ok(to_ref(string))
    }

    fn call_object_method(
        &mut self,
        target: HostRef,
        method: MethodId,
        args: &[HostValue],
    ) -> HostResult<HostRef> {
        let args: Vec<jvalue> = args.iter().map(to_jvalue).collect();
        // SAFETY: the id was resolved with a descriptor returning an object
        // and `args` matches its parameters.
        let result = unsafe {
            self.env
                .call_method_unchecked(
                    &object(target),
                    method_id(method),
                    ReturnType::Object,
                    &args,
                )
        }
        .map_err(host_err)?;
        let value = result.l().map_err(host_err)?;
        Ok(to_ref(value.into_raw()))
    }

    fn call_boolean_method(
        &mut self,
        target: HostRef,
        method: MethodId,
        args: &[HostValue],
    ) -> HostResult<bool> {
        let args: Vec<jvalue> = args.iter().map(to_jvalue).collect();
        // SAFETY: as for `call_object_method`, with a boolean return.
        let result = unsafe {
            self.env.call_method_unchecked(
                &object(target),
                method_id(method),
                ReturnType::Primitive(Primitive::Boolean),
                &args,
            )
        }
        .map_err(host_err)?;
        result.z().map_err(host_err)
    }

    fn new_object(
        &mut self,
        class_ref: ClassRef,
        constructor: MethodId,
        args: &[HostValue],
    ) -> HostResult<HostRef> {
        let args: Vec<jvalue> = args.iter().map(to_jvalue).collect();
        // SAFETY: `constructor` is an `<init>` id of `class_ref` whose
        // parameters match `args`.
        let created = unsafe {
            self.env
                .new_object_unchecked(&class(class_ref), method_id(constructor), &args)
        }
        .map_err(host_err)?;
        Ok(to_ref(created.into_raw()))
    }

    fn double_field(&mut self, target: HostRef, field: FieldId) -> HostResult<f64> {
        // SAFETY: the id names a `double` field of the object's class.
        let value = unsafe {
            self.env.get_field_unchecked(
                &object(target),
                field_id(field),
                ReturnType::Primitive(Primitive::Double),
            )
        }
        .map_err(host_err)?;
        value.d().map_err(host_err)
    }

    fn array_length(&mut self, array: HostRef) -> HostResult<usize> {
        // SAFETY: `array` was returned by `List.toArray()`.
        let array = unsafe { JObjectArray::from_raw(as_jobject(array)) };
        let len = self.env.get_array_length(&array).map_err(host_err)?;
        usize::try_from(len).map_err(|_| HostError::Failed(format!("negative array length {len}")))
    }

    fn array_element(&mut self, array: HostRef, index: usize) -> HostResult<HostRef> {
        let index = sys::jsize::try_from(index)
            .map_err(|_| HostError::Failed(format!("array index {index} out of range")))?;
        // SAFETY: as for `array_length`.
        let array = unsafe { JObjectArray::from_raw(as_jobject(array)) };
        let element = self
            .env
            .get_object_array_element(&array, index)
            .map_err(host_err)?;
        Ok(to_ref(element.into_raw()))
    }

    fn delete_local(&mut self, local: HostRef) {
        if !local.is_null() {
            let _ = self.env.delete_local_ref(object(local));
        }
    }

    fn native_window(&mut self, surface: HostRef) -> HostResult<Option<NativeWindow>> {
        // SAFETY: `surface` is a live `android.view.Surface`; the returned
        // window carries a reference that the engine takes over.
        let window = unsafe { ANativeWindow_fromSurface(self.env.get_raw(), as_jobject(surface)) };
        Ok(NativeWindow::from_raw(window))
    }

    fn observer(
        &mut self,
        wrapper: HostRef,
        callbacks: Callbacks,
    ) -> HostResult<Arc<dyn MapObserver>> {
        let vm = self.env.get_java_vm().map_err(host_err)?;
        let wrapper = self.env.new_global_ref(object(wrapper)).map_err(host_err)?;
        Ok(Arc::new(JniObserver {
            vm,
            wrapper,
            callbacks,
        }))
    }
}

// ---------------------------------------------------------------------------
// Engine callbacks
// ---------------------------------------------------------------------------

/// Delivers engine notifications to the managed wrapper, attaching the
/// calling thread when the render thread is not known to the VM yet.
struct JniObserver {
    vm: JavaVM,
    wrapper: GlobalRef,
    callbacks: Callbacks,
}

impl JniObserver {
    fn notify(&self, name: &str, method: MethodId, args: &[jvalue]) {
        let mut env = match self.vm.attach_current_thread() {
            Ok(env) => env,
            Err(err) => {
                warn!(
                    target: "mapview::jni",
                    callback = name,
                    error = %err,
                    "cannot attach thread"
                );
                return;
            }
        };
        // SAFETY: `method` was resolved on the wrapper class with a void
        // descriptor matching `args`.
        let result = unsafe {
            env.call_method_unchecked(
                self.wrapper.as_obj(),
                method_id(method),
                ReturnType::Primitive(Primitive::Void),
                args,
            )
        };
        if let Err(err) = result {
            warn!(target: "mapview::jni", callback = name, error = %err, "callback failed");
        }
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_describe();
            let _ = env.exception_clear();
        }
    }
}

impl MapObserver for JniObserver {
    fn map_changed(&self) {
        self.notify("onMapChanged", self.callbacks.on_map_changed, &[]);
    }

    fn fps_changed(&self, fps: f64) {
        self.notify("onFpsChanged", self.callbacks.on_fps_changed, &[jvalue { d: fps }]);
    }
}

// ---------------------------------------------------------------------------
// Load and unload
// ---------------------------------------------------------------------------

/// Attach the bridge for `vm` with `factory`. Returns the JNI version to
/// report from `JNI_OnLoad`, or `JNI_ERR`.
pub fn load(vm: &JavaVM, factory: Arc<dyn EngineFactory>) -> jint {
    let (config, config_error) = match BridgeConfig::from_env() {
        Ok(config) => (config, None),
        Err(err) => (BridgeConfig::default(), Some(err)),
    };
    logging::init(&config);
    if let Some(err) = config_error {
        warn!(error = %err, "bridge configuration unreadable; using defaults");
    }
    info!(target: "mapview::jni", "JNI_OnLoad");

    let mut env = match vm.get_env() {
        Ok(env) => env,
        Err(err) => {
            error!(error = %err, "GetEnv failed");
            return JNI_ERR;
        }
    };
    let mut host = JniHost::new(&mut env);
    if let Some(previous) = BRIDGE.take() {
        warn!("bridge was already loaded; detaching the previous instance");
        Bridge::detach_shared(previous, &mut host);
    }
    match Bridge::attach(&mut host, config, factory) {
        Ok(bridge) => {
            BRIDGE.install(bridge);
            JNI_VERSION_1_6
        }
        Err(err) => {
            error!(error = %err, "map view bridge failed to load");
            host.describe_and_clear();
            JNI_ERR
        }
    }
}

/// Destroy remaining maps and release cached metadata.
pub fn unload(vm: &JavaVM) {
    info!(target: "mapview::jni", "JNI_OnUnload");
    let mut env = match vm.get_env() {
        Ok(env) => env,
        Err(err) => {
            error!(error = %err, "GetEnv failed");
            return;
        }
    };
    if let Some(bridge) = BRIDGE.take() {
        Bridge::detach_shared(bridge, &mut JniHost::new(&mut env));
    }
}

#[cfg(feature = "entry-points")]
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn JNI_OnLoad(vm: *mut sys::JavaVM, _reserved: *mut c_void) -> jint {
    // SAFETY: the runtime passes its own, valid JavaVM pointer.
    match unsafe { JavaVM::from_raw(vm) } {
        Ok(vm) => load(&vm, Arc::new(crate::headless::HeadlessFactory::default())),
        Err(_) => JNI_ERR,
    }
}

#[cfg(feature = "entry-points")]
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn JNI_OnUnload(vm: *mut sys::JavaVM, _reserved: *mut c_void) {
    // SAFETY: as for `JNI_OnLoad`.
    if let Ok(vm) = unsafe { JavaVM::from_raw(vm) } {
        unload(&vm);
    }
}

// ---------------------------------------------------------------------------
// Native method shims
// ---------------------------------------------------------------------------

fn route(env: &mut JNIEnv, wrapper: &JObject, op: Op, args: &[HostValue]) -> HostValue {
    let mut host = JniHost::new(env);
    let Some(bridge) = BRIDGE.current() else {
        let _ = host
            .env
            .throw_new("java/lang/IllegalStateException", "map view bridge is not loaded");
        return op.spec().ret.default_value();
    };
    dispatch::invoke(&bridge, &mut host, to_ref(wrapper.as_raw()), op, args)
}

fn obj(object: &JObject) -> HostValue {
    HostValue::Object(to_ref(object.as_raw()))
}

fn flag(value: jboolean) -> HostValue {
    HostValue::Boolean(value != JNI_FALSE)
}

fn ret_bool(value: HostValue) -> jboolean {
    value.as_bool().map_or(JNI_FALSE, jboolean::from)
}

fn ret_object(value: HostValue) -> jobject {
    value.as_object().map_or(ptr::null_mut(), as_jobject)
}

macro_rules! handle_ops {
    ($($shim:ident => $op:ident),* $(,)?) => {
        $(
            extern "system" fn $shim(mut env: JNIEnv, wrapper: JObject, handle: jlong) {
                route(&mut env, &wrapper, Op::$op, &[HostValue::Long(handle)]);
            }
        )*
    };
}

macro_rules! double_getters {
    ($($shim:ident => $op:ident),* $(,)?) => {
        $(
            extern "system" fn $shim(mut env: JNIEnv, wrapper: JObject, handle: jlong) -> jdouble {
                route(&mut env, &wrapper, Op::$op, &[HostValue::Long(handle)])
                    .as_double()
                    .unwrap_or(0.0)
            }
        )*
    };
}

handle_ops! {
    native_destroy => Destroy,
    native_initialize_display => InitializeDisplay,
    native_terminate_display => TerminateDisplay,
    native_initialize_context => InitializeContext,
    native_terminate_context => TerminateContext,
    native_destroy_surface => DestroySurface,
    native_start => Start,
    native_stop => Stop,
    native_pause => Pause,
    native_resume => Resume,
    native_run => Run,
    native_rerender => Rerender,
    native_update => Update,
    native_terminate => Terminate,
    native_swapped => Swapped,
    native_cancel_transitions => CancelTransitions,
    native_start_panning => StartPanning,
    native_stop_panning => StopPanning,
    native_reset_position => ResetPosition,
    native_reset_zoom => ResetZoom,
    native_start_scaling => StartScaling,
    native_stop_scaling => StopScaling,
    native_reset_north => ResetNorth,
    native_start_rotating => StartRotating,
    native_stop_rotating => StopRotating,
    native_toggle_debug => ToggleDebug,
}

double_getters! {
    native_get_scale => GetScale,
    native_get_zoom => GetZoom,
    native_get_min_zoom => GetMinZoom,
    native_get_max_zoom => GetMaxZoom,
    native_get_bearing => GetBearing,
}

extern "system" fn native_create(
    mut env: JNIEnv,
    wrapper: JObject,
    cache_path: JObject,
    data_path: JObject,
    apk_path: JObject,
) -> jlong {
    let args = [obj(&cache_path), obj(&data_path), obj(&apk_path)];
    route(&mut env, &wrapper, Op::Create, &args)
        .as_long()
        .unwrap_or(0)
}

extern "system" fn native_create_surface(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    surface: JObject,
) {
    route(&mut env, &wrapper, Op::CreateSurface, &[HostValue::Long(handle), obj(&surface)]);
}

extern "system" fn native_needs_swap(mut env: JNIEnv, wrapper: JObject, handle: jlong) -> jboolean {
    ret_bool(route(&mut env, &wrapper, Op::NeedsSwap, &[HostValue::Long(handle)]))
}

extern "system" fn native_resize(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    width: jint,
    height: jint,
    ratio: jfloat,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Int(width),
        HostValue::Int(height),
        HostValue::Float(ratio),
    ];
    route(&mut env, &wrapper, Op::Resize, &args);
}

#[allow(clippy::too_many_arguments)]
extern "system" fn native_resize_framebuffer(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    width: jint,
    height: jint,
    ratio: jfloat,
    fb_width: jint,
    fb_height: jint,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Int(width),
        HostValue::Int(height),
        HostValue::Float(ratio),
        HostValue::Int(fb_width),
        HostValue::Int(fb_height),
    ];
    route(&mut env, &wrapper, Op::ResizeFramebuffer, &args);
}

extern "system" fn native_set_applied_classes(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    classes: JObject,
) {
    route(&mut env, &wrapper, Op::SetAppliedClasses, &[HostValue::Long(handle), obj(&classes)]);
}

extern "system" fn native_get_applied_classes(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
) -> jobject {
    ret_object(route(&mut env, &wrapper, Op::GetAppliedClasses, &[HostValue::Long(handle)]))
}

extern "system" fn native_set_default_transition_duration(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    milliseconds: jlong,
) {
    let args = [HostValue::Long(handle), HostValue::Long(milliseconds)];
    route(&mut env, &wrapper, Op::SetDefaultTransitionDuration, &args);
}

extern "system" fn native_get_default_transition_duration(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
) -> jlong {
    route(&mut env, &wrapper, Op::GetDefaultTransitionDuration, &[HostValue::Long(handle)])
        .as_long()
        .unwrap_or(0)
}

extern "system" fn native_set_style_url(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    url: JObject,
) {
    route(&mut env, &wrapper, Op::SetStyleUrl, &[HostValue::Long(handle), obj(&url)]);
}

extern "system" fn native_set_style_json(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    json: JObject,
    base: JObject,
) {
    let args = [HostValue::Long(handle), obj(&json), obj(&base)];
    route(&mut env, &wrapper, Op::SetStyleJson, &args);
}

extern "system" fn native_get_style_json(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
) -> jobject {
    ret_object(route(&mut env, &wrapper, Op::GetStyleJson, &[HostValue::Long(handle)]))
}

extern "system" fn native_set_access_token(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    token: JObject,
) {
    route(&mut env, &wrapper, Op::SetAccessToken, &[HostValue::Long(handle), obj(&token)]);
}

extern "system" fn native_get_access_token(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
) -> jobject {
    ret_object(route(&mut env, &wrapper, Op::GetAccessToken, &[HostValue::Long(handle)]))
}

extern "system" fn native_move_by(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    dx: jdouble,
    dy: jdouble,
    duration: jdouble,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Double(dx),
        HostValue::Double(dy),
        HostValue::Double(duration),
    ];
    route(&mut env, &wrapper, Op::MoveBy, &args);
}

extern "system" fn native_set_lon_lat(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    lon_lat: JObject,
    duration: jdouble,
) {
    let args = [HostValue::Long(handle), obj(&lon_lat), HostValue::Double(duration)];
    route(&mut env, &wrapper, Op::SetLonLat, &args);
}

extern "system" fn native_get_lon_lat(mut env: JNIEnv, wrapper: JObject, handle: jlong) -> jobject {
    ret_object(route(&mut env, &wrapper, Op::GetLonLat, &[HostValue::Long(handle)]))
}

extern "system" fn native_scale_by(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    ds: jdouble,
    cx: jdouble,
    cy: jdouble,
    duration: jdouble,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Double(ds),
        HostValue::Double(cx),
        HostValue::Double(cy),
        HostValue::Double(duration),
    ];
    route(&mut env, &wrapper, Op::ScaleBy, &args);
}

extern "system" fn native_set_scale(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    scale: jdouble,
    cx: jdouble,
    cy: jdouble,
    duration: jdouble,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Double(scale),
        HostValue::Double(cx),
        HostValue::Double(cy),
        HostValue::Double(duration),
    ];
    route(&mut env, &wrapper, Op::SetScale, &args);
}

extern "system" fn native_set_zoom(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    zoom: jdouble,
    duration: jdouble,
) {
    let args = [HostValue::Long(handle), HostValue::Double(zoom), HostValue::Double(duration)];
    route(&mut env, &wrapper, Op::SetZoom, &args);
}

extern "system" fn native_set_lon_lat_zoom(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    lon_lat_zoom: JObject,
    duration: jdouble,
) {
    let args = [HostValue::Long(handle), obj(&lon_lat_zoom), HostValue::Double(duration)];
    route(&mut env, &wrapper, Op::SetLonLatZoom, &args);
}

extern "system" fn native_get_lon_lat_zoom(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
) -> jobject {
    ret_object(route(&mut env, &wrapper, Op::GetLonLatZoom, &[HostValue::Long(handle)]))
}

#[allow(clippy::too_many_arguments)]
extern "system" fn native_rotate_by(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    sx: jdouble,
    sy: jdouble,
    ex: jdouble,
    ey: jdouble,
    duration: jdouble,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Double(sx),
        HostValue::Double(sy),
        HostValue::Double(ex),
        HostValue::Double(ey),
        HostValue::Double(duration),
    ];
    route(&mut env, &wrapper, Op::RotateBy, &args);
}

extern "system" fn native_set_bearing(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    degrees: jdouble,
    duration: jdouble,
) {
    let args = [HostValue::Long(handle), HostValue::Double(degrees), HostValue::Double(duration)];
    route(&mut env, &wrapper, Op::SetBearing, &args);
}

extern "system" fn native_set_bearing_around(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    degrees: jdouble,
    cx: jdouble,
    cy: jdouble,
) {
    let args = [
        HostValue::Long(handle),
        HostValue::Double(degrees),
        HostValue::Double(cx),
        HostValue::Double(cy),
    ];
    route(&mut env, &wrapper, Op::SetBearingAround, &args);
}

extern "system" fn native_set_debug(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    debug: jboolean,
) {
    route(&mut env, &wrapper, Op::SetDebug, &[HostValue::Long(handle), flag(debug)]);
}

extern "system" fn native_get_debug(mut env: JNIEnv, wrapper: JObject, handle: jlong) -> jboolean {
    ret_bool(route(&mut env, &wrapper, Op::GetDebug, &[HostValue::Long(handle)]))
}

extern "system" fn native_set_reachability(
    mut env: JNIEnv,
    wrapper: JObject,
    handle: jlong,
    reachable: jboolean,
) {
    route(&mut env, &wrapper, Op::SetReachability, &[HostValue::Long(handle), flag(reachable)]);
}

/// Function pointer registered for `op`.
fn entry_point(op: Op) -> *mut c_void {
    match op {
        Op::Create => native_create as *mut c_void,
        Op::Destroy => native_destroy as *mut c_void,
        Op::InitializeDisplay => native_initialize_display as *mut c_void,
        Op::TerminateDisplay => native_terminate_display as *mut c_void,
        Op::InitializeContext => native_initialize_context as *mut c_void,
        Op::TerminateContext => native_terminate_context as *mut c_void,
        Op::CreateSurface => native_create_surface as *mut c_void,
        Op::DestroySurface => native_destroy_surface as *mut c_void,
        Op::Start => native_start as *mut c_void,
        Op::Stop => native_stop as *mut c_void,
        Op::Pause => native_pause as *mut c_void,
        Op::Resume => native_resume as *mut c_void,
        Op::Run => native_run as *mut c_void,
        Op::Rerender => native_rerender as *mut c_void,
        Op::Update => native_update as *mut c_void,
        Op::Terminate => native_terminate as *mut c_void,
        Op::NeedsSwap => native_needs_swap as *mut c_void,
        Op::Swapped => native_swapped as *mut c_void,
        Op::Resize => native_resize as *mut c_void,
        Op::ResizeFramebuffer => native_resize_framebuffer as *mut c_void,
        Op::SetAppliedClasses => native_set_applied_classes as *mut c_void,
        Op::GetAppliedClasses => native_get_applied_classes as *mut c_void,
        Op::SetDefaultTransitionDuration => native_set_default_transition_duration as *mut c_void,
        Op::GetDefaultTransitionDuration => native_get_default_transition_duration as *mut c_void,
        Op::SetStyleUrl => native_set_style_url as *mut c_void,
        Op::SetStyleJson => native_set_style_json as *mut c_void,
        Op::GetStyleJson => native_get_style_json as *mut c_void,
        Op::SetAccessToken => native_set_access_token as *mut c_void,
        Op::GetAccessToken => native_get_access_token as *mut c_void,
        Op::CancelTransitions => native_cancel_transitions as *mut c_void,
        Op::MoveBy => native_move_by as *mut c_void,
        Op::SetLonLat => native_set_lon_lat as *mut c_void,
        Op::GetLonLat => native_get_lon_lat as *mut c_void,
        Op::StartPanning => native_start_panning as *mut c_void,
        Op::StopPanning => native_stop_panning as *mut c_void,
        Op::ResetPosition => native_reset_position as *mut c_void,
        Op::ScaleBy => native_scale_by as *mut c_void,
        Op::SetScale => native_set_scale as *mut c_void,
        Op::GetScale => native_get_scale as *mut c_void,
        Op::SetZoom => native_set_zoom as *mut c_void,
        Op::GetZoom => native_get_zoom as *mut c_void,
        Op::SetLonLatZoom => native_set_lon_lat_zoom as *mut c_void,
        Op::GetLonLatZoom => native_get_lon_lat_zoom as *mut c_void,
        Op::ResetZoom => native_reset_zoom as *mut c_void,
        Op::StartScaling => native_start_scaling as *mut c_void,
        Op::StopScaling => native_stop_scaling as *mut c_void,
        Op::GetMinZoom => native_get_min_zoom as *mut c_void,
        Op::GetMaxZoom => native_get_max_zoom as *mut c_void,
        Op::RotateBy => native_rotate_by as *mut c_void,
        Op::SetBearing => native_set_bearing as *mut c_void,
        Op::SetBearingAround => native_set_bearing_around as *mut c_void,
        Op::GetBearing => native_get_bearing as *mut c_void,
        Op::ResetNorth => native_reset_north as *mut c_void,
        Op::StartRotating => native_start_rotating as *mut c_void,
        Op::StopRotating => native_stop_rotating as *mut c_void,
        Op::SetDebug => native_set_debug as *mut c_void,
        Op::ToggleDebug => native_toggle_debug as *mut c_void,
        Op::GetDebug => native_get_debug as *mut c_void,
        Op::SetReachability => native_set_reachability as *mut c_void,
    }
}
