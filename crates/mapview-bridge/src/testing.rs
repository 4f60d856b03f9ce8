// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory managed runtime.
//
// `TestHost` models the parts of a JVM the bridge touches: a class table, a
// heap of strings, lists and value objects, local and global references, a
// single pending-exception slot and the registered native table. Calls made
// while an exception is pending are counted so tests can check that the
// bridge stops talking to the host once something went wrong.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use mapview_core::config::ClassNames;
use mapview_core::engine::MapObserver;
use mapview_core::{LonLat, LonLatZoom, NativeWindow};

use crate::bridge::Bridge;
use crate::dispatch::{self, Op};
use crate::host::{
    Callbacks, ClassRef, FieldId, HostEnv, HostError, HostRef, HostResult, HostValue, MethodId,
    NativeMethod,
};

const OUT_OF_MEMORY: &str = "java/lang/OutOfMemoryError";
const ARRAY_LIST: &str = "java/util/ArrayList";

/// An exception raised in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown {
    pub class: String,
    pub message: String,
}

/// Observer handed to engines created through the test host.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    map_changes: AtomicUsize,
    fps: Mutex<Vec<f64>>,
}

impl RecordingObserver {
    pub fn map_changes(&self) -> usize {
        self.map_changes.load(Ordering::SeqCst)
    }

    pub fn fps(&self) -> Vec<f64> {
        self.fps.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl MapObserver for RecordingObserver {
    fn map_changed(&self) {
        self.map_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn fps_changed(&self, fps: f64) {
        self.fps.lock().unwrap_or_else(PoisonError::into_inner).push(fps);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Object {
    Class(String),
    String(Vec<u16>),
    List(Vec<Option<usize>>),
    Array(Vec<Option<usize>>),
    Value { class: String, fields: Vec<f64> },
    Surface(usize),
    Wrapper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Owned by the test, like an argument passed in from managed code.
    Argument,
    Local,
    Global,
}

#[derive(Debug, Clone, Copy)]
struct Ref {
    object: usize,
    kind: Kind,
}

#[derive(Debug, Clone, Default)]
struct ClassDef {
    methods: Vec<(String, String)>,
    fields: Vec<String>,
}

#[derive(Debug, Clone)]
struct Member {
    class: String,
    name: String,
}

/// A scriptable stand-in for the JVM.
pub struct TestHost {
    classes: HashMap<String, ClassDef>,
    value_classes: Vec<String>,
    members: Vec<Member>,
    objects: Vec<Object>,
    refs: HashMap<usize, Ref>,
    next_ref: usize,
    pending: Option<Thrown>,
    thrown: Vec<Thrown>,
    calls_while_pending: usize,
    natives: Vec<NativeMethod>,
    observers: Vec<Arc<RecordingObserver>>,
    wrapper: HostRef,
    next_window: usize,
    fail_allocations: bool,
    fail_registration: bool,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    /// A host defining the default wrapper and value classes.
    pub fn new() -> Self {
        Self::with_classes(&ClassNames::default())
    }

    pub fn with_classes(names: &ClassNames) -> Self {
        let mut classes = HashMap::new();
        let class = |methods: &[(&str, &str)], fields: &[&str]| ClassDef {
            methods: methods
                .iter()
                .map(|(name, sig)| ((*name).to_owned(), (*sig).to_owned()))
                .collect(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        };
        classes.insert(names.lon_lat.clone(), class(&[("<init>", "(DD)V")], &["lon", "lat"]));
        classes.insert(
            names.lon_lat_zoom.clone(),
            class(&[("<init>", "(DDD)V")], &["lon", "lat", "zoom"]),
        );
        classes.insert(
            names.map_view.clone(),
            class(&[("onMapChanged", "()V"), ("onFpsChanged", "(D)V")], &[]),
        );
        for name in [
            "java/lang/RuntimeException",
            "java/lang/NullPointerException",
            "java/lang/IllegalStateException",
            OUT_OF_MEMORY,
        ] {
            classes.insert(name.to_owned(), ClassDef::default());
        }
        classes.insert(
            "java/util/List".to_owned(),
            class(&[("toArray", "()[Ljava/lang/Object;")], &[]),
        );
        classes.insert(
            ARRAY_LIST.to_owned(),
            class(
                &[
                    ("<init>", "()V"),
                    ("add", "(Ljava/lang/Object;)Z"),
                    ("toArray", "()[Ljava/lang/Object;"),
                ],
                &[],
            ),
        );

        let mut host = Self {
            classes,
            value_classes: vec![names.lon_lat.clone(), names.lon_lat_zoom.clone()],
            members: Vec::new(),
            objects: Vec::new(),
            refs: HashMap::new(),
            next_ref: 0x1000,
            pending: None,
            thrown: Vec::new(),
            calls_while_pending: 0,
            natives: Vec::new(),
            observers: Vec::new(),
            wrapper: HostRef::NULL,
            next_window: 0x7000,
            fail_allocations: false,
            fail_registration: false,
        };
        host.wrapper = host.argument(Object::Wrapper);
        host
    }

    // -- Scripting --

    pub fn remove_class(&mut self, name: &str) {
        self.classes.remove(name);
    }

    pub fn remove_member(&mut self, class: &str, name: &str) {
        if let Some(def) = self.classes.get_mut(class) {
            def.methods.retain(|(method, _)| method != name);
            def.fields.retain(|field| field != name);
        }
    }

    /// Make every allocation throw `OutOfMemoryError`.
    pub fn fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    pub fn fail_registration(&mut self, fail: bool) {
        self.fail_registration = fail;
    }

    // -- Argument construction --

    /// The wrapper object operations are invoked on.
    pub fn wrapper(&self) -> HostRef {
        self.wrapper
    }

    pub fn string(&mut self, value: &str) -> HostRef {
        self.utf16_string(value.encode_utf16().collect())
    }

    /// A string from raw code units, which need not be valid UTF-16.
    pub fn utf16_string(&mut self, units: Vec<u16>) -> HostRef {
        self.argument(Object::String(units))
    }

    pub fn list(&mut self, values: &[&str]) -> HostRef {
        let elements: Vec<HostRef> = values.iter().map(|value| self.string(value)).collect();
        self.list_of(elements)
    }

    /// A list of arbitrary references; `HostRef::NULL` becomes a null element.
    pub fn list_of(&mut self, elements: Vec<HostRef>) -> HostRef {
        let elements = elements.into_iter().map(|element| self.object_id(element)).collect();
        self.argument(Object::List(elements))
    }

    pub fn lon_lat(&mut self, lon: f64, lat: f64) -> HostRef {
        let class = self.value_classes[0].clone();
        self.argument(Object::Value {
            class,
            fields: vec![lon, lat],
        })
    }

    pub fn lon_lat_zoom(&mut self, lon: f64, lat: f64, zoom: f64) -> HostRef {
        let class = self.value_classes[1].clone();
        self.argument(Object::Value {
            class,
            fields: vec![lon, lat, zoom],
        })
    }

    /// A `Surface` backed by a fresh window.
    pub fn surface(&mut self) -> HostRef {
        self.next_window += 0x100;
        let window = self.next_window;
        self.argument(Object::Surface(window))
    }

    /// A `Surface` whose window has already been released.
    pub fn released_surface(&mut self) -> HostRef {
        self.argument(Object::Surface(0))
    }

    // -- Inspection --

    pub fn read_string(&self, string: HostRef) -> Option<String> {
        match self.deref(string)? {
            Object::String(units) => String::from_utf16(units).ok(),
            _ => None,
        }
    }

    pub fn read_list(&self, list: HostRef) -> Option<Vec<String>> {
        match self.deref(list)? {
            Object::List(elements) => elements
                .iter()
                .map(|element| match self.objects.get((*element)?)? {
                    Object::String(units) => String::from_utf16(units).ok(),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    pub fn read_lon_lat(&self, object: HostRef) -> Option<LonLat> {
        match self.deref(object)? {
            Object::Value { fields, .. } if fields.len() == 2 => {
                Some(LonLat::new(fields[0], fields[1]))
            }
            _ => None,
        }
    }

    pub fn read_lon_lat_zoom(&self, object: HostRef) -> Option<LonLatZoom> {
        match self.deref(object)? {
            Object::Value { fields, .. } if fields.len() == 3 => {
                Some(LonLatZoom::new(fields[0], fields[1], fields[2]))
            }
            _ => None,
        }
    }

    /// Clear and return the pending exception, as managed code catching it
    /// would.
    pub fn take_exception(&mut self) -> Option<Thrown> {
        self.pending.take()
    }

    /// Every exception raised so far, oldest first.
    pub fn thrown(&self) -> &[Thrown] {
        &self.thrown
    }

    /// Host calls made while an exception was pending.
    pub fn calls_while_pending(&self) -> usize {
        self.calls_while_pending
    }

    pub fn live_globals(&self) -> usize {
        self.count(Kind::Global)
    }

    pub fn live_locals(&self) -> usize {
        self.count(Kind::Local)
    }

    pub fn natives(&self) -> &[NativeMethod] {
        &self.natives
    }

    /// Observers created for maps, in creation order.
    pub fn observers(&self) -> &[Arc<RecordingObserver>] {
        &self.observers
    }

    // -- Calling natives --

    /// Call the registered native `name` whose parameters fit `args`, the way
    /// the JVM picks an overload.
    pub fn call(&mut self, bridge: &Bridge, name: &str, args: &[HostValue]) -> HostValue {
        let op = self
            .natives
            .iter()
            .map(|native| native.op)
            .find(|op| {
                let spec = op.spec();
                spec.name == name
                    && spec.params.len() == args.len()
                    && spec.params.iter().zip(args).all(|(param, arg)| param.accepts(arg))
            })
            .unwrap_or_else(|| panic!("no registered native {name} accepts {args:?}"));
        self.call_op(bridge, op, args)
    }

    /// Call the native registered under exactly `name` and `descriptor`.
    pub fn call_descriptor(
        &mut self,
        bridge: &Bridge,
        name: &str,
        descriptor: &str,
        args: &[HostValue],
    ) -> HostValue {
        let op = self
            .natives
            .iter()
            .find(|native| native.name == name && native.signature == descriptor)
            .map(|native| native.op)
            .unwrap_or_else(|| panic!("no registered native {name}{descriptor}"));
        self.call_op(bridge, op, args)
    }

    fn call_op(&mut self, bridge: &Bridge, op: Op, args: &[HostValue]) -> HostValue {
        let wrapper = self.wrapper;
        let result = dispatch::invoke(bridge, self, wrapper, op, args);
        // Returning to managed code frees the frame's local references; the
        // returned object stays reachable.
        let keep = match result {
            HostValue::Object(object) => object.into_raw(),
            _ => 0,
        };
        self.refs.retain(|raw, r| r.kind != Kind::Local || *raw == keep);
        if let Some(r) = self.refs.get_mut(&keep) {
            r.kind = Kind::Argument;
        }
        result
    }

    // -- Internals --

    fn alloc(&mut self, object: Object, kind: Kind) -> HostRef {
        let id = self.objects.len();
        self.objects.push(object);
        self.new_ref(id, kind)
    }

    fn argument(&mut self, object: Object) -> HostRef {
        self.alloc(object, Kind::Argument)
    }

    fn new_ref(&mut self, object: usize, kind: Kind) -> HostRef {
        self.next_ref += 8;
        self.refs.insert(self.next_ref, Ref { object, kind });
        HostRef::from_raw(self.next_ref)
    }

    fn object_id(&self, r: HostRef) -> Option<usize> {
        self.refs.get(&r.into_raw()).map(|r| r.object)
    }

    fn deref(&self, r: HostRef) -> Option<&Object> {
        self.objects.get(self.object_id(r)?)
    }

    fn resolve(&self, r: HostRef) -> HostResult<&Object> {
        self.deref(r)
            .ok_or_else(|| HostError::Failed(format!("invalid reference {:#x}", r.into_raw())))
    }

    fn class_name(&self, class: ClassRef) -> HostResult<String> {
        match self.resolve(class.0)? {
            Object::Class(name) => Ok(name.clone()),
            other => Err(HostError::Failed(format!("{other:?} is not a class"))),
        }
    }

    fn member(&self, raw: usize) -> HostResult<&Member> {
        raw.checked_sub(1)
            .and_then(|index| self.members.get(index))
            .ok_or_else(|| HostError::Failed(format!("invalid member id {raw}")))
    }

    fn member_id(&mut self, class: ClassRef, name: &str, found: bool) -> HostResult<usize> {
        let class = self.class_name(class)?;
        if !found {
            return Err(HostError::Failed(format!("no member {class}.{name}")));
        }
        let existing = self
            .members
            .iter()
            .position(|member| member.class == class && member.name == name);
        let index = existing.unwrap_or_else(|| {
            self.members.push(Member {
                class,
                name: name.to_owned(),
            });
            self.members.len() - 1
        });
        Ok(index + 1)
    }

    fn count(&self, kind: Kind) -> usize {
        self.refs.values().filter(|r| r.kind == kind).count()
    }

    fn touch(&mut self) {
        if self.pending.is_some() {
            self.calls_while_pending += 1;
        }
    }

    fn raise(&mut self, class: &str, message: &str) -> HostError {
        let thrown = Thrown {
            class: class.to_owned(),
            message: message.to_owned(),
        };
        self.thrown.push(thrown.clone());
        self.pending = Some(thrown);
        HostError::ExceptionPending
    }

    fn allocate(&mut self, object: Object) -> HostResult<HostRef> {
        if self.fail_allocations {
            return Err(self.raise(OUT_OF_MEMORY, "allocation failed"));
        }
        Ok(self.alloc(object, Kind::Local))
    }
}

impl HostEnv for TestHost {
    fn find_class(&mut self, name: &str) -> HostResult<ClassRef> {
        self.touch();
        if !self.classes.contains_key(name) {
            return Err(HostError::Failed(format!("no class {name}")));
        }
        Ok(ClassRef(self.alloc(Object::Class(name.to_owned()), Kind::Local)))
    }

    fn method_id(&mut self, class: ClassRef, name: &str, signature: &str) -> HostResult<MethodId> {
        self.touch();
        let class_name = self.class_name(class)?;
        let found = self.classes.get(&class_name).is_some_and(|def| {
            def.methods
                .iter()
                .any(|(method, sig)| method == name && sig == signature)
        });
        self.member_id(class, name, found).map(MethodId::from_raw)
    }

    fn field_id(&mut self, class: ClassRef, name: &str, signature: &str) -> HostResult<FieldId> {
        self.touch();
        let class_name = self.class_name(class)?;
        let found = signature == "D"
            && self
                .classes
                .get(&class_name)
                .is_some_and(|def| def.fields.iter().any(|field| field == name));
        self.member_id(class, name, found).map(FieldId::from_raw)
    }

    fn pin(&mut self, class: ClassRef) -> HostResult<ClassRef> {
        self.touch();
        let object = self
            .object_id(class.0)
            .ok_or_else(|| HostError::Failed("pinning an invalid reference".into()))?;
        Ok(ClassRef(self.new_ref(object, Kind::Global)))
    }

    fn unpin(&mut self, class: ClassRef) {
        let raw = class.0.into_raw();
        if self.refs.get(&raw).is_some_and(|r| r.kind == Kind::Global) {
            self.refs.remove(&raw);
        }
    }

    fn register_natives(&mut self, class: ClassRef, methods: &[NativeMethod]) -> HostResult<()> {
        self.touch();
        self.class_name(class)?;
        if self.fail_registration {
            return Err(HostError::Failed("RegisterNatives rejected the table".into()));
        }
        self.natives = methods.to_vec();
        Ok(())
    }

    fn throw_new(&mut self, class: ClassRef, message: &str) -> HostResult<()> {
        self.touch();
        let class = self.class_name(class)?;
        self.raise(&class, message);
        Ok(())
    }

    fn exception_pending(&mut self) -> bool {
        self.pending.is_some()
    }

    fn string_units(&mut self, string: HostRef) -> HostResult<Vec<u16>> {
        self.touch();
        match self.resolve(string)? {
            Object::String(units) => Ok(units.clone()),
            other => Err(HostError::Failed(format!("{other:?} is not a string"))),
        }
    }

    fn new_string(&mut self, units: &[u16]) -> HostResult<HostRef> {
        self.touch();
        self.allocate(Object::String(units.to_vec()))
    }

    fn call_object_method(
        &mut self,
        object: HostRef,
        method: MethodId,
        _args: &[HostValue],
    ) -> HostResult<HostRef> {
        self.touch();
        let name = self.member(method.into_raw())?.name.clone();
        let elements = match (name.as_str(), self.resolve(object)?) {
            ("toArray", Object::List(elements)) => elements.clone(),
            (name, other) => {
                return Err(HostError::Failed(format!("cannot call {name} on {other:?}")));
            }
        };
        self.allocate(Object::Array(elements))
    }

    fn call_boolean_method(
        &mut self,
        object: HostRef,
        method: MethodId,
        args: &[HostValue],
    ) -> HostResult<bool> {
        self.touch();
        let name = self.member(method.into_raw())?.name.clone();
        let element = match args {
            [HostValue::Object(element)] => self.object_id(*element),
            _ => return Err(HostError::Failed(format!("bad arguments to {name}: {args:?}"))),
        };
        let list = self
            .object_id(object)
            .ok_or_else(|| HostError::Failed("invalid list reference".into()))?;
        match (name.as_str(), &mut self.objects[list]) {
            ("add", Object::List(elements)) => {
                elements.push(element);
                Ok(true)
            }
            (name, other) => Err(HostError::Failed(format!("cannot call {name} on {other:?}"))),
        }
    }

    fn new_object(
        &mut self,
        class: ClassRef,
        constructor: MethodId,
        args: &[HostValue],
    ) -> HostResult<HostRef> {
        self.touch();
        let class_name = self.class_name(class)?;
        if self.member(constructor.into_raw())?.name != "<init>" {
            return Err(HostError::Failed("not a constructor".into()));
        }
        if class_name == ARRAY_LIST {
            return self.allocate(Object::List(Vec::new()));
        }
        let fields = args
            .iter()
            .map(HostValue::as_double)
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| HostError::Failed(format!("bad constructor arguments {args:?}")))?;
        self.allocate(Object::Value {
            class: class_name,
            fields,
        })
    }

    fn double_field(&mut self, object: HostRef, field: FieldId) -> HostResult<f64> {
        self.touch();
        let name = self.member(field.into_raw())?.name.clone();
        match self.resolve(object)? {
            Object::Value { class, fields } => self
                .classes
                .get(class)
                .and_then(|def| def.fields.iter().position(|f| *f == name))
                .and_then(|index| fields.get(index).copied())
                .ok_or_else(|| HostError::Failed(format!("{class} has no field {name}"))),
            other => Err(HostError::Failed(format!("{other:?} has no fields"))),
        }
    }

    fn array_length(&mut self, array: HostRef) -> HostResult<usize> {
        self.touch();
        match self.resolve(array)? {
            Object::Array(elements) => Ok(elements.len()),
            other => Err(HostError::Failed(format!("{other:?} is not an array"))),
        }
    }

    fn array_element(&mut self, array: HostRef, index: usize) -> HostResult<HostRef> {
        self.touch();
        let element = match self.resolve(array)? {
            Object::Array(elements) => elements
                .get(index)
                .copied()
                .ok_or_else(|| HostError::Failed(format!("index {index} out of bounds")))?,
            other => return Err(HostError::Failed(format!("{other:?} is not an array"))),
        };
        Ok(match element {
            Some(object) => self.new_ref(object, Kind::Local),
            None => HostRef::NULL,
        })
    }

    fn delete_local(&mut self, object: HostRef) {
        let raw = object.into_raw();
        if self.refs.get(&raw).is_some_and(|r| r.kind == Kind::Local) {
            self.refs.remove(&raw);
        }
    }

    fn native_window(&mut self, surface: HostRef) -> HostResult<Option<NativeWindow>> {
        self.touch();
        match self.resolve(surface)? {
            Object::Surface(window) => Ok(NativeWindow::from_raw(*window as *mut c_void)),
            other => Err(HostError::Failed(format!("{other:?} is not a Surface"))),
        }
    }

    fn observer(
        &mut self,
        wrapper: HostRef,
        callbacks: Callbacks,
    ) -> HostResult<Arc<dyn MapObserver>> {
        self.touch();
        match self.resolve(wrapper)? {
            Object::Wrapper => {}
            other => return Err(HostError::Failed(format!("{other:?} is not a map view"))),
        }
        for (id, expected) in [
            (callbacks.on_map_changed, "onMapChanged"),
            (callbacks.on_fps_changed, "onFpsChanged"),
        ] {
            if self.member(id.into_raw())?.name != expected {
                return Err(HostError::Failed(format!("callback id does not name {expected}")));
            }
        }
        let observer = Arc::new(RecordingObserver::default());
        self.observers.push(observer.clone());
        Ok(observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_release_locals() {
        let mut host = TestHost::new();
        let class = host.find_class("java/util/ArrayList").unwrap();
        assert_eq!(host.live_locals(), 1);
        host.delete_local(class.0);
        assert_eq!(host.live_locals(), 0);
    }

    #[test]
    fn calls_after_a_throw_are_counted() {
        let mut host = TestHost::new();
        let class = host.find_class("java/lang/RuntimeException").unwrap();
        host.throw_new(class, "boom").unwrap();
        assert!(host.exception_pending());
        host.new_string(&[0x61]).unwrap();
        assert_eq!(host.calls_while_pending(), 1);
        assert_eq!(host.take_exception().unwrap().message, "boom");
    }

    #[test]
    fn unknown_members_fail() {
        let mut host = TestHost::new();
        let list = host.find_class("java/util/List").unwrap();
        assert!(host.method_id(list, "size", "()I").is_err());
        assert!(host.method_id(list, "toArray", "()[Ljava/lang/Object;").is_ok());
    }
}
