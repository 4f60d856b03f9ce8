// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Managed runtime abstraction.
//
// `HostEnv` is the slice of the JNI function table the bridge relies on. The
// Android implementation (`android::JniHost`) forwards to `jni`; the
// in-memory implementation (`testing::TestHost`) lets every bridge path run
// without a JVM.

use std::sync::Arc;

use mapview_core::NativeWindow;
use mapview_core::engine::MapObserver;
use thiserror::Error;

use crate::dispatch::Op;

/// A raw reference as handed out by the managed runtime. Zero is `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HostRef(usize);

impl HostRef {
    pub const NULL: HostRef = HostRef(0);

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn into_raw(self) -> usize {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// A reference known to denote a class object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassRef(pub HostRef);

/// Resolved method (or constructor) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(usize);

/// Resolved instance field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(usize);

impl MethodId {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn into_raw(self) -> usize {
        self.0
    }
}

impl FieldId {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn into_raw(self) -> usize {
        self.0
    }
}

/// An argument or return value crossing the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostValue {
    Void,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(HostRef),
}

impl HostValue {
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match *self {
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match *self {
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<HostRef> {
        match *self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl From<HostRef> for HostValue {
    fn from(object: HostRef) -> Self {
        Self::Object(object)
    }
}

/// Failure reported by the host runtime.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    /// The host raised an exception; it is pending on the current thread.
    #[error("managed exception pending")]
    ExceptionPending,

    /// The call failed without leaving an exception behind.
    #[error("{0}")]
    Failed(String),
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Method ids of the wrapper callbacks, resolved at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callbacks {
    pub on_map_changed: MethodId,
    pub on_fps_changed: MethodId,
}

/// One entry handed to [`HostEnv::register_natives`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMethod {
    pub name: &'static str,
    /// Rendered JNI descriptor, e.g. `(JIIF)V`.
    pub signature: String,
    pub op: Op,
}

/// Operations the bridge performs against the managed runtime.
///
/// Every method that can fail returns `HostError::ExceptionPending` when the
/// runtime raised an exception; callers must stop issuing host calls until
/// control returns to managed code.
pub trait HostEnv {
    // -- Metadata --
    fn find_class(&mut self, name: &str) -> HostResult<ClassRef>;
    fn method_id(&mut self, class: ClassRef, name: &str, signature: &str) -> HostResult<MethodId>;
    fn field_id(&mut self, class: ClassRef, name: &str, signature: &str) -> HostResult<FieldId>;
    /// Promote a class reference to a global one that outlives the call.
    fn pin(&mut self, class: ClassRef) -> HostResult<ClassRef>;
    /// Release a reference obtained from [`HostEnv::pin`].
    fn unpin(&mut self, class: ClassRef);
    fn register_natives(&mut self, class: ClassRef, methods: &[NativeMethod]) -> HostResult<()>;

    // -- Exceptions --
    fn throw_new(&mut self, class: ClassRef, message: &str) -> HostResult<()>;
    fn exception_pending(&mut self) -> bool;

    // -- Strings --
    /// UTF-16 code units of a non-null string.
    fn string_units(&mut self, string: HostRef) -> HostResult<Vec<u16>>;
    fn new_string(&mut self, units: &[u16]) -> HostResult<HostRef>;

    // -- Objects and arrays --
    fn call_object_method(
        &mut self,
        object: HostRef,
        method: MethodId,
        args: &[HostValue],
    ) -> HostResult<HostRef>;
    fn call_boolean_method(
        &mut self,
        object: HostRef,
        method: MethodId,
        args: &[HostValue],
    ) -> HostResult<bool>;
    fn new_object(
        &mut self,
        class: ClassRef,
        constructor: MethodId,
        args: &[HostValue],
    ) -> HostResult<HostRef>;
    fn double_field(&mut self, object: HostRef, field: FieldId) -> HostResult<f64>;
    fn array_length(&mut self, array: HostRef) -> HostResult<usize>;
    fn array_element(&mut self, array: HostRef, index: usize) -> HostResult<HostRef>;
    /// Drop a local reference early; long loops would otherwise exhaust the
    /// local reference table.
    fn delete_local(&mut self, object: HostRef);

    // -- Platform --
    /// Acquire the drawing surface behind a managed `Surface` object.
    fn native_window(&mut self, surface: HostRef) -> HostResult<Option<NativeWindow>>;
    /// Build an observer that forwards engine notifications to `wrapper`.
    fn observer(
        &mut self,
        wrapper: HostRef,
        callbacks: Callbacks,
    ) -> HostResult<Arc<dyn MapObserver>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_ref() {
        assert!(HostRef::NULL.is_null());
        assert!(HostRef::default().is_null());
        assert!(!HostRef::from_raw(0x10).is_null());
    }

    #[test]
    fn value_accessors_are_strict() {
        assert_eq!(HostValue::Long(7).as_long(), Some(7));
        assert_eq!(HostValue::Int(7).as_long(), None);
        assert_eq!(HostValue::Double(1.5).as_float(), None);
        assert_eq!(HostValue::Object(HostRef::NULL).as_object(), Some(HostRef::NULL));
    }
}
