// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed method signatures.
//
// Native method descriptors are rendered from these types rather than written
// by hand, so the registered descriptor and the argument kinds the router
// decodes cannot drift apart.

use mapview_core::config::ClassNames;

use crate::host::{HostRef, HostValue};

/// One parameter or return type of a wrapper method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSig {
    Void,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    List,
    Surface,
    LonLat,
    LonLatZoom,
}

impl TypeSig {
    /// JNI type descriptor, e.g. `J` or `Ljava/lang/String;`.
    pub fn descriptor(self, classes: &ClassNames) -> String {
        match self {
            TypeSig::Void => "V".into(),
            TypeSig::Boolean => "Z".into(),
            TypeSig::Int => "I".into(),
            TypeSig::Long => "J".into(),
            TypeSig::Float => "F".into(),
            TypeSig::Double => "D".into(),
            TypeSig::String => "Ljava/lang/String;".into(),
            TypeSig::List => "Ljava/util/List;".into(),
            TypeSig::Surface => "Landroid/view/Surface;".into(),
            TypeSig::LonLat => object_descriptor(&classes.lon_lat),
            TypeSig::LonLatZoom => object_descriptor(&classes.lon_lat_zoom),
        }
    }

    /// Whether `value` has the shape a parameter of this type arrives in.
    pub fn accepts(self, value: &HostValue) -> bool {
        matches!(
            (self, value),
            (TypeSig::Boolean, HostValue::Boolean(_))
                | (TypeSig::Int, HostValue::Int(_))
                | (TypeSig::Long, HostValue::Long(_))
                | (TypeSig::Float, HostValue::Float(_))
                | (TypeSig::Double, HostValue::Double(_))
                | (
                    TypeSig::String
                        | TypeSig::List
                        | TypeSig::Surface
                        | TypeSig::LonLat
                        | TypeSig::LonLatZoom,
                    HostValue::Object(_)
                )
        )
    }

    /// Value returned to the host when an operation of this return type
    /// fails: zero, false, null or nothing.
    pub fn default_value(self) -> HostValue {
        match self {
            TypeSig::Void => HostValue::Void,
            TypeSig::Boolean => HostValue::Boolean(false),
            TypeSig::Int => HostValue::Int(0),
            TypeSig::Long => HostValue::Long(0),
            TypeSig::Float => HostValue::Float(0.0),
            TypeSig::Double => HostValue::Double(0.0),
            TypeSig::String
            | TypeSig::List
            | TypeSig::Surface
            | TypeSig::LonLat
            | TypeSig::LonLatZoom => HostValue::Object(HostRef::NULL),
        }
    }
}

/// Render a full method descriptor such as `(JDD)V`.
pub fn method_descriptor(params: &[TypeSig], ret: TypeSig, classes: &ClassNames) -> String {
    let mut out = String::from("(");
    for param in params {
        out.push_str(&param.descriptor(classes));
    }
    out.push(')');
    out.push_str(&ret.descriptor(classes));
    out
}

fn object_descriptor(class: &str) -> String {
    format!("L{class};")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitive_descriptors() {
        let classes = ClassNames::default();
        let sig = method_descriptor(
            &[TypeSig::Long, TypeSig::Int, TypeSig::Int, TypeSig::Float],
            TypeSig::Void,
            &classes,
        );
        assert_eq!(sig, "(JIIF)V");
    }

    #[test]
    fn value_classes_follow_configuration() {
        let classes = ClassNames {
            lon_lat: "org/example/Point".into(),
            ..ClassNames::default()
        };
        assert_eq!(
            method_descriptor(&[TypeSig::Long], TypeSig::LonLat, &classes),
            "(J)Lorg/example/Point;"
        );
        assert_eq!(
            TypeSig::LonLatZoom.descriptor(&classes),
            "Lcom/mapbox/mapboxgl/lib/LonLatZoom;"
        );
    }

    #[test]
    fn kinds_must_match() {
        assert!(TypeSig::Long.accepts(&HostValue::Long(1)));
        assert!(!TypeSig::Long.accepts(&HostValue::Int(1)));
        assert!(TypeSig::List.accepts(&HostValue::Object(HostRef::NULL)));
        assert!(!TypeSig::Double.accepts(&HostValue::Float(1.0)));
    }

    #[test]
    fn defaults_are_zero_like() {
        assert_eq!(TypeSig::Boolean.default_value(), HostValue::Boolean(false));
        assert_eq!(TypeSig::Long.default_value(), HostValue::Long(0));
        assert_eq!(
            TypeSig::String.default_value(),
            HostValue::Object(HostRef::NULL)
        );
    }
}
