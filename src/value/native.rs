//! # Native Values
//!
//! The host-side value categories accepted by the serializer and produced
//! by the deserializer.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::types::{DocumentRef, FieldMap, GeoPoint, Timestamp};
use super::wire::WireValue;

/// Reserved write-transform markers. These never produce a field value;
/// the encoder reports them as "omit this field".
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    Delete,
    ServerTimestamp,
    Increment(f64),
    ArrayUnion(Vec<NativeValue>),
    ArrayRemove(Vec<NativeValue>),
}

impl FieldTransform {
    /// Method name used in diagnostics
    pub fn method_name(&self) -> &'static str {
        match self {
            FieldTransform::Delete => "FieldValue.delete",
            FieldTransform::ServerTimestamp => "FieldValue.serverTimestamp",
            FieldTransform::Increment(_) => "FieldValue.increment",
            FieldTransform::ArrayUnion(_) => "FieldValue.arrayUnion",
            FieldTransform::ArrayRemove(_) => "FieldValue.arrayRemove",
        }
    }
}

/// A host object that may know how to serialize itself.
///
/// Objects that return `None` from `to_wire_value` are rejected by the
/// encoder.
pub trait CustomValue: fmt::Debug + Send + Sync {
    /// Type name reported when the object cannot be encoded
    fn type_name(&self) -> &str;

    /// The object's own wire form, if it has one
    fn to_wire_value(&self) -> Option<WireValue> {
        None
    }
}

/// A native value
#[derive(Debug, Clone)]
pub enum NativeValue {
    Null,
    Boolean(bool),
    /// A value known to be an integer
    Integer(i64),
    /// A value known to be floating point
    Double(f64),
    /// An untyped host number; integral values encode as integers
    Number(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
    Timestamp(Timestamp),
    GeoPoint(GeoPoint),
    Reference(DocumentRef),
    Vector(Vec<f64>),
    Array(Vec<NativeValue>),
    Map(FieldMap<NativeValue>),
    Sentinel(FieldTransform),
    Custom(Arc<dyn CustomValue>),
}

impl NativeValue {
    /// Build a map value from key/value pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, NativeValue)>) -> Self {
        NativeValue::Map(entries.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn as_map(&self) -> Option<&FieldMap<NativeValue>> {
        match self {
            NativeValue::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short description of the value's category, for diagnostics
    pub fn describe(&self) -> String {
        match self {
            NativeValue::Null => "null".to_string(),
            NativeValue::Boolean(b) => format!("boolean {}", b),
            NativeValue::Integer(i) => format!("integer {}", i),
            NativeValue::Double(d) | NativeValue::Number(d) => format!("number {}", d),
            NativeValue::String(s) => format!("string \"{}\"", s),
            NativeValue::Bytes(b) => format!("bytes ({} bytes)", b.len()),
            NativeValue::Date(d) => format!("date {}", d.to_rfc3339()),
            NativeValue::Timestamp(t) => format!("timestamp {}.{:09}", t.seconds(), t.nanos()),
            NativeValue::GeoPoint(g) => format!("geo point ({}, {})", g.latitude(), g.longitude()),
            NativeValue::Reference(r) => format!("reference {}", r.path()),
            NativeValue::Vector(v) => format!("vector of {} dimensions", v.len()),
            NativeValue::Array(a) => format!("array of {} elements", a.len()),
            NativeValue::Map(m) => format!("map of {} fields", m.len()),
            NativeValue::Sentinel(t) => format!("{}()", t.method_name()),
            NativeValue::Custom(c) => format!("object of type \"{}\"", c.type_name()),
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        use NativeValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Double(a), Double(b)) | (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (GeoPoint(a), GeoPoint(b)) => a == b,
            (Reference(a), Reference(b)) => a == b,
            (Vector(a), Vector(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Sentinel(a), Sentinel(b)) => a == b,
            (Custom(a), Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Boolean(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        NativeValue::Integer(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        NativeValue::Integer(value as i64)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Double(value)
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::String(value)
    }
}

impl From<DateTime<Utc>> for NativeValue {
    fn from(value: DateTime<Utc>) -> Self {
        NativeValue::Date(value)
    }
}

impl From<Timestamp> for NativeValue {
    fn from(value: Timestamp) -> Self {
        NativeValue::Timestamp(value)
    }
}

impl From<GeoPoint> for NativeValue {
    fn from(value: GeoPoint) -> Self {
        NativeValue::GeoPoint(value)
    }
}

impl From<DocumentRef> for NativeValue {
    fn from(value: DocumentRef) -> Self {
        NativeValue::Reference(value)
    }
}

impl From<Vec<NativeValue>> for NativeValue {
    fn from(value: Vec<NativeValue>) -> Self {
        NativeValue::Array(value)
    }
}

impl From<FieldMap<NativeValue>> for NativeValue {
    fn from(value: FieldMap<NativeValue>) -> Self {
        NativeValue::Map(value)
    }
}

impl From<FieldTransform> for NativeValue {
    fn from(value: FieldTransform) -> Self {
        NativeValue::Sentinel(value)
    }
}

/// JSON numbers that fit an `i64` become integers; all others become
/// untyped host numbers.
impl From<serde_json::Value> for NativeValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => NativeValue::Null,
            Value::Bool(b) => NativeValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => NativeValue::Integer(i),
                None => NativeValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => NativeValue::String(s),
            Value::Array(items) => {
                NativeValue::Array(items.into_iter().map(NativeValue::from).collect())
            }
            Value::Object(fields) => NativeValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, NativeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Opaque;

    impl CustomValue for Opaque {
        fn type_name(&self) -> &str {
            "Opaque"
        }
    }

    #[test]
    fn test_from_json() {
        let value = NativeValue::from(json!({"a": 1, "b": [true, "x"], "c": 1.5}));
        let map = value.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&NativeValue::Integer(1)));
        assert_eq!(
            map.get("b"),
            Some(&NativeValue::Array(vec![
                NativeValue::Boolean(true),
                NativeValue::String("x".into()),
            ]))
        );
        assert_eq!(map.get("c"), Some(&NativeValue::Number(1.5)));
    }

    #[test]
    fn test_custom_equality_is_identity() {
        let a: Arc<dyn CustomValue> = Arc::new(Opaque);
        let b: Arc<dyn CustomValue> = Arc::new(Opaque);
        assert_eq!(NativeValue::Custom(a.clone()), NativeValue::Custom(a));
        assert_ne!(
            NativeValue::Custom(b),
            NativeValue::Custom(Arc::new(Opaque))
        );
    }

    #[test]
    fn test_describe_sentinel() {
        let v = NativeValue::from(FieldTransform::Delete);
        assert_eq!(v.describe(), "FieldValue.delete()");
    }
}
