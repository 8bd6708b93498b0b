//! # Wire Values
//!
//! The tagged union sent to and received from the server. Exactly one
//! variant is populated by construction.

use super::types::{FieldMap, GeoPoint, Timestamp};

/// Map key marking a map-encoded vector
pub const TYPE_KEY: &str = "__type__";
/// Marker value for vectors
pub const VECTOR_TYPE: &str = "__vector__";
/// Map key carrying the vector components
pub const VECTOR_VALUE_KEY: &str = "value";

/// A single field's value on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(Vec<u8>),
    /// Full resource name of a document
    Reference(String),
    GeoPoint(GeoPoint),
    Array(Vec<WireValue>),
    Map(FieldMap<WireValue>),
    /// Dotted field path evaluated by the server
    FieldReference(String),
    /// Function call evaluated by the server
    Function(FunctionValue),
    /// A nested pipeline (e.g. a subquery)
    Pipeline(PipelineValue),
}

impl WireValue {
    /// Name of the populated variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Boolean(_) => "boolean",
            WireValue::Integer(_) => "integer",
            WireValue::Double(_) => "double",
            WireValue::Timestamp(_) => "timestamp",
            WireValue::String(_) => "string",
            WireValue::Bytes(_) => "bytes",
            WireValue::Reference(_) => "reference",
            WireValue::GeoPoint(_) => "geo_point",
            WireValue::Array(_) => "array",
            WireValue::Map(_) => "map",
            WireValue::FieldReference(_) => "field_reference",
            WireValue::Function(_) => "function",
            WireValue::Pipeline(_) => "pipeline",
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        WireValue::String(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// True for a Double carrying NaN
    pub fn is_nan(&self) -> bool {
        matches!(self, WireValue::Double(d) if d.is_nan())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FieldMap<WireValue>> {
        match self {
            WireValue::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// True for a map carrying the vector marker
    pub fn is_vector(&self) -> bool {
        self.as_map()
            .and_then(|m| m.get(TYPE_KEY))
            .and_then(WireValue::as_str)
            == Some(VECTOR_TYPE)
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Boolean(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Integer(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        WireValue::Integer(value as i64)
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        WireValue::Double(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::String(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::String(value)
    }
}

impl From<Timestamp> for WireValue {
    fn from(value: Timestamp) -> Self {
        WireValue::Timestamp(value)
    }
}

/// A named server-side function applied to wire arguments
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
    pub args: Vec<WireValue>,
}

impl FunctionValue {
    pub fn new(name: impl Into<String>, args: Vec<WireValue>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One pipeline stage on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct StageValue {
    pub name: String,
    pub args: Vec<WireValue>,
    pub options: FieldMap<WireValue>,
}

/// An ordered list of stages on the wire
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineValue {
    pub stages: Vec<StageValue>,
}
