//! # Value Serializer
//!
//! Maps native values to wire values.
//!
//! Dispatch order is fixed: sentinels, strings, booleans, integral
//! numbers, remaining numbers, dates, bytes, references, self-serializing
//! objects, arrays, maps.
//!
//! `Ok(None)` means "omit this field". It is distinct from
//! `Some(WireValue::Null)`.

use super::errors::{CodecError, CodecResult};
use super::native::NativeValue;
use super::types::{FieldMap, Timestamp};
use super::wire::{WireValue, TYPE_KEY, VECTOR_TYPE, VECTOR_VALUE_KEY};

/// Maximum nesting depth accepted by the encoder
pub const MAX_DEPTH: usize = 20;

/// Largest integer exactly representable by a host number
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Encodes native values for a single database
#[derive(Debug, Clone)]
pub struct Serializer {
    database: String,
}

impl Serializer {
    /// Create a serializer for `projects/{project}/databases/{database}`
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    /// Database resource name references are qualified with
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Encode a value, checking the depth bound first.
    pub fn encode(&self, value: &NativeValue) -> CodecResult<Option<WireValue>> {
        self.encode_argument("value", value)
    }

    /// Encode a value, naming `argument` in any error.
    pub fn encode_argument(
        &self,
        argument: &str,
        value: &NativeValue,
    ) -> CodecResult<Option<WireValue>> {
        validate_depth(argument, value, MAX_DEPTH)?;
        self.encode_value(argument, value)
    }

    /// Encode the fields of a document, keeping only fields with a value.
    ///
    /// The document itself counts as the first nesting level.
    pub fn encode_fields(
        &self,
        fields: &FieldMap<NativeValue>,
    ) -> CodecResult<FieldMap<WireValue>> {
        check_children("data", fields.values(), 0, MAX_DEPTH)?;
        self.encode_map(fields)
    }

    fn encode_map(&self, fields: &FieldMap<NativeValue>) -> CodecResult<FieldMap<WireValue>> {
        let mut encoded = FieldMap::with_capacity(fields.len());
        for (key, value) in fields.iter() {
            if let Some(wire) = self.encode_value(key, value)? {
                encoded.insert(key, wire);
            }
        }
        Ok(encoded)
    }

    /// Full resource name for a document path
    pub fn reference_name(&self, path: &str) -> String {
        format!("{}/documents/{}", self.database, path)
    }

    fn encode_value(&self, argument: &str, value: &NativeValue) -> CodecResult<Option<WireValue>> {
        let wire = match value {
            NativeValue::Sentinel(_) => return Ok(None),
            NativeValue::String(s) => WireValue::String(s.clone()),
            NativeValue::Boolean(b) => WireValue::Boolean(*b),
            NativeValue::Integer(i) => WireValue::Integer(*i),
            NativeValue::Number(n) if is_integral(*n) => WireValue::Integer(*n as i64),
            NativeValue::Number(n) | NativeValue::Double(n) => WireValue::Double(*n),
            NativeValue::Date(d) => WireValue::Timestamp(Timestamp::from_datetime(*d)),
            NativeValue::Timestamp(t) => WireValue::Timestamp(*t),
            NativeValue::Bytes(b) => WireValue::Bytes(b.clone()),
            NativeValue::Reference(r) => WireValue::Reference(self.reference_name(r.path())),
            NativeValue::GeoPoint(g) => WireValue::GeoPoint(*g),
            NativeValue::Vector(components) => encode_vector(components),
            NativeValue::Null => WireValue::Null,
            NativeValue::Custom(custom) => match custom.to_wire_value() {
                Some(wire) => wire,
                None => {
                    return Err(CodecError::invalid_argument(
                        argument,
                        format!(
                            "Couldn't serialize {}. Only plain data objects and types with their own wire form are supported.",
                            value.describe()
                        ),
                    ))
                }
            },
            NativeValue::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(wire) = self.encode_value(argument, item)? {
                        values.push(wire);
                    }
                }
                WireValue::Array(values)
            }
            NativeValue::Map(fields) => {
                let encoded = self.encode_map(fields)?;
                // A non-empty object whose every field was omitted is itself
                // omitted; an empty object stays an empty map.
                if encoded.is_empty() && !fields.is_empty() {
                    return Ok(None);
                }
                WireValue::Map(encoded)
            }
        };
        Ok(Some(wire))
    }
}

/// True if a host number should be sent as an integer
pub fn is_integral(n: f64) -> bool {
    n.is_finite()
        && n.fract() == 0.0
        && n.abs() <= MAX_SAFE_INTEGER
        && !(n == 0.0 && n.is_sign_negative())
}

fn encode_vector(components: &[f64]) -> WireValue {
    let mut fields = FieldMap::with_capacity(2);
    fields.insert(TYPE_KEY, WireValue::string(VECTOR_TYPE));
    fields.insert(
        VECTOR_VALUE_KEY,
        WireValue::Array(components.iter().map(|c| WireValue::Double(*c)).collect()),
    );
    WireValue::Map(fields)
}

/// Reject values nested deeper than `max_depth` containers.
///
/// This is a static bound: acyclic structures deeper than the bound are
/// rejected the same way as cyclic ones.
pub fn validate_depth(argument: &str, value: &NativeValue, max_depth: usize) -> CodecResult<()> {
    check_depth(argument, value, 0, max_depth)
}

fn check_depth(argument: &str, value: &NativeValue, level: usize, max_depth: usize) -> CodecResult<()> {
    match value {
        NativeValue::Array(items) => check_children(argument, items.iter(), level, max_depth),
        NativeValue::Map(fields) => check_children(argument, fields.values(), level, max_depth),
        _ => Ok(()),
    }
}

fn check_children<'a>(
    argument: &str,
    children: impl Iterator<Item = &'a NativeValue>,
    level: usize,
    max_depth: usize,
) -> CodecResult<()> {
    if level + 1 > max_depth {
        return Err(CodecError::too_deep(argument, max_depth));
    }
    for child in children {
        check_depth(argument, child, level + 1, max_depth)?;
    }
    Ok(())
}
