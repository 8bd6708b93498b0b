//! # Value Deserializer
//!
//! Maps wire values received from the server back to native values.

use std::sync::Arc;

use super::errors::{CodecError, CodecResult};
use super::native::NativeValue;
use super::types::{DocumentRef, FieldMap};
use super::wire::{WireValue, VECTOR_VALUE_KEY};

/// Turns a document resource name into a reference handle
pub trait ReferenceResolver: Send + Sync {
    fn path_to_reference(&self, resource_name: &str) -> CodecResult<DocumentRef>;
}

/// Resolves resource names under a single database's document root
#[derive(Debug, Clone)]
pub struct DatabaseResolver {
    prefix: String,
}

impl DatabaseResolver {
    pub fn new(database: &str) -> Self {
        Self {
            prefix: format!("{}/documents/", database),
        }
    }
}

impl ReferenceResolver for DatabaseResolver {
    fn path_to_reference(&self, resource_name: &str) -> CodecResult<DocumentRef> {
        let path = resource_name.strip_prefix(&self.prefix).ok_or_else(|| {
            CodecError::decode_failed(format!(
                "Reference \"{}\" does not belong to database root \"{}\"",
                resource_name, self.prefix
            ))
        })?;
        DocumentRef::new(path).map_err(|e| CodecError::decode_failed(e.message().to_string()))
    }
}

/// Decodes wire values.
///
/// Whether timestamps come back as native dates is fixed at construction.
#[derive(Clone)]
pub struct Deserializer {
    timestamps_as_dates: bool,
    resolver: Arc<dyn ReferenceResolver>,
}

impl Deserializer {
    pub fn new(resolver: Arc<dyn ReferenceResolver>, timestamps_as_dates: bool) -> Self {
        Self {
            timestamps_as_dates,
            resolver,
        }
    }

    /// Decoder for one database with the default reference resolver
    pub fn for_database(database: &str, timestamps_as_dates: bool) -> Self {
        Self::new(Arc::new(DatabaseResolver::new(database)), timestamps_as_dates)
    }

    pub fn timestamps_as_dates(&self) -> bool {
        self.timestamps_as_dates
    }

    /// Resolve a document resource name through the configured resolver
    pub fn resolve_reference(&self, resource_name: &str) -> CodecResult<DocumentRef> {
        self.resolver.path_to_reference(resource_name)
    }

    /// Decode a single wire value
    pub fn decode_value(&self, value: &WireValue) -> CodecResult<NativeValue> {
        let native = match value {
            WireValue::Null => NativeValue::Null,
            WireValue::Boolean(b) => NativeValue::Boolean(*b),
            WireValue::Integer(i) => NativeValue::Integer(*i),
            WireValue::Double(d) => NativeValue::Double(*d),
            WireValue::Timestamp(t) => {
                if self.timestamps_as_dates {
                    NativeValue::Date(t.to_datetime()?)
                } else {
                    NativeValue::Timestamp(*t)
                }
            }
            WireValue::String(s) => NativeValue::String(s.clone()),
            WireValue::Bytes(b) => NativeValue::Bytes(b.clone()),
            WireValue::Reference(name) => NativeValue::Reference(self.resolve_reference(name)?),
            WireValue::GeoPoint(g) => NativeValue::GeoPoint(*g),
            WireValue::Array(items) => NativeValue::Array(
                items
                    .iter()
                    .map(|item| self.decode_value(item))
                    .collect::<CodecResult<Vec<_>>>()?,
            ),
            WireValue::Map(fields) if value.is_vector() => decode_vector(fields)?,
            WireValue::Map(fields) => NativeValue::Map(self.decode_fields(fields)?),
            WireValue::FieldReference(_) | WireValue::Function(_) | WireValue::Pipeline(_) => {
                return Err(CodecError::decode_failed(format!(
                    "Cannot decode wire value of kind \"{}\" into a document value",
                    value.kind()
                )))
            }
        };
        Ok(native)
    }

    /// Decode every field of a wire map
    pub fn decode_fields(&self, fields: &FieldMap<WireValue>) -> CodecResult<FieldMap<NativeValue>> {
        let mut decoded = FieldMap::with_capacity(fields.len());
        for (key, value) in fields.iter() {
            decoded.insert(key, self.decode_value(value)?);
        }
        Ok(decoded)
    }
}

fn decode_vector(fields: &FieldMap<WireValue>) -> CodecResult<NativeValue> {
    let items = fields
        .get(VECTOR_VALUE_KEY)
        .and_then(WireValue::as_array)
        .ok_or_else(|| CodecError::decode_failed("Vector value is missing its components"))?;

    let mut components = Vec::with_capacity(items.len());
    for item in items {
        match item {
            WireValue::Double(d) => components.push(*d),
            WireValue::Integer(i) => components.push(*i as f64),
            other => {
                return Err(CodecError::decode_failed(format!(
                    "Vector component must be a number, got {}",
                    other.kind()
                )))
            }
        }
    }
    Ok(NativeValue::Vector(components))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{CodecErrorCode, FunctionValue, GeoPoint, Serializer, Timestamp};
    use chrono::{TimeZone, Utc};

    const DATABASE: &str = "projects/p/databases/(default)";

    fn round_trip(value: NativeValue) -> NativeValue {
        let wire = Serializer::new(DATABASE).encode(&value).unwrap().unwrap();
        Deserializer::for_database(DATABASE, false)
            .decode_value(&wire)
            .unwrap()
    }

    #[test]
    fn test_round_trip_scalars() {
        for value in [
            NativeValue::String("hello".into()),
            NativeValue::Boolean(true),
            NativeValue::Integer(-42),
            NativeValue::Double(2.5),
            NativeValue::Double(f64::INFINITY),
            NativeValue::Double(f64::NEG_INFINITY),
            NativeValue::Bytes(vec![0, 1, 255]),
            NativeValue::Timestamp(Timestamp::new(1_700_000_000, 5).unwrap()),
            NativeValue::GeoPoint(GeoPoint::new(10.0, -20.0).unwrap()),
            NativeValue::Reference(DocumentRef::new("users/alice").unwrap()),
            NativeValue::Vector(vec![0.5, -1.0, 3.0]),
            NativeValue::Null,
        ] {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn test_round_trip_nan() {
        match round_trip(NativeValue::Double(f64::NAN)) {
            NativeValue::Double(d) => assert!(d.is_nan()),
            other => panic!("expected double, got {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_nested() {
        let value = NativeValue::map([
            ("name", NativeValue::from("alice")),
            (
                "tags",
                NativeValue::Array(vec![NativeValue::from("a"), NativeValue::from("b")]),
            ),
            (
                "address",
                NativeValue::map([("zip", NativeValue::Integer(12345))]),
            ),
            ("empty", NativeValue::Map(FieldMap::new())),
        ]);
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn test_timestamps_as_dates() {
        let wire = WireValue::Timestamp(Timestamp::new(1_600_000_000, 0).unwrap());
        let decoded = Deserializer::for_database(DATABASE, true)
            .decode_value(&wire)
            .unwrap();
        assert_eq!(
            decoded,
            NativeValue::Date(Utc.timestamp_opt(1_600_000_000, 0).unwrap())
        );
    }

    #[test]
    fn test_foreign_reference_rejected() {
        let wire = WireValue::Reference("projects/other/databases/x/documents/a/b".into());
        let err = Deserializer::for_database(DATABASE, false)
            .decode_value(&wire)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::DecodeFailed);
    }

    #[test]
    fn test_expression_values_not_decodable() {
        let wire = WireValue::Function(FunctionValue::new("add", vec![]));
        let err = Deserializer::for_database(DATABASE, false)
            .decode_value(&wire)
            .unwrap_err();
        assert!(err.message().contains("function"));
    }

    #[test]
    fn test_malformed_vector_rejected() {
        let mut fields = FieldMap::new();
        fields.insert("__type__", WireValue::string("__vector__"));
        fields.insert("value", WireValue::string("oops"));
        let err = Deserializer::for_database(DATABASE, false)
            .decode_value(&WireValue::Map(fields))
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::DecodeFailed);
    }
}
