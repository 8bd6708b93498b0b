//! Value codec for docpipe
//!
//! Bidirectional mapping between native values and the tagged wire union.
//!
//! # Encoding Contract
//!
//! - Transform sentinels encode to "no value" (`None`), never to `Null`
//! - Host numbers are split into integers and doubles
//! - NaN and ±Infinity round-trip exactly
//! - An empty object encodes to an empty map; an object whose fields were
//!   all omitted encodes to "no value"
//! - Nesting deeper than 20 levels is rejected before encoding

mod deserializer;
mod errors;
mod native;
mod serializer;
mod types;
mod wire;

pub use deserializer::{DatabaseResolver, Deserializer, ReferenceResolver};
pub use errors::{CodecError, CodecErrorCode, CodecResult, Severity};
pub use native::{CustomValue, FieldTransform, NativeValue};
pub use serializer::{is_integral, validate_depth, Serializer, MAX_DEPTH};
pub use types::{DocumentRef, FieldMap, GeoPoint, Timestamp};
pub use wire::{
    FunctionValue, PipelineValue, StageValue, WireValue, TYPE_KEY, VECTOR_TYPE, VECTOR_VALUE_KEY,
};
