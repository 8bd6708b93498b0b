//! # Filter Tree
//!
//! Legacy filter representation: field filters combined by AND/OR
//! composites. Values are held already wire-encoded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::{CodecResult, NativeValue, Serializer, WireValue};

/// Field filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOperator {
    /// Placeholder for an unset operator
    #[serde(rename = "unspecified")]
    Unspecified,

    #[serde(rename = "<")]
    LessThan,

    #[serde(rename = "<=")]
    LessThanOrEqual,

    #[serde(rename = ">")]
    GreaterThan,

    #[serde(rename = ">=")]
    GreaterThanOrEqual,

    #[serde(rename = "==")]
    Equal,

    #[serde(rename = "!=")]
    NotEqual,

    #[serde(rename = "array-contains")]
    ArrayContains,

    /// Value in list
    #[serde(rename = "in")]
    In,

    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,

    /// Value not in list
    #[serde(rename = "not-in")]
    NotIn,
}

impl FieldOperator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOperator::Unspecified => "unspecified",
            FieldOperator::LessThan => "<",
            FieldOperator::LessThanOrEqual => "<=",
            FieldOperator::GreaterThan => ">",
            FieldOperator::GreaterThanOrEqual => ">=",
            FieldOperator::Equal => "==",
            FieldOperator::NotEqual => "!=",
            FieldOperator::ArrayContains => "array-contains",
            FieldOperator::In => "in",
            FieldOperator::ArrayContainsAny => "array-contains-any",
            FieldOperator::NotIn => "not-in",
        }
    }

    /// Returns true for operators that need an implicit ordering on the field
    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            FieldOperator::LessThan
                | FieldOperator::LessThanOrEqual
                | FieldOperator::GreaterThan
                | FieldOperator::GreaterThanOrEqual
                | FieldOperator::NotEqual
                | FieldOperator::NotIn
        )
    }

    /// Returns true if the operator takes a list of values
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FieldOperator::In | FieldOperator::ArrayContainsAny | FieldOperator::NotIn
        )
    }
}

impl fmt::Display for FieldOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(FieldOperator::LessThan),
            "<=" => Ok(FieldOperator::LessThanOrEqual),
            ">" => Ok(FieldOperator::GreaterThan),
            ">=" => Ok(FieldOperator::GreaterThanOrEqual),
            "==" => Ok(FieldOperator::Equal),
            "!=" => Ok(FieldOperator::NotEqual),
            "array-contains" => Ok(FieldOperator::ArrayContains),
            "in" => Ok(FieldOperator::In),
            "array-contains-any" => Ok(FieldOperator::ArrayContainsAny),
            "not-in" => Ok(FieldOperator::NotIn),
            other => Err(format!("Unknown filter operator: {}", other)),
        }
    }
}

/// Composite combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeOperator {
    And,
    Or,
}

/// A single field comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Dotted field path
    pub field: String,
    /// Comparison operator
    pub operator: FieldOperator,
    /// Wire-encoded operand
    pub value: WireValue,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, operator: FieldOperator, value: impl Into<WireValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build a filter from a native operand, encoding it first.
    ///
    /// An operand that encodes to "no value" is compared as `Null`.
    pub fn encoded(
        serializer: &Serializer,
        field: impl Into<String>,
        operator: FieldOperator,
        value: &NativeValue,
    ) -> CodecResult<Self> {
        let wire = serializer.encode_argument("value", value)?;
        Ok(Self::new(field, operator, wire.unwrap_or(WireValue::Null)))
    }
}

/// A group of filters joined by one operator
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFilter {
    pub operator: CompositeOperator,
    pub filters: Vec<Filter>,
}

/// A node of the filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Field(FieldFilter),
    Composite(CompositeFilter),
}

impl Filter {
    /// Create an equality filter
    pub fn equal(field: impl Into<String>, value: impl Into<WireValue>) -> Self {
        Filter::Field(FieldFilter::new(field, FieldOperator::Equal, value))
    }

    /// Create a not-equal filter
    pub fn not_equal(field: impl Into<String>, value: impl Into<WireValue>) -> Self {
        Filter::Field(FieldFilter::new(field, FieldOperator::NotEqual, value))
    }

    /// Create a less than filter
    pub fn less_than(field: impl Into<String>, value: impl Into<WireValue>) -> Self {
        Filter::Field(FieldFilter::new(field, FieldOperator::LessThan, value))
    }

    /// Create a greater than filter
    pub fn greater_than(field: impl Into<String>, value: impl Into<WireValue>) -> Self {
        Filter::Field(FieldFilter::new(field, FieldOperator::GreaterThan, value))
    }

    /// Create an "in list" filter
    pub fn in_list(field: impl Into<String>, values: Vec<WireValue>) -> Self {
        Filter::Field(FieldFilter::new(
            field,
            FieldOperator::In,
            WireValue::Array(values),
        ))
    }

    /// Create a filter with an arbitrary operator
    pub fn field(field: impl Into<String>, operator: FieldOperator, value: impl Into<WireValue>) -> Self {
        Filter::Field(FieldFilter::new(field, operator, value))
    }

    /// Conjunction of filters
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::Composite(CompositeFilter {
            operator: CompositeOperator::And,
            filters,
        })
    }

    /// Disjunction of filters
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Composite(CompositeFilter {
            operator: CompositeOperator::Or,
            filters,
        })
    }

    /// All field filters in the tree, depth first
    pub fn field_filters(&self) -> Vec<&FieldFilter> {
        let mut out = Vec::new();
        self.collect_field_filters(&mut out);
        out
    }

    fn collect_field_filters<'a>(&'a self, out: &mut Vec<&'a FieldFilter>) {
        match self {
            Filter::Field(f) => out.push(f),
            Filter::Composite(c) => {
                for child in &c.filters {
                    child.collect_field_filters(out);
                }
            }
        }
    }
}

impl From<FieldFilter> for Filter {
    fn from(value: FieldFilter) -> Self {
        Filter::Field(value)
    }
}
