//! # Expression Model
//!
//! Immutable expression trees built bottom-up and serialized to wire
//! values. The client never evaluates them.

use crate::value::{CodecResult, FunctionValue, NativeValue, Serializer, WireValue};

use super::ordering::Ordering;

/// Server-side function names
pub mod functions {
    pub const EQUAL: &str = "equal";
    pub const NOT_EQUAL: &str = "not_equal";
    pub const LESS_THAN: &str = "less_than";
    pub const LESS_THAN_OR_EQUAL: &str = "less_than_or_equal";
    pub const GREATER_THAN: &str = "greater_than";
    pub const GREATER_THAN_OR_EQUAL: &str = "greater_than_or_equal";
    pub const EXISTS: &str = "exists";
    pub const IS_NAN: &str = "is_nan";
    pub const IS_NOT_NAN: &str = "is_not_nan";
    pub const IS_NULL: &str = "is_null";
    pub const IS_NOT_NULL: &str = "is_not_null";
    pub const EQUAL_ANY: &str = "equal_any";
    pub const NOT_EQUAL_ANY: &str = "not_equal_any";
    pub const ARRAY_CONTAINS: &str = "array_contains";
    pub const ARRAY_CONTAINS_ANY: &str = "array_contains_any";
    pub const AND: &str = "and";
    pub const OR: &str = "or";
    pub const NOT: &str = "not";
}

/// Field path naming a document's identity
pub const DOCUMENT_ID_FIELD: &str = "__name__";

/// A function applied to argument expressions
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    name: String,
    args: Vec<Expression>,
}

impl FunctionExpr {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub fn to_wire(&self) -> WireValue {
        WireValue::Function(FunctionValue::new(
            self.name.clone(),
            self.args.iter().map(Expression::to_wire).collect(),
        ))
    }
}

/// A function call whose result the server interprets as a boolean
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpr(FunctionExpr);

impl BooleanExpr {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self(FunctionExpr::new(name, args))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn args(&self) -> &[Expression] {
        self.0.args()
    }

    pub fn to_wire(&self) -> WireValue {
        self.0.to_wire()
    }

    /// Negate this condition
    pub fn not(self) -> BooleanExpr {
        BooleanExpr::new(functions::NOT, vec![self.into()])
    }
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Reference to a document field by dotted path
    Field(String),
    /// A literal wire value
    Constant(WireValue),
    /// A list of expressions, serialized as a wire array
    Array(Vec<Expression>),
    /// A function producing any value
    Function(FunctionExpr),
    /// A function producing a boolean
    Boolean(BooleanExpr),
}

impl Expression {
    pub fn field(path: impl Into<String>) -> Self {
        Expression::Field(path.into())
    }

    /// The document identity field
    pub fn document_id() -> Self {
        Expression::Field(DOCUMENT_ID_FIELD.to_string())
    }

    pub fn constant(value: impl Into<WireValue>) -> Self {
        Expression::Constant(value.into())
    }

    /// Encode a native value as a constant.
    ///
    /// A value that encodes to "no value" becomes a `Null` constant.
    pub fn encoded(serializer: &Serializer, value: &NativeValue) -> CodecResult<Self> {
        let wire = serializer.encode_argument("constant", value)?;
        Ok(Expression::Constant(wire.unwrap_or(WireValue::Null)))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function(FunctionExpr::new(name, args))
    }

    pub fn array(items: Vec<Expression>) -> Self {
        Expression::Array(items)
    }

    pub fn to_wire(&self) -> WireValue {
        match self {
            Expression::Field(path) => WireValue::FieldReference(path.clone()),
            Expression::Constant(value) => value.clone(),
            Expression::Array(items) => {
                WireValue::Array(items.iter().map(Expression::to_wire).collect())
            }
            Expression::Function(f) => f.to_wire(),
            Expression::Boolean(b) => b.to_wire(),
        }
    }

    fn binary(&self, name: &str, other: impl Into<Expression>) -> BooleanExpr {
        BooleanExpr::new(name, vec![self.clone(), other.into()])
    }

    fn unary(&self, name: &str) -> BooleanExpr {
        BooleanExpr::new(name, vec![self.clone()])
    }

    pub fn equal(&self, other: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::EQUAL, other)
    }

    pub fn not_equal(&self, other: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::NOT_EQUAL, other)
    }

    pub fn less_than(&self, other: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::LESS_THAN, other)
    }

    pub fn less_than_or_equal(&self, other: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::LESS_THAN_OR_EQUAL, other)
    }

    pub fn greater_than(&self, other: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::GREATER_THAN, other)
    }

    pub fn greater_than_or_equal(&self, other: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::GREATER_THAN_OR_EQUAL, other)
    }

    pub fn exists(&self) -> BooleanExpr {
        self.unary(functions::EXISTS)
    }

    pub fn is_nan(&self) -> BooleanExpr {
        self.unary(functions::IS_NAN)
    }

    pub fn is_not_nan(&self) -> BooleanExpr {
        self.unary(functions::IS_NOT_NAN)
    }

    pub fn is_null(&self) -> BooleanExpr {
        self.unary(functions::IS_NULL)
    }

    pub fn is_not_null(&self) -> BooleanExpr {
        self.unary(functions::IS_NOT_NULL)
    }

    pub fn equal_any(&self, values: Vec<Expression>) -> BooleanExpr {
        self.binary(functions::EQUAL_ANY, Expression::Array(values))
    }

    pub fn not_equal_any(&self, values: Vec<Expression>) -> BooleanExpr {
        self.binary(functions::NOT_EQUAL_ANY, Expression::Array(values))
    }

    pub fn array_contains(&self, value: impl Into<Expression>) -> BooleanExpr {
        self.binary(functions::ARRAY_CONTAINS, value)
    }

    pub fn array_contains_any(&self, values: Vec<Expression>) -> BooleanExpr {
        self.binary(functions::ARRAY_CONTAINS_ANY, Expression::Array(values))
    }

    pub fn ascending(self) -> Ordering {
        Ordering::ascending(self)
    }

    pub fn descending(self) -> Ordering {
        Ordering::descending(self)
    }
}

impl From<BooleanExpr> for Expression {
    fn from(value: BooleanExpr) -> Self {
        Expression::Boolean(value)
    }
}

impl From<FunctionExpr> for Expression {
    fn from(value: FunctionExpr) -> Self {
        Expression::Function(value)
    }
}

impl From<WireValue> for Expression {
    fn from(value: WireValue) -> Self {
        Expression::Constant(value)
    }
}

/// Conjunction of all conditions. A single condition is returned as is.
pub fn and(conditions: Vec<BooleanExpr>) -> BooleanExpr {
    combine(functions::AND, conditions)
}

/// Disjunction of all conditions. A single condition is returned as is.
pub fn or(conditions: Vec<BooleanExpr>) -> BooleanExpr {
    combine(functions::OR, conditions)
}

fn combine(name: &str, mut conditions: Vec<BooleanExpr>) -> BooleanExpr {
    if conditions.len() == 1 {
        if let Some(only) = conditions.pop() {
            return only;
        }
    }
    BooleanExpr::new(name, conditions.into_iter().map(Expression::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldTransform;

    #[test]
    fn test_field_serializes_as_field_reference() {
        assert_eq!(
            Expression::field("a.b").to_wire(),
            WireValue::FieldReference("a.b".into())
        );
    }

    #[test]
    fn test_comparison_serializes_as_function_call() {
        let cond = Expression::field("age").greater_than(Expression::constant(18));
        assert_eq!(
            cond.to_wire(),
            WireValue::Function(FunctionValue::new(
                "greater_than",
                vec![
                    WireValue::FieldReference("age".into()),
                    WireValue::Integer(18)
                ]
            ))
        );
    }

    #[test]
    fn test_equal_any_wraps_values_in_array() {
        let cond = Expression::field("x").equal_any(vec![
            Expression::constant(1),
            Expression::constant(2),
        ]);
        assert_eq!(cond.name(), "equal_any");
        assert_eq!(
            cond.args()[1].to_wire(),
            WireValue::Array(vec![WireValue::Integer(1), WireValue::Integer(2)])
        );
    }

    #[test]
    fn test_and_is_n_ary() {
        let a = Expression::field("a").exists();
        let b = Expression::field("b").exists();
        let c = Expression::field("c").exists();
        let all = and(vec![a, b, c]);
        assert_eq!(all.name(), "and");
        assert_eq!(all.args().len(), 3);
    }

    #[test]
    fn test_single_condition_not_wrapped() {
        let a = Expression::field("a").exists();
        assert_eq!(or(vec![a.clone()]), a);
    }

    #[test]
    fn test_not() {
        let cond = Expression::field("a").is_null().not();
        assert_eq!(cond.name(), "not");
        assert_eq!(cond.args().len(), 1);
    }

    #[test]
    fn test_encoded_constant() {
        let serializer = Serializer::new("projects/p/databases/d");
        let expr = Expression::encoded(&serializer, &NativeValue::Number(4.0)).unwrap();
        assert_eq!(expr, Expression::Constant(WireValue::Integer(4)));

        let expr = Expression::encoded(
            &serializer,
            &NativeValue::Sentinel(FieldTransform::Delete),
        )
        .unwrap();
        assert_eq!(expr, Expression::Constant(WireValue::Null));
    }
}
