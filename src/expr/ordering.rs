//! Orderings over expressions

use crate::value::{FieldMap, WireValue};

use super::expression::Expression;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }

    pub fn reversed(self) -> Direction {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub expression: Expression,
    pub direction: Direction,
}

impl Ordering {
    pub fn new(expression: Expression, direction: Direction) -> Self {
        Self {
            expression,
            direction,
        }
    }

    pub fn ascending(expression: Expression) -> Self {
        Self::new(expression, Direction::Ascending)
    }

    pub fn descending(expression: Expression) -> Self {
        Self::new(expression, Direction::Descending)
    }

    /// Same expression, opposite direction
    pub fn reversed(&self) -> Self {
        Self::new(self.expression.clone(), self.direction.reversed())
    }

    /// Wire form: `{expression, direction}`
    pub fn to_wire(&self) -> WireValue {
        let mut fields = FieldMap::with_capacity(2);
        fields.insert("direction", WireValue::string(self.direction.as_str()));
        fields.insert("expression", self.expression.to_wire());
        WireValue::Map(fields)
    }
}

/// Flip every direction.
///
/// A "last N" query runs as "first N" of the reversed order; the caller
/// re-sorts the results in the original order.
pub fn reverse_orderings(orderings: &[Ordering]) -> Vec<Ordering> {
    orderings.iter().map(Ordering::reversed).collect()
}
