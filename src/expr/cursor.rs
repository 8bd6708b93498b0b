//! # Cursor Conditions
//!
//! Translates a pagination cursor into the boolean condition "this row
//! sorts after (or before) the cursor row", expressed as the usual
//! lexicographic multi-column comparison.

use crate::value::WireValue;

use super::errors::{CompileError, CompileResult};
use super::expression::{and, or, BooleanExpr, Expression};
use super::ordering::{Direction, Ordering};

/// Which side of the cursor the rows must fall on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    /// Rows sorting before the cursor (end bound)
    Before,
    /// Rows sorting after the cursor (start bound)
    After,
}

/// A pagination boundary: one value per ordering, positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    values: Vec<WireValue>,
    inclusive: bool,
}

impl Cursor {
    /// `inclusive` keeps the cursor row itself in the result
    pub fn new(values: Vec<WireValue>, inclusive: bool) -> Self {
        Self { values, inclusive }
    }

    pub fn inclusive(values: Vec<WireValue>) -> Self {
        Self::new(values, true)
    }

    pub fn exclusive(values: Vec<WireValue>) -> Self {
        Self::new(values, false)
    }

    pub fn values(&self) -> &[WireValue] {
        &self.values
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }
}

/// Build the boolean condition for one side of a cursor.
///
/// The cursor may carry fewer values than there are orderings; only the
/// leading orderings are compared. The last compared ordering is assumed
/// to break ties.
pub fn cursor_condition(
    cursor: &Cursor,
    orderings: &[Ordering],
    position: CursorPosition,
) -> CompileResult<BooleanExpr> {
    if orderings.is_empty() {
        return Err(CompileError::EmptyOrderings);
    }
    let size = cursor.values.len();
    if size == 0 {
        return Err(CompileError::EmptyCursor);
    }
    if size > orderings.len() {
        return Err(CompileError::CursorTooLong {
            values: size,
            orderings: orderings.len(),
        });
    }

    let last = size - 1;
    let field = &orderings[last].expression;
    let value = Expression::Constant(cursor.values[last].clone());

    let mut condition = strict_comparison(&orderings[last], value.clone(), position);
    if cursor.inclusive {
        condition = or(vec![condition, field.equal(value)]);
    }

    for i in (0..last).rev() {
        let field = &orderings[i].expression;
        let value = Expression::Constant(cursor.values[i].clone());
        condition = or(vec![
            strict_comparison(&orderings[i], value.clone(), position),
            and(vec![field.equal(value), condition]),
        ]);
    }

    Ok(condition)
}

/// `field > value` or `field < value`, depending on side and direction
fn strict_comparison(ordering: &Ordering, value: Expression, position: CursorPosition) -> BooleanExpr {
    match (position, ordering.direction) {
        (CursorPosition::After, Direction::Ascending)
        | (CursorPosition::Before, Direction::Descending) => ordering.expression.greater_than(value),
        (CursorPosition::After, Direction::Descending)
        | (CursorPosition::Before, Direction::Ascending) => ordering.expression.less_than(value),
    }
}
