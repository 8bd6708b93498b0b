//! # Filter Compiler
//!
//! Translates a legacy filter tree into a boolean expression. Every field
//! filter is guarded by an existence check on its field.

use crate::expr::{and, or, BooleanExpr, CompileError, CompileResult, Expression};
use crate::value::WireValue;

use super::ast::{CompositeFilter, CompositeOperator, FieldFilter, FieldOperator, Filter};

/// Compile a filter tree into one boolean expression
pub fn compile_filter(filter: &Filter) -> CompileResult<BooleanExpr> {
    match filter {
        Filter::Field(f) => compile_field_filter(f),
        Filter::Composite(c) => compile_composite(c),
    }
}

fn compile_field_filter(filter: &FieldFilter) -> CompileResult<BooleanExpr> {
    let field = Expression::field(filter.field.clone());
    let value = &filter.value;

    let condition = match filter.operator {
        FieldOperator::Equal if value.is_nan() => field.is_nan(),
        FieldOperator::NotEqual if value.is_nan() => field.is_not_nan(),
        FieldOperator::Equal if value.is_null() => field.is_null(),
        FieldOperator::NotEqual if value.is_null() => field.is_not_null(),
        FieldOperator::Equal => field.equal(value.clone()),
        FieldOperator::NotEqual => field.not_equal(value.clone()),
        FieldOperator::LessThan => field.less_than(value.clone()),
        FieldOperator::LessThanOrEqual => field.less_than_or_equal(value.clone()),
        FieldOperator::GreaterThan => field.greater_than(value.clone()),
        FieldOperator::GreaterThanOrEqual => field.greater_than_or_equal(value.clone()),
        FieldOperator::ArrayContains => field.array_contains(value.clone()),
        FieldOperator::In => field.equal_any(list_operand(filter)?),
        FieldOperator::ArrayContainsAny => field.array_contains_any(list_operand(filter)?),
        FieldOperator::NotIn => field.not_equal_any(list_operand(filter)?),
        FieldOperator::Unspecified => {
            return Err(CompileError::UnsupportedOperator(
                filter.operator.as_str().to_string(),
            ))
        }
    };

    Ok(and(vec![field.exists(), condition]))
}

/// Elements of an array operand, as constants
fn list_operand(filter: &FieldFilter) -> CompileResult<Vec<Expression>> {
    match &filter.value {
        WireValue::Array(items) => Ok(items.iter().cloned().map(Expression::Constant).collect()),
        other => Err(CompileError::InvalidFilterValue {
            field: filter.field.clone(),
            operator: filter.operator.as_str().to_string(),
            reason: format!("expected an array, got {}", other.kind()),
        }),
    }
}

fn compile_composite(filter: &CompositeFilter) -> CompileResult<BooleanExpr> {
    if filter.filters.is_empty() {
        return Err(CompileError::EmptyComposite);
    }

    let children = filter
        .filters
        .iter()
        .map(compile_filter)
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(match filter.operator {
        CompositeOperator::And => and(children),
        CompositeOperator::Or => or(children),
    })
}
