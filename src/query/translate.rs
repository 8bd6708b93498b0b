//! # Query Translation
//!
//! Turns a legacy [`Query`] into an equivalent pipeline:
//!
//! 1. source stage
//! 2. one `where` per filter
//! 3. `where` stages for the start and end cursors
//! 4. `sort` on the implicit orderings
//! 5. `offset`, then `limit`
//!
//! A limit-to-last query sorts in reverse, limits, then sorts again in the
//! requested order.

use std::collections::BTreeSet;

use crate::expr::{
    cursor_condition, reverse_orderings, CompileError, CompileResult, CursorPosition, Direction,
    Expression, Ordering, DOCUMENT_ID_FIELD,
};
use crate::filter::compile_filter;
use crate::pipeline::{Pipeline, Stage};

use super::ast::{LimitType, Query, QuerySource};

impl Query {
    /// Explicit orderings extended with the fields the server orders by
    /// implicitly.
    ///
    /// Inequality fields not yet ordered are appended ascending, in field
    /// path order. The document id is always the final tiebreaker, using
    /// the direction of the last explicit ordering.
    pub fn implicit_orderings(&self) -> Vec<Ordering> {
        let mut orderings = self.orderings.clone();
        let tiebreak_direction = self
            .orderings
            .last()
            .map(|o| o.direction)
            .unwrap_or(Direction::Ascending);

        let ordered: BTreeSet<String> = orderings.iter().filter_map(field_path).collect();
        let inequality_fields: BTreeSet<String> = self
            .filters
            .iter()
            .flat_map(|f| f.field_filters())
            .filter(|f| f.operator.is_inequality())
            .map(|f| f.field.clone())
            .filter(|field| field != DOCUMENT_ID_FIELD && !ordered.contains(field))
            .collect();

        for field in inequality_fields {
            orderings.push(Expression::field(field).ascending());
        }

        let has_document_id = orderings
            .iter()
            .any(|o| field_path(o).as_deref() == Some(DOCUMENT_ID_FIELD));
        if !has_document_id {
            orderings.push(Ordering::new(Expression::document_id(), tiebreak_direction));
        }

        orderings
    }

    /// Translate into a pipeline
    pub fn to_pipeline(&self) -> CompileResult<Pipeline> {
        self.validate()?;

        let source = match &self.source {
            QuerySource::Collection(path) => Stage::collection(path),
            QuerySource::CollectionGroup(id) => Stage::collection_group(id.clone()),
        };
        let mut pipeline = Pipeline::from_source(source);

        for filter in &self.filters {
            pipeline = pipeline.filter(compile_filter(filter)?);
        }

        let orderings = self.implicit_orderings();

        if let Some(cursor) = &self.start_at {
            pipeline = pipeline.filter(cursor_condition(cursor, &orderings, CursorPosition::After)?);
        }
        if let Some(cursor) = &self.end_at {
            pipeline = pipeline.filter(cursor_condition(cursor, &orderings, CursorPosition::Before)?);
        }

        match (self.limit_type, self.limit) {
            (LimitType::Last, Some(limit)) => {
                pipeline = pipeline
                    .sort(&reverse_orderings(&orderings))
                    .limit(limit)
                    .sort(&orderings);
            }
            _ => {
                pipeline = pipeline.sort(&orderings);
                if let Some(offset) = self.offset {
                    pipeline = pipeline.offset(offset);
                }
                if let Some(limit) = self.limit {
                    pipeline = pipeline.limit(limit);
                }
            }
        }

        Ok(pipeline)
    }

    fn validate(&self) -> CompileResult<()> {
        if matches!(self.limit, Some(limit) if limit < 0) {
            return Err(CompileError::InvalidQuery("limit must not be negative".into()));
        }
        if matches!(self.offset, Some(offset) if offset < 0) {
            return Err(CompileError::InvalidQuery("offset must not be negative".into()));
        }
        if self.limit_type == LimitType::Last && self.limit.is_some() {
            if self.orderings.is_empty() {
                return Err(CompileError::InvalidQuery(
                    "limit to last requires at least one explicit ordering".into(),
                ));
            }
            if self.offset.is_some() {
                return Err(CompileError::InvalidQuery(
                    "limit to last cannot be combined with an offset".into(),
                ));
            }
        }
        Ok(())
    }
}

fn field_path(ordering: &Ordering) -> Option<String> {
    match &ordering.expression {
        Expression::Field(path) => Some(path.clone()),
        _ => None,
    }
}
