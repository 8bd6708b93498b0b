//! Legacy query structure
//!
//! Collection source, filters, explicit orderings, cursors and limits, as
//! built by the classic query API.

use crate::expr::{Cursor, Direction, Expression, Ordering};
use crate::filter::Filter;
use crate::value::WireValue;

/// Where documents are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// One collection, by slash-separated path
    Collection(String),
    /// Every collection with this id, at any depth
    CollectionGroup(String),
}

/// Which end of the ordered results a limit keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    First,
    Last,
}

/// A legacy query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Document source
    pub source: QuerySource,
    /// Filters, all combined with AND
    pub filters: Vec<Filter>,
    /// Explicit orderings, in priority order
    pub orderings: Vec<Ordering>,
    /// Lower bound in ordering space
    pub start_at: Option<Cursor>,
    /// Upper bound in ordering space
    pub end_at: Option<Cursor>,
    pub limit: Option<i64>,
    pub limit_type: LimitType,
    pub offset: Option<i64>,
}

impl Query {
    fn with_source(source: QuerySource) -> Self {
        Self {
            source,
            filters: Vec::new(),
            orderings: Vec::new(),
            start_at: None,
            end_at: None,
            limit: None,
            limit_type: LimitType::First,
            offset: None,
        }
    }

    /// Query over one collection
    pub fn collection(path: impl Into<String>) -> Self {
        Self::with_source(QuerySource::Collection(path.into()))
    }

    /// Query over all collections sharing an id
    pub fn collection_group(collection_id: impl Into<String>) -> Self {
        Self::with_source(QuerySource::CollectionGroup(collection_id.into()))
    }

    /// Adds a filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds an explicit ordering on a field
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orderings
            .push(Ordering::new(Expression::field(field), direction));
        self
    }

    /// Start at the cursor row, inclusive
    pub fn start_at(mut self, values: Vec<WireValue>) -> Self {
        self.start_at = Some(Cursor::inclusive(values));
        self
    }

    /// Start just after the cursor row
    pub fn start_after(mut self, values: Vec<WireValue>) -> Self {
        self.start_at = Some(Cursor::exclusive(values));
        self
    }

    /// End at the cursor row, inclusive
    pub fn end_at(mut self, values: Vec<WireValue>) -> Self {
        self.end_at = Some(Cursor::inclusive(values));
        self
    }

    /// End just before the cursor row
    pub fn end_before(mut self, values: Vec<WireValue>) -> Self {
        self.end_at = Some(Cursor::exclusive(values));
        self
    }

    /// Keep the first `limit` rows
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self.limit_type = LimitType::First;
        self
    }

    /// Keep the last `limit` rows
    pub fn with_limit_to_last(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self.limit_type = LimitType::Last;
        self
    }

    /// Skip the first `offset` rows
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}
