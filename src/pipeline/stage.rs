//! Pipeline stages
//!
//! A pipeline is an ordered list of named stages. Stage arguments are
//! expressions; the pipeline is serialized as one opaque wire value.

use crate::expr::{BooleanExpr, Expression, Ordering};
use crate::value::{FieldMap, PipelineValue, StageValue, WireValue};

/// Stage names understood by the server
pub mod stages {
    pub const COLLECTION: &str = "collection";
    pub const COLLECTION_GROUP: &str = "collection_group";
    pub const WHERE: &str = "where";
    pub const SORT: &str = "sort";
    pub const OFFSET: &str = "offset";
    pub const LIMIT: &str = "limit";
}

/// One named stage
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    name: String,
    args: Vec<Expression>,
    options: FieldMap<WireValue>,
}

impl Stage {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            options: FieldMap::new(),
        }
    }

    /// Attach a stage-level option
    pub fn with_option(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.options.insert(name, value);
        self
    }

    /// Source stage reading one collection
    pub fn collection(path: &str) -> Self {
        let path = format!("/{}", path.trim_start_matches('/'));
        Self::new(
            stages::COLLECTION,
            vec![Expression::Constant(WireValue::Reference(path))],
        )
    }

    /// Source stage reading every collection with the given id
    pub fn collection_group(collection_id: impl Into<String>) -> Self {
        Self::new(
            stages::COLLECTION_GROUP,
            vec![
                Expression::Constant(WireValue::Reference(String::new())),
                Expression::constant(collection_id.into()),
            ],
        )
    }

    pub fn filter(condition: BooleanExpr) -> Self {
        Self::new(stages::WHERE, vec![condition.into()])
    }

    pub fn sort(orderings: &[Ordering]) -> Self {
        Self::new(
            stages::SORT,
            orderings
                .iter()
                .map(|o| Expression::Constant(o.to_wire()))
                .collect(),
        )
    }

    pub fn offset(offset: i64) -> Self {
        Self::new(stages::OFFSET, vec![Expression::constant(offset)])
    }

    pub fn limit(limit: i64) -> Self {
        Self::new(stages::LIMIT, vec![Expression::constant(limit)])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub fn to_wire(&self) -> StageValue {
        StageValue {
            name: self.name.clone(),
            args: self.args.iter().map(Expression::to_wire).collect(),
            options: self.options.clone(),
        }
    }
}

/// An ordered list of stages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline starting at the given source stage
    pub fn from_source(source: Stage) -> Self {
        Self {
            stages: vec![source],
        }
    }

    pub fn add_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn filter(self, condition: BooleanExpr) -> Self {
        self.add_stage(Stage::filter(condition))
    }

    pub fn sort(self, orderings: &[Ordering]) -> Self {
        self.add_stage(Stage::sort(orderings))
    }

    pub fn offset(self, offset: i64) -> Self {
        self.add_stage(Stage::offset(offset))
    }

    pub fn limit(self, limit: i64) -> Self {
        self.add_stage(Stage::limit(limit))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn to_wire(&self) -> PipelineValue {
        PipelineValue {
            stages: self.stages.iter().map(Stage::to_wire).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_preserves_stage_order() {
        let pipeline = Pipeline::from_source(Stage::collection("users"))
            .filter(Expression::field("age").greater_than(Expression::constant(18)))
            .sort(&[Expression::field("age").ascending()])
            .limit(10);

        let names: Vec<&str> = pipeline.stages().iter().map(Stage::name).collect();
        assert_eq!(names, vec!["collection", "where", "sort", "limit"]);
    }

    #[test]
    fn test_collection_stage_wire_form() {
        let wire = Stage::collection("users").to_wire();
        assert_eq!(wire.name, "collection");
        assert_eq!(wire.args, vec![WireValue::Reference("/users".into())]);
        assert!(wire.options.is_empty());
    }

    #[test]
    fn test_sort_stage_serializes_orderings() {
        let wire = Stage::sort(&[Expression::field("a").descending()]).to_wire();
        let ordering = wire.args[0].as_map().unwrap();
        assert_eq!(ordering.get("direction"), Some(&WireValue::string("descending")));
    }

    #[test]
    fn test_where_stage_wraps_boolean_function() {
        let wire = Stage::filter(Expression::field("a").exists()).to_wire();
        assert_eq!(wire.name, "where");
        assert!(matches!(&wire.args[0], WireValue::Function(f) if f.name == "exists"));
    }
}
