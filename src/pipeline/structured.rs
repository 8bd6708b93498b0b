//! Structured pipeline assembly
//!
//! The unit actually transmitted: a serialized pipeline plus its compiled
//! options.

use crate::value::{CodecResult, FieldMap, PipelineValue, WireValue};

use super::options::{KnownOptionsSchema, OptionsCompiler, PipelineOptions};
use super::stage::Pipeline;

/// Known options accepted by the execute call
pub fn execute_options_schema() -> KnownOptionsSchema {
    KnownOptionsSchema::new()
        .option("indexMode", "index_mode")
        .nested(
            "explainOptions",
            "explain_options",
            KnownOptionsSchema::new()
                .option("mode", "mode")
                .option("outputFormat", "output_format"),
        )
}

/// A pipeline with its compiled options
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPipeline {
    pub pipeline: PipelineValue,
    pub options: FieldMap<WireValue>,
}

impl StructuredPipeline {
    pub fn build(
        compiler: &OptionsCompiler,
        schema: &KnownOptionsSchema,
        pipeline: &Pipeline,
        options: &PipelineOptions,
    ) -> CodecResult<Self> {
        Ok(Self {
            pipeline: pipeline.to_wire(),
            options: compiler.compile(schema, &options.known, &options.overrides)?,
        })
    }

    /// Wire form: `{pipeline, options}`
    pub fn to_wire(&self) -> WireValue {
        let mut fields = FieldMap::with_capacity(2);
        fields.insert("pipeline", WireValue::Pipeline(self.pipeline.clone()));
        fields.insert("options", WireValue::Map(self.options.clone()));
        WireValue::Map(fields)
    }
}
