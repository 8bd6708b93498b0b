//! Typed result records

use crate::value::{CodecResult, Deserializer, DocumentRef, FieldMap, NativeValue, Timestamp, WireValue};

use super::frame::{StreamElement, WireDocument};

/// One result row
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// Source document, when the row maps to one
    pub reference: Option<DocumentRef>,
    pub create_time: Option<Timestamp>,
    pub update_time: Option<Timestamp>,
    /// Execution time of the frame that carried this row
    pub execution_time: Option<Timestamp>,
    /// Decoded fields
    pub data: FieldMap<NativeValue>,
}

impl PipelineResult {
    /// Decode a wire document
    pub fn decode(
        document: &WireDocument,
        execution_time: Option<Timestamp>,
        deserializer: &Deserializer,
    ) -> CodecResult<Self> {
        let reference = document
            .name
            .as_deref()
            .map(|name| deserializer.resolve_reference(name))
            .transpose()?;

        Ok(Self {
            reference,
            create_time: document.create_time,
            update_time: document.update_time,
            execution_time,
            data: deserializer.decode_fields(&document.fields)?,
        })
    }

    /// Document id, when the row maps to a document
    pub fn id(&self) -> Option<&str> {
        self.reference.as_ref().map(DocumentRef::id)
    }

    /// Field value at a top-level key
    pub fn get(&self, field: &str) -> Option<&NativeValue> {
        self.data.get(field)
    }
}

/// Everything one execution produced
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineResponse {
    pub results: Vec<PipelineResult>,
    /// Last transaction id reported by the server
    pub transaction: Option<Vec<u8>>,
    /// Last execution time reported by the server
    pub execution_time: Option<Timestamp>,
    pub explain_stats: Option<WireValue>,
}

impl PipelineResponse {
    /// Fold one element into the response
    pub fn push(&mut self, element: StreamElement) {
        if element.transaction_id.is_some() {
            self.transaction = element.transaction_id;
        }
        if element.execution_time.is_some() {
            self.execution_time = element.execution_time;
        }
        if element.explain_stats.is_some() {
            self.explain_stats = element.explain_stats;
        }
        if let Some(result) = element.result {
            self.results.push(result);
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl FromIterator<StreamElement> for PipelineResponse {
    fn from_iter<I: IntoIterator<Item = StreamElement>>(iter: I) -> Self {
        let mut response = PipelineResponse::default();
        for element in iter {
            response.push(element);
        }
        response
    }
}
