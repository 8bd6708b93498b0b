//! # Frame Decoding
//!
//! Turns one inbound stream message into zero or more stream elements:
//!
//! - heartbeat: nothing
//! - zero rows: one metadata element
//! - N rows: one element per row
//! - explain stats: one extra element after the rows

use crate::value::{CodecResult, Deserializer, FieldMap, Timestamp, WireValue};

use super::result::PipelineResult;

/// A result document as sent by the server
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireDocument {
    /// Fully qualified resource name, absent for computed rows
    pub name: Option<String>,
    pub fields: FieldMap<WireValue>,
    pub create_time: Option<Timestamp>,
    pub update_time: Option<Timestamp>,
}

/// One response message
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseFrame {
    pub results: Vec<WireDocument>,
    pub transaction: Option<Vec<u8>>,
    pub execution_time: Option<Timestamp>,
    pub explain_stats: Option<WireValue>,
}

/// A message received over the execution stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Keep-alive with no payload
    Heartbeat,
    /// A response batch
    Response(ResponseFrame),
    /// The server ended the call normally
    Finished,
}

/// One decoded unit of the outward sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamElement {
    pub transaction_id: Option<Vec<u8>>,
    pub execution_time: Option<Timestamp>,
    pub explain_stats: Option<WireValue>,
    pub result: Option<PipelineResult>,
}

impl StreamElement {
    /// Returns true if the element carries a row
    pub fn is_row(&self) -> bool {
        self.result.is_some()
    }
}

/// Decode one stream message
pub fn decode_frame(message: &StreamMessage, deserializer: &Deserializer) -> CodecResult<Vec<StreamElement>> {
    let frame = match message {
        StreamMessage::Heartbeat | StreamMessage::Finished => return Ok(Vec::new()),
        StreamMessage::Response(frame) => frame,
    };

    let mut elements = Vec::with_capacity(frame.results.len() + 1);

    if frame.results.is_empty() {
        elements.push(StreamElement {
            transaction_id: frame.transaction.clone(),
            execution_time: frame.execution_time,
            ..Default::default()
        });
    } else {
        for document in &frame.results {
            elements.push(StreamElement {
                transaction_id: frame.transaction.clone(),
                execution_time: frame.execution_time,
                explain_stats: None,
                result: Some(PipelineResult::decode(
                    document,
                    frame.execution_time,
                    deserializer,
                )?),
            });
        }
    }

    if let Some(stats) = &frame.explain_stats {
        elements.push(StreamElement {
            explain_stats: Some(stats.clone()),
            ..Default::default()
        });
    }

    Ok(elements)
}
