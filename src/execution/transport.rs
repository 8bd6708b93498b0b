//! Transport and readiness seams
//!
//! The engine owns no connection state. It opens one server stream per
//! attempt through a [`Transport`] and awaits two [`Readiness`]
//! preconditions before the first attempt.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use super::errors::TransportError;
use super::frame::StreamMessage;
use super::request::ExecuteRequest;

/// Inbound frames of one streaming call.
///
/// Ending without [`StreamMessage::Finished`] means the transport dropped
/// the call silently.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<StreamMessage, TransportError>> + Send>>;

/// Opens server-streaming calls
pub trait Transport: Send + Sync {
    fn open_server_stream<'a>(
        &'a self,
        method: &'a str,
        request: &'a ExecuteRequest,
        request_tag: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FrameStream, TransportError>> + Send + 'a>>;
}

/// Asynchronous preconditions awaited before the first network call
pub trait Readiness: Send + Sync {
    /// Client initialization
    fn client_ready(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;

    /// Lazily loaded response-decoder metadata
    fn decoder_ready(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;
}

/// Preconditions that are always satisfied
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl Readiness for AlwaysReady {
    fn client_ready(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn decoder_ready(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
