//! # Execution Engine
//!
//! Runs a pipeline as a resumable server stream.
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Completed
//!                          |  ^
//!                          v  |
//!                      Reconnecting
//!                          |
//!                          v
//!                        Failed
//! ```
//!
//! A background task drives the state machine and pushes decoded elements
//! into a bounded channel. Both public shapes (collect into a response,
//! stream rows) read from that one channel, so a pipeline is never
//! executed twice. Dropping the outward stream closes the channel, which
//! tears down the inbound transport stream.

use std::future::Future;
use std::panic::Location;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures_util::{future, stream, Stream, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::observability::{Event, Logger};
use crate::pipeline::{execute_options_schema, KnownOptionsSchema, OptionsCompiler, Pipeline, StructuredPipeline};
use crate::query::Query;
use crate::value::{CodecError, Deserializer, ReferenceResolver, Serializer};

use super::config::EngineConfig;
use super::errors::{ExecutionError, ExecutionResult, TransportError};
use super::frame::{decode_frame, StreamElement, StreamMessage};
use super::request::{ExecuteOptions, ExecuteRequest};
use super::result::{PipelineResponse, PipelineResult};
use super::retry::RetryPolicy;
use super::transport::{AlwaysReady, Readiness, Transport};

/// Outward sequence of decoded elements
pub type ElementStream = Pin<Box<dyn Stream<Item = ExecutionResult<StreamElement>> + Send>>;

type ElementSender = mpsc::Sender<ExecutionResult<StreamElement>>;

/// Executes pipelines over a [`Transport`]
pub struct ExecutionEngine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    readiness: Arc<dyn Readiness>,
    retry_policy: Arc<RetryPolicy>,
    serializer: Serializer,
    compiler: OptionsCompiler,
    schema: KnownOptionsSchema,
    deserializer: Deserializer,
    logger: Logger,
}

impl ExecutionEngine {
    /// Engine with no preconditions and the default retry policy
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> ExecutionResult<Self> {
        Self::with_parts(
            config,
            transport,
            Arc::new(AlwaysReady),
            Arc::new(RetryPolicy::default()),
        )
    }

    pub fn with_parts(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        readiness: Arc<dyn Readiness>,
        retry_policy: Arc<RetryPolicy>,
    ) -> ExecutionResult<Self> {
        config.validate()?;

        let serializer = Serializer::new(config.database.clone());
        let deserializer = Deserializer::for_database(&config.database, config.timestamps_as_dates);

        Ok(Self {
            compiler: OptionsCompiler::new(serializer.clone()),
            schema: execute_options_schema(),
            logger: Logger::new(config.log_level),
            serializer,
            deserializer,
            config,
            transport,
            readiness,
            retry_policy,
        })
    }

    /// Replace the reference resolver used when decoding results
    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.deserializer = Deserializer::new(resolver, self.config.timestamps_as_dates);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Serializer bound to this engine's database
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Whether the execute method's retry budget is spent since `start`
    pub fn has_retry_timed_out(&self, start: Instant) -> bool {
        self.retry_policy
            .has_retry_timed_out(&self.config.method_name, start)
    }

    /// Assemble the request sent on every attempt
    pub fn build_request(
        &self,
        pipeline: &Pipeline,
        options: &ExecuteOptions,
    ) -> ExecutionResult<ExecuteRequest> {
        let structured_pipeline = StructuredPipeline::build(
            &self.compiler,
            &self.schema,
            pipeline,
            &options.pipeline_options,
        )?;

        Ok(ExecuteRequest {
            database: self.config.database.clone(),
            structured_pipeline,
            consistency: options.consistency.clone(),
        })
    }

    /// Every decoded element, metadata included.
    ///
    /// Execution starts on first poll. Input errors are yielded as the
    /// first and only item.
    #[track_caller]
    pub fn stream_elements(&self, pipeline: &Pipeline, options: ExecuteOptions) -> ElementStream {
        self.elements_at(pipeline, &options, Location::caller())
    }

    /// Result rows only; metadata-only elements are dropped
    #[track_caller]
    pub fn stream(
        &self,
        pipeline: &Pipeline,
        options: ExecuteOptions,
    ) -> impl Stream<Item = ExecutionResult<PipelineResult>> + Send + 'static {
        self.elements_at(pipeline, &options, Location::caller())
            .filter_map(|item| {
                future::ready(match item {
                    Ok(element) => element.result.map(Ok),
                    Err(error) => Some(Err(error)),
                })
            })
    }

    /// Run to completion and collect everything
    #[track_caller]
    pub fn execute(
        &self,
        pipeline: &Pipeline,
        options: ExecuteOptions,
    ) -> impl Future<Output = ExecutionResult<PipelineResponse>> + Send + 'static {
        collect(self.elements_at(pipeline, &options, Location::caller()))
    }

    /// Translate a legacy query and run it to completion
    #[track_caller]
    pub fn execute_query(
        &self,
        query: &Query,
        options: ExecuteOptions,
    ) -> impl Future<Output = ExecutionResult<PipelineResponse>> + Send + 'static {
        let call_site = Location::caller();
        let elements = match query.to_pipeline() {
            Ok(pipeline) => self.elements_at(&pipeline, &options, call_site),
            Err(error) => launch(Err(error.into()), 1),
        };
        collect(elements)
    }

    fn elements_at(
        &self,
        pipeline: &Pipeline,
        options: &ExecuteOptions,
        call_site: &'static Location<'static>,
    ) -> ElementStream {
        let driver = self.build_request(pipeline, options).map(|request| StreamDriver {
            method: self.config.method_name.clone(),
            request,
            request_tag: request_tag(),
            call_site,
            transport: Arc::clone(&self.transport),
            readiness: Arc::clone(&self.readiness),
            retry_policy: Arc::clone(&self.retry_policy),
            deserializer: self.deserializer.clone(),
            logger: self.logger,
        });
        launch(driver, self.config.stream_buffer)
    }
}

async fn collect(mut elements: ElementStream) -> ExecutionResult<PipelineResponse> {
    let mut response = PipelineResponse::default();
    while let Some(element) = elements.next().await {
        response.push(element?);
    }
    Ok(response)
}

/// Wrap a driver in a lazily started element stream
fn launch(driver: ExecutionResult<StreamDriver>, buffer: usize) -> ElementStream {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let pending = Some((driver, tx));

    Box::pin(stream::unfold((rx, pending), |(mut rx, pending)| async move {
        if let Some((driver, tx)) = pending {
            match driver {
                Ok(driver) => {
                    tokio::spawn(driver.run(tx));
                }
                Err(error) => return Some((Err(error), (rx, None))),
            }
        }
        rx.recv().await.map(|item| (item, (rx, None)))
    }))
}

/// Short random tag correlating the log lines of one execution
fn request_tag() -> String {
    Uuid::new_v4().simple().to_string().chars().take(10).collect()
}

/// How one connection attempt ended
enum Attempt {
    /// Server signalled the end of the call
    Completed,
    /// Stream ended without a terminal signal
    Interrupted,
    Failed(TransportError),
    Undecodable(CodecError),
    /// Consumer went away
    Stopped,
}

/// Per-execution counters reported in logs
#[derive(Default)]
struct StreamStats {
    rows: usize,
    transaction: Option<Vec<u8>>,
}

/// Owns everything one execution needs; runs on its own task
struct StreamDriver {
    method: String,
    request: ExecuteRequest,
    request_tag: String,
    call_site: &'static Location<'static>,
    transport: Arc<dyn Transport>,
    readiness: Arc<dyn Readiness>,
    retry_policy: Arc<RetryPolicy>,
    deserializer: Deserializer,
    logger: Logger,
}

impl StreamDriver {
    async fn run(self, tx: ElementSender) {
        let consistency = self
            .request
            .consistency
            .as_ref()
            .map(|c| c.as_str())
            .unwrap_or("none");
        self.logger.event(
            Event::ExecuteStart,
            &[
                ("consistency", consistency),
                ("method", self.method.as_str()),
                ("request_tag", self.request_tag.as_str()),
            ],
        );

        if let Err(reason) = self.readiness.client_ready().await {
            self.precondition_failed(&tx, ExecutionError::ClientNotReady(reason))
                .await;
            return;
        }
        if let Err(reason) = self.readiness.decoder_ready().await {
            self.precondition_failed(&tx, ExecutionError::DecoderNotReady(reason))
                .await;
            return;
        }

        let mut stats = StreamStats::default();
        let mut attempt: u32 = 1;

        loop {
            let event = if attempt == 1 {
                Event::StreamOpen
            } else {
                Event::StreamReconnect
            };
            let attempt_str = attempt.to_string();
            self.logger.event(
                event,
                &[
                    ("attempt", attempt_str.as_str()),
                    ("method", self.method.as_str()),
                    ("request_tag", self.request_tag.as_str()),
                ],
            );

            match self.run_attempt(&tx, &mut stats).await {
                Attempt::Completed => {
                    let rows = stats.rows.to_string();
                    let transaction = encode_transaction(stats.transaction.as_deref());
                    self.logger.event(
                        Event::StreamComplete,
                        &[
                            ("attempts", attempt_str.as_str()),
                            ("request_tag", self.request_tag.as_str()),
                            ("rows", rows.as_str()),
                            ("transaction", transaction.as_str()),
                        ],
                    );
                    return;
                }
                Attempt::Interrupted => attempt += 1,
                Attempt::Failed(error) => {
                    self.fail(&tx, error).await;
                    return;
                }
                Attempt::Undecodable(error) => {
                    let reason = error.to_string();
                    self.logger.event(
                        Event::StreamFailed,
                        &[("reason", reason.as_str()), ("request_tag", self.request_tag.as_str())],
                    );
                    let _ = tx.send(Err(ExecutionError::Decode(error))).await;
                    return;
                }
                Attempt::Stopped => {
                    self.logger
                        .event(Event::StreamCancelled, &[("request_tag", self.request_tag.as_str())]);
                    return;
                }
            }
        }
    }

    async fn run_attempt(&self, tx: &ElementSender, stats: &mut StreamStats) -> Attempt {
        let opened = tokio::select! {
            _ = tx.closed() => return Attempt::Stopped,
            opened = self.transport.open_server_stream(&self.method, &self.request, &self.request_tag) => opened,
        };
        let mut frames = match opened {
            Ok(frames) => frames,
            Err(error) => return Attempt::Failed(error),
        };

        loop {
            let next = tokio::select! {
                _ = tx.closed() => return Attempt::Stopped,
                next = frames.next() => next,
            };

            let message = match next {
                None => return Attempt::Interrupted,
                Some(Err(error)) => return Attempt::Failed(error),
                Some(Ok(StreamMessage::Finished)) => return Attempt::Completed,
                Some(Ok(message)) => message,
            };

            let elements = match decode_frame(&message, &self.deserializer) {
                Ok(elements) => elements,
                Err(error) => return Attempt::Undecodable(error),
            };

            if let StreamMessage::Response(frame) = &message {
                if frame.transaction.is_some() {
                    stats.transaction = frame.transaction.clone();
                }
                let count = frame.results.len().to_string();
                let transaction = encode_transaction(frame.transaction.as_deref());
                self.logger.event(
                    Event::FrameReceived,
                    &[
                        ("request_tag", self.request_tag.as_str()),
                        ("rows", count.as_str()),
                        ("transaction", transaction.as_str()),
                    ],
                );
            }

            for element in elements {
                if element.is_row() {
                    stats.rows += 1;
                }
                if tx.send(Ok(element)).await.is_err() {
                    return Attempt::Stopped;
                }
            }
        }
    }

    async fn precondition_failed(&self, tx: &ElementSender, error: ExecutionError) {
        let reason = error.to_string();
        self.logger.event(
            Event::PreconditionFailed,
            &[("reason", reason.as_str()), ("request_tag", self.request_tag.as_str())],
        );
        let _ = tx.send(Err(error)).await;
    }

    async fn fail(&self, tx: &ElementSender, error: TransportError) {
        let permanent = self.retry_policy.is_permanent_error(&error, &self.method);
        let permanent_str = permanent.to_string();
        let call_site = self.call_site.to_string();
        self.logger.event(
            Event::StreamFailed,
            &[
                ("call_site", call_site.as_str()),
                ("code", error.code.as_str()),
                ("message", error.message.as_str()),
                ("permanent", permanent_str.as_str()),
                ("request_tag", self.request_tag.as_str()),
            ],
        );
        let _ = tx
            .send(Err(ExecutionError::Transport {
                error,
                permanent,
                call_site: self.call_site,
            }))
            .await;
    }
}

fn encode_transaction(transaction: Option<&[u8]>) -> String {
    transaction.map(|t| STANDARD.encode(t)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::execution::{FrameStream, ResponseFrame, RpcCode, WireDocument};
    use crate::observability::Severity;
    use crate::pipeline::{PipelineOptions, Stage};
    use crate::value::{FieldMap, NativeValue, WireValue};

    type Script = Vec<Result<StreamMessage, TransportError>>;

    /// Replays one script per attempt
    struct ScriptedTransport {
        attempts: Mutex<VecDeque<Script>>,
        opened: AtomicUsize,
        requests: Mutex<Vec<ExecuteRequest>>,
    }

    impl ScriptedTransport {
        fn new(attempts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                attempts: Mutex::new(attempts.into()),
                opened: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for ScriptedTransport {
        fn open_server_stream<'a>(
            &'a self,
            _method: &'a str,
            request: &'a ExecuteRequest,
            _request_tag: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<FrameStream, TransportError>> + Send + 'a>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let script = self.attempts.lock().unwrap().pop_front().unwrap_or_default();
            Box::pin(async move {
                let frames: FrameStream = Box::pin(stream::iter(script));
                Ok(frames)
            })
        }
    }

    fn rows(values: &[i64]) -> StreamMessage {
        StreamMessage::Response(ResponseFrame {
            results: values
                .iter()
                .map(|v| {
                    let mut fields = FieldMap::new();
                    fields.insert("n", WireValue::Integer(*v));
                    WireDocument {
                        fields,
                        ..Default::default()
                    }
                })
                .collect(),
            ..Default::default()
        })
    }

    fn engine(transport: Arc<ScriptedTransport>) -> ExecutionEngine {
        let config = EngineConfig::new("projects/p/databases/d").with_log_level(Severity::Fatal);
        ExecutionEngine::new(config, transport).unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::from_source(Stage::collection("numbers"))
    }

    fn values(response: &PipelineResponse) -> Vec<NativeValue> {
        response
            .results
            .iter()
            .filter_map(|r| r.get("n").cloned())
            .collect()
    }

    #[tokio::test]
    async fn test_execute_collects_rows() {
        let transport = ScriptedTransport::new(vec![vec![
            Ok(rows(&[1, 2])),
            Ok(StreamMessage::Heartbeat),
            Ok(rows(&[3])),
            Ok(StreamMessage::Finished),
        ]]);
        let engine = engine(Arc::clone(&transport));

        let response = engine.execute(&pipeline(), ExecuteOptions::new()).await.unwrap();
        assert_eq!(
            values(&response),
            vec![
                NativeValue::Integer(1),
                NativeValue::Integer(2),
                NativeValue::Integer(3)
            ]
        );
        assert_eq!(transport.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_silent_end_reconnects_with_same_request() {
        let transport = ScriptedTransport::new(vec![
            vec![Ok(rows(&[1]))],
            vec![Ok(rows(&[2])), Ok(StreamMessage::Finished)],
        ]);
        let engine = engine(Arc::clone(&transport));

        let options = ExecuteOptions::new()
            .with_pipeline_options(PipelineOptions::new().with_option("indexMode", "recommended"));
        let response = engine.execute(&pipeline(), options).await.unwrap();

        assert_eq!(response.len(), 2);
        assert_eq!(transport.opened.load(Ordering::SeqCst), 2);
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0], requests[1]);
        assert_eq!(
            requests[0].structured_pipeline.options.get("index_mode"),
            Some(&WireValue::string("recommended"))
        );
    }

    #[tokio::test]
    async fn test_permanent_error_carries_call_site() {
        let transport = ScriptedTransport::new(vec![vec![
            Ok(rows(&[1])),
            Err(TransportError::new(RpcCode::PermissionDenied, "denied")),
        ]]);
        let engine = engine(transport);

        let err = engine
            .execute(&pipeline(), ExecuteOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(err.rpc_code(), Some(RpcCode::PermissionDenied));
        assert_eq!(err.call_site().map(|l| l.file()), Some(file!()));
    }

    #[tokio::test]
    async fn test_retryable_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            vec![Err(TransportError::new(RpcCode::Unavailable, "later"))],
            vec![Ok(StreamMessage::Finished)],
        ]);
        let engine = engine(Arc::clone(&transport));

        let err = engine
            .execute(&pipeline(), ExecuteOptions::new())
            .await
            .unwrap_err();
        assert!(!err.is_permanent());
        assert_eq!(transport.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_yields_rows_only() {
        let transport = ScriptedTransport::new(vec![vec![
            Ok(StreamMessage::Response(ResponseFrame {
                transaction: Some(vec![1, 2, 3]),
                ..Default::default()
            })),
            Ok(rows(&[5])),
            Ok(StreamMessage::Finished),
        ]]);
        let engine = engine(transport);

        let results: Vec<_> = engine
            .stream(&pipeline(), ExecuteOptions::new())
            .collect()
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].as_ref().unwrap().get("n"),
            Some(&NativeValue::Integer(5))
        );
    }

    #[tokio::test]
    async fn test_input_error_before_network() {
        let transport = ScriptedTransport::new(vec![]);
        let engine = engine(Arc::clone(&transport));

        let options = ExecuteOptions::new()
            .with_pipeline_options(PipelineOptions::new().with_override("a..b", None));
        let err = engine.execute(&pipeline(), options).await.unwrap_err();

        assert!(matches!(err, ExecutionError::Codec(_)));
        assert_eq!(transport.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let transport = ScriptedTransport::new(vec![]);
        assert!(ExecutionEngine::new(EngineConfig::new(""), transport).is_err());
    }

    #[test]
    fn test_request_tag_shape() {
        let tag = request_tag();
        assert_eq!(tag.len(), 10);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_encode_transaction() {
        assert_eq!(encode_transaction(Some(&[0xde, 0xad])), "3q0=");
        assert_eq!(encode_transaction(None), "");
    }
}
