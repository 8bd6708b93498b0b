//! Streaming execution behaviour
//!
//! A scripted in-memory transport replays one frame script per connection
//! attempt, so reconnection, heartbeat and failure behaviour is
//! deterministic.
//!
//! Test Categories:
//! 1. Reconnection transparency
//! 2. Heartbeat suppression
//! 3. Error propagation and preconditions
//! 4. Teardown on consumer drop

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{stream, StreamExt};

use docpipe::execution::{
    Consistency, EngineConfig, ExecuteOptions, ExecuteRequest, ExecutionEngine, ExecutionError,
    FrameStream, Readiness, ResponseFrame, RetryPolicy, RpcCode, StreamMessage, Transport,
    TransportError, WireDocument,
};
use docpipe::expr::Direction;
use docpipe::filter::Filter;
use docpipe::observability::Severity;
use docpipe::pipeline::{Pipeline, Stage};
use docpipe::query::Query;
use docpipe::value::{FieldMap, NativeValue, Timestamp, WireValue};

// =============================================================================
// Helpers
// =============================================================================

const DATABASE: &str = "projects/demo/databases/(default)";

type Script = Vec<Result<StreamMessage, TransportError>>;

/// Sets a flag when dropped
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct ScriptedTransport {
    attempts: Mutex<VecDeque<Script>>,
    opened: AtomicUsize,
    requests: Mutex<Vec<ExecuteRequest>>,
    /// Keep the last attempt open forever after its script
    hang_after_script: bool,
    dropped: Arc<AtomicBool>,
}

impl ScriptedTransport {
    fn new(attempts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(attempts.into()),
            opened: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            hang_after_script: false,
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    fn hanging(script: Script) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(vec![script].into()),
            opened: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            hang_after_script: true,
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
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

        let frames: FrameStream = if self.hang_after_script {
            let guard = DropFlag(Arc::clone(&self.dropped));
            Box::pin(stream::iter(script).chain(stream::pending()).map(move |item| {
                let _guard = &guard;
                item
            }))
        } else {
            Box::pin(stream::iter(script))
        };
        Box::pin(async move { Ok(frames) })
    }
}

struct FailingReadiness {
    client: bool,
}

impl Readiness for FailingReadiness {
    fn client_ready(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        let client = self.client;
        Box::pin(async move {
            if client {
                Err("credentials unavailable".to_string())
            } else {
                Ok(())
            }
        })
    }

    fn decoder_ready(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        Box::pin(async { Err("descriptor load failed".to_string()) })
    }
}

fn document(id: &str, n: i64) -> WireDocument {
    let mut fields = FieldMap::new();
    fields.insert("n", WireValue::Integer(n));
    WireDocument {
        name: Some(format!("{}/documents/numbers/{}", DATABASE, id)),
        fields,
        create_time: Some(Timestamp::from_millis(1_000)),
        update_time: Some(Timestamp::from_millis(2_000)),
    }
}

fn frame(rows: &[(&str, i64)]) -> StreamMessage {
    StreamMessage::Response(ResponseFrame {
        results: rows.iter().map(|(id, n)| document(id, *n)).collect(),
        transaction: Some(vec![0xab, 0xcd]),
        execution_time: Some(Timestamp::from_millis(3_000)),
        explain_stats: None,
    })
}

fn engine(transport: Arc<ScriptedTransport>) -> ExecutionEngine {
    let config = EngineConfig::new(DATABASE).with_log_level(Severity::Fatal);
    ExecutionEngine::new(config, transport).unwrap()
}

fn pipeline() -> Pipeline {
    Pipeline::from_source(Stage::collection("numbers"))
}

fn ids(response: &docpipe::execution::PipelineResponse) -> Vec<String> {
    response
        .results
        .iter()
        .filter_map(|r| r.id().map(str::to_string))
        .collect()
}

// =============================================================================
// RECONNECTION TRANSPARENCY
// =============================================================================

/// Test: three silent ends before a normal finish yield the same elements
/// as a single uninterrupted stream.
#[tokio::test]
async fn test_reconnect_is_transparent() {
    let single = ScriptedTransport::new(vec![vec![
        Ok(frame(&[("a", 1), ("b", 2)])),
        Ok(frame(&[("c", 3)])),
        Ok(frame(&[])),
        Ok(frame(&[("d", 4), ("e", 5)])),
        Ok(StreamMessage::Finished),
    ]]);
    let interrupted = ScriptedTransport::new(vec![
        vec![Ok(frame(&[("a", 1), ("b", 2)]))],
        vec![Ok(frame(&[("c", 3)]))],
        vec![Ok(frame(&[]))],
        vec![Ok(frame(&[("d", 4), ("e", 5)])), Ok(StreamMessage::Finished)],
    ]);

    let expected: Vec<_> = engine(Arc::clone(&single))
        .stream_elements(&pipeline(), ExecuteOptions::new())
        .map(|item| item.unwrap())
        .collect()
        .await;
    let actual: Vec<_> = engine(Arc::clone(&interrupted))
        .stream_elements(&pipeline(), ExecuteOptions::new())
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(actual, expected);
    assert_eq!(actual.iter().filter(|e| e.is_row()).count(), 5);
    assert_eq!(single.opened(), 1);
    assert_eq!(interrupted.opened(), 4);

    // Every attempt carries the identical request
    let requests = interrupted.requests.lock().unwrap();
    assert!(requests.iter().all(|r| *r == requests[0]));
}

/// Test: collect mode sees one logical response across reconnects.
#[tokio::test]
async fn test_execute_across_reconnects() {
    let transport = ScriptedTransport::new(vec![
        vec![Ok(frame(&[("a", 1)]))],
        vec![Ok(frame(&[("b", 2)])), Ok(StreamMessage::Finished)],
    ]);
    let response = engine(transport)
        .execute(&pipeline(), ExecuteOptions::new())
        .await
        .unwrap();

    assert_eq!(ids(&response), vec!["a", "b"]);
    assert_eq!(response.transaction, Some(vec![0xab, 0xcd]));
    assert_eq!(response.execution_time, Some(Timestamp::from_millis(3_000)));
    assert_eq!(
        response.results[0].get("n"),
        Some(&NativeValue::Integer(1))
    );
}

// =============================================================================
// HEARTBEAT SUPPRESSION
// =============================================================================

/// Test: heartbeat frames produce no elements.
#[tokio::test]
async fn test_heartbeats_suppressed() {
    let transport = ScriptedTransport::new(vec![vec![
        Ok(StreamMessage::Heartbeat),
        Ok(frame(&[("a", 1)])),
        Ok(StreamMessage::Heartbeat),
        Ok(StreamMessage::Heartbeat),
        Ok(StreamMessage::Finished),
    ]]);

    let elements: Vec<_> = engine(transport)
        .stream_elements(&pipeline(), ExecuteOptions::new())
        .collect()
        .await;
    assert_eq!(elements.len(), 1);
    assert!(elements[0].as_ref().unwrap().is_row());
}

/// Test: metadata-only frames reach collect mode but not row streams.
#[tokio::test]
async fn test_metadata_only_frames() {
    let script = || {
        vec![
            Ok(StreamMessage::Response(ResponseFrame {
                transaction: Some(vec![9]),
                explain_stats: Some(WireValue::string("plan")),
                ..Default::default()
            })),
            Ok(StreamMessage::Finished),
        ]
    };

    let response = engine(ScriptedTransport::new(vec![script()]))
        .execute(&pipeline(), ExecuteOptions::new())
        .await
        .unwrap();
    assert!(response.is_empty());
    assert_eq!(response.transaction, Some(vec![9]));
    assert_eq!(response.explain_stats, Some(WireValue::string("plan")));

    let rows: Vec<_> = engine(ScriptedTransport::new(vec![script()]))
        .stream(&pipeline(), ExecuteOptions::new())
        .collect()
        .await;
    assert!(rows.is_empty());
}

// =============================================================================
// ERRORS AND PRECONDITIONS
// =============================================================================

/// Test: a permanent transport error ends the row stream after the rows
/// already delivered.
#[tokio::test]
async fn test_transport_error_ends_stream() {
    let transport = ScriptedTransport::new(vec![vec![
        Ok(frame(&[("a", 1)])),
        Err(TransportError::new(RpcCode::InvalidArgument, "bad pipeline")),
        Ok(frame(&[("b", 2)])),
    ]]);

    let items: Vec<_> = engine(transport)
        .stream(&pipeline(), ExecuteOptions::new())
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    let err = items[1].as_ref().unwrap_err();
    assert!(err.is_permanent());
    assert_eq!(err.rpc_code(), Some(RpcCode::InvalidArgument));
}

/// Test: classification follows the injected policy.
#[tokio::test]
async fn test_policy_classification() {
    let transport = ScriptedTransport::new(vec![vec![Err(TransportError::new(
        RpcCode::Unavailable,
        "try later",
    ))]]);
    let config = EngineConfig::new(DATABASE).with_log_level(Severity::Fatal);
    let engine = ExecutionEngine::with_parts(
        config,
        transport,
        Arc::new(docpipe::execution::AlwaysReady),
        Arc::new(RetryPolicy::empty()),
    )
    .unwrap();

    let err = engine
        .execute(&pipeline(), ExecuteOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_permanent());
}

/// Test: failed client initialization never opens a stream.
#[tokio::test]
async fn test_client_precondition_failure() {
    let transport = ScriptedTransport::new(vec![vec![Ok(StreamMessage::Finished)]]);
    let config = EngineConfig::new(DATABASE).with_log_level(Severity::Fatal);
    let engine = ExecutionEngine::with_parts(
        config,
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::new(FailingReadiness { client: true }),
        Arc::new(RetryPolicy::default()),
    )
    .unwrap();

    let err = engine
        .execute(&pipeline(), ExecuteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ClientNotReady(_)));
    assert_eq!(transport.opened(), 0);
}

/// Test: failed decoder loading never opens a stream.
#[tokio::test]
async fn test_decoder_precondition_failure() {
    let transport = ScriptedTransport::new(vec![vec![Ok(StreamMessage::Finished)]]);
    let config = EngineConfig::new(DATABASE).with_log_level(Severity::Fatal);
    let engine = ExecutionEngine::with_parts(
        config,
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::new(FailingReadiness { client: false }),
        Arc::new(RetryPolicy::default()),
    )
    .unwrap();

    let err = engine
        .execute(&pipeline(), ExecuteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::DecoderNotReady(_)));
    assert_eq!(transport.opened(), 0);
}

/// Test: query translation errors surface without a network call.
#[tokio::test]
async fn test_query_error_before_network() {
    let transport = ScriptedTransport::new(vec![]);
    let query = Query::collection("numbers").with_limit_to_last(2);

    let err = engine(Arc::clone(&transport))
        .execute_query(&query, ExecuteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Compile(_)));
    assert_eq!(transport.opened(), 0);
}

// =============================================================================
// REQUEST SHAPE AND TEARDOWN
// =============================================================================

/// Test: translated queries and consistency reach the transport.
#[tokio::test]
async fn test_query_request_shape() {
    let transport = ScriptedTransport::new(vec![vec![Ok(StreamMessage::Finished)]]);
    let query = Query::collection("numbers")
        .with_filter(Filter::greater_than("n", 1))
        .order_by("n", Direction::Descending)
        .with_limit(3);
    let options = ExecuteOptions::new().with_consistency(Consistency::NewTransaction);

    engine(Arc::clone(&transport))
        .execute_query(&query, options)
        .await
        .unwrap();

    let requests = transport.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.database, DATABASE);
    assert_eq!(request.consistency, Some(Consistency::NewTransaction));
    let names: Vec<&str> = request
        .structured_pipeline
        .pipeline
        .stages
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["collection", "where", "sort", "limit"]);
}

/// Test: dropping the outward stream tears down the inbound stream.
#[tokio::test]
async fn test_drop_tears_down_transport_stream() {
    let transport = ScriptedTransport::hanging(vec![Ok(frame(&[("a", 1)]))]);
    let engine = engine(Arc::clone(&transport));

    let mut rows = engine.stream(&pipeline(), ExecuteOptions::new()).boxed();
    let first = rows.next().await.unwrap().unwrap();
    assert_eq!(first.id(), Some("a"));
    assert!(!transport.dropped.load(Ordering::SeqCst));

    drop(rows);

    let torn_down = tokio::time::timeout(Duration::from_secs(5), async {
        while !transport.dropped.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(torn_down.is_ok());
    assert_eq!(transport.opened(), 1);
}
