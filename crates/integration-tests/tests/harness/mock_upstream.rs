//! Mock OpenAI-compatible upstream for integration tests
//!
//! Serves `/v1/chat/completions` and `/v1/completions` with canned bodies and
//! records every request so tests can assert on the outbound JSON.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use indoc::indoc;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Text every canned response carries
pub const REPLY_TEXT: &str = "Hello world";

/// Fingerprint every canned response carries
pub const FINGERPRINT: &str = "fp_mock";

/// Model name canned streaming chunks report
pub const SERVED_MODEL: &str = "mock-model-2024";

/// Canned chat stream: keepalive, role-only and malformed frames around
/// three content fragments, then a terminal chunk carrying usage
const CHAT_STREAM: &str = indoc! {r#"
    : keepalive

    data: {"model":"mock-model-2024","system_fingerprint":"fp_mock","choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}

    data: {"model":"mock-model-2024","system_fingerprint":"fp_mock","choices":[{"index":0,"delta":{"content":"Hel"}}]}

    data: {"model":"mock-model-2024","system_fingerprint":"fp_mock","choices":[{"index":0,"delta":{"content":"lo"}}]}

    data: not-json

    data: {"model":"mock-model-2024","system_fingerprint":"fp_mock","choices":[{"index":0,"delta":{"content":" world"}}]}

    data: {"model":"mock-model-2024","system_fingerprint":"fp_mock","choices":[{"index":0,"delta":{},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}

    data: [DONE]

"#};

/// Canned chat stream for requests that declare tools
const CHAT_TOOL_STREAM: &str = indoc! {r#"
    data: {"model":"mock-model-2024","choices":[{"index":0,"delta":{"role":"assistant","tool_calls":[{"index":0,"id":"call_mock","type":"function","function":{"name":"get_weather","arguments":""}}]}}]}

    data: {"model":"mock-model-2024","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"location\":"}}]}}]}

    data: {"model":"mock-model-2024","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"Oslo\"}"}}]}}]}

    data: {"model":"mock-model-2024","choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}],"usage":{"prompt_tokens":20,"completion_tokens":7,"total_tokens":27}}

    data: [DONE]

"#};

/// Canned completion stream
const COMPLETION_STREAM: &str = indoc! {r#"
    data: {"model":"mock-model-2024","choices":[{"index":0,"text":"Hello"}]}

    data: {"model":"mock-model-2024","choices":[{"index":0,"text":" world"}]}

    data: {"choices":[]}

    data: {"model":"mock-model-2024","choices":[{"index":0,"text":"","finish_reason":"length"}],"usage":{"prompt_tokens":4,"completion_tokens":2,"total_tokens":6}}

    data: [DONE]

"#};

/// One request as the mock received it
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request path, e.g. `/v1/chat/completions`
    pub path: String,
    /// Raw `Authorization` header
    pub authorization: Option<String>,
    /// Parsed JSON body
    pub body: Value,
}

/// Mock upstream that returns predictable responses
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    requests: Mutex<Vec<CapturedRequest>>,
    /// Status and body returned for every request instead of a success
    failure: Option<(StatusCode, String)>,
    /// Replaces the canned stream body
    stream_body: Option<String>,
}

impl MockUpstream {
    /// Start a mock that answers every request successfully
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(None, None).await
    }

    /// Start a mock that answers every request with `status` and `body`
    pub async fn start_failing(status: u16, body: &str) -> anyhow::Result<Self> {
        let status = StatusCode::from_u16(status)?;
        Self::start_inner(Some((status, body.to_owned())), None).await
    }

    /// Start a mock whose streaming responses use `body` verbatim
    pub async fn start_with_stream(body: &str) -> anyhow::Result<Self> {
        Self::start_inner(None, Some(body.to_owned())).await
    }

    async fn start_inner(
        failure: Option<(StatusCode, String)>,
        stream_body: Option<String>,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            requests: Mutex::new(Vec::new()),
            failure,
            stream_body,
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat))
            .route("/v1/completions", routing::post(handle_completion))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to use as `endpoint_url`, including `/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The only request received
    pub fn single_request(&self) -> CapturedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Handlers --

async fn handle_chat(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (stream, has_tools) = (is_streaming(&body), body.get("tools").is_some());
    let model = body["model"].as_str().unwrap_or_default().to_owned();

    if let Some(failure) = record(&state, &uri, &headers, body) {
        return failure;
    }

    if stream {
        let canned = if has_tools { CHAT_TOOL_STREAM } else { CHAT_STREAM };
        return sse(state.stream_body.as_deref().unwrap_or(canned));
    }

    let (message, finish_reason) = if has_tools {
        let message = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_mock",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"location\":\"Oslo\"}"}
            }]
        });
        (message, "tool_calls")
    } else {
        (json!({"role": "assistant", "content": REPLY_TEXT}), "stop")
    };

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "system_fingerprint": FINGERPRINT,
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

async fn handle_completion(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let stream = is_streaming(&body);

    if let Some(failure) = record(&state, &uri, &headers, body) {
        return failure;
    }

    if stream {
        return sse(state.stream_body.as_deref().unwrap_or(COMPLETION_STREAM));
    }

    Json(json!({
        "id": "cmpl-mock",
        "object": "text_completion",
        "created": 1_700_000_000,
        "model": SERVED_MODEL,
        "choices": [{"index": 0, "text": REPLY_TEXT, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}
    }))
    .into_response()
}

fn is_streaming(body: &Value) -> bool {
    body.get("stream").and_then(Value::as_bool).unwrap_or(false)
}

/// Store the request and return the configured failure, if any
fn record(state: &MockState, uri: &Uri, headers: &HeaderMap, body: Value) -> Option<Response> {
    state.requests.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_owned(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned),
        body,
    });

    state
        .failure
        .as_ref()
        .map(|(status, body)| (*status, [(header::CONTENT_TYPE, "application/json")], body.clone()).into_response())
}

fn sse(body: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/event-stream")],
        body.to_owned(),
    )
        .into_response()
}
