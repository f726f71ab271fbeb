//! Mock LLM backend server for integration tests
//!
//! Implements the slice of the OpenAI chat completions API geochat uses. A
//! request that offers tools gets a `search_catalogue` tool call back; a
//! streaming request that carries tool results gets a summary of them.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Mock LLM backend that returns predictable responses
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    /// Raw bodies of every completion request, in arrival order
    requests: Mutex<Vec<serde_json::Value>>,
    /// Number of requests to fail before succeeding (0 = never fail)
    fail_count: AtomicU32,
    /// Answer given when no tool is involved
    response_content: String,
}

impl MockLlm {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, "Hello from mock LLM").await
    }

    /// Start a mock server that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, "Hello from mock LLM").await
    }

    /// Start a mock server with a custom plain answer
    pub async fn start_with_response(content: &str) -> anyhow::Result<Self> {
        Self::start_inner(0, content).await
    }

    async fn start_inner(fail_count: u32, response_content: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockLlmState {
            requests: Mutex::new(Vec::new()),
            fail_count: AtomicU32::new(fail_count),
            response_content: response_content.to_owned(),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
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

    /// Base URL for configuring the mock as the provider
    ///
    /// Includes `/v1` since the OpenAI provider appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Every completion request received so far
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Wire types matching OpenAI format --

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(default)]
    stream: Option<bool>,
    #[serde(default)]
    tools: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionRequest {
    fn tool_results(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.role == "tool")
            .filter_map(|m| m.content.as_deref())
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionResponse {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Debug, Serialize)]
struct Choice {
    index: u32,
    message: ResponseMessage,
    finish_reason: String,
}

#[derive(Debug, Serialize)]
struct ResponseMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallResponse>>,
}

#[derive(Debug, Serialize)]
struct ToolCallResponse {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: FunctionCallResponse,
}

#[derive(Debug, Serialize)]
struct FunctionCallResponse {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct StreamChunk {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<StreamChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

#[derive(Debug, Serialize)]
struct StreamChoice {
    index: u32,
    delta: StreamDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    finish_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct StreamDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

// -- Handlers --

async fn handle_chat_completions(
    State(state): State<Arc<MockLlmState>>,
    Json(raw): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(raw.clone());

    let remaining = state.fail_count.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": {
                    "message": "mock server intentional failure",
                    "type": "server_error"
                }
            })),
        )
            .into_response();
    }

    let req: ChatCompletionRequest = match serde_json::from_value(raw) {
        Ok(req) => req,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let tool_results = req.tool_results();
    let answer = if tool_results.is_empty() {
        state.response_content.clone()
    } else {
        format!("Summary: {}", tool_results.join(" | "))
    };

    if req.stream.unwrap_or(false) {
        return build_streaming_response(&req.model, &answer).into_response();
    }

    // Offered tools and no results yet: ask for a catalogue search
    let (content, tool_calls, finish_reason) = if req.tools.is_some() && tool_results.is_empty() {
        (
            None,
            Some(vec![ToolCallResponse {
                id: "call_test_123".to_owned(),
                tool_type: "function".to_owned(),
                function: FunctionCallResponse {
                    name: "search_catalogue".to_owned(),
                    arguments: r#"{"query":"water quality"}"#.to_owned(),
                },
            }]),
            "tool_calls".to_owned(),
        )
    } else {
        (Some(answer), None, "stop".to_owned())
    };

    let response = ChatCompletionResponse {
        id: "chatcmpl-test-123".to_owned(),
        object: "chat.completion".to_owned(),
        created: 1_700_000_000,
        model: req.model,
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: "assistant".to_owned(),
                content,
                tool_calls,
            },
            finish_reason,
        }],
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    };

    Json(response).into_response()
}

/// Build an SSE body streaming `answer` one word at a time
fn build_streaming_response(model: &str, answer: &str) -> impl IntoResponse {
    let chunk = |delta: StreamDelta, finish_reason: Option<&str>| StreamChunk {
        id: "chatcmpl-test-stream".to_owned(),
        object: "chat.completion.chunk".to_owned(),
        created: 1_700_000_000,
        model: model.to_owned(),
        choices: vec![StreamChoice {
            index: 0,
            delta,
            finish_reason: finish_reason.map(str::to_owned),
        }],
        usage: None,
    };

    let mut chunks = vec![chunk(
        StreamDelta {
            role: Some("assistant".to_owned()),
            content: Some(String::new()),
        },
        None,
    )];

    chunks.extend(answer.split_inclusive(' ').map(|word| {
        chunk(
            StreamDelta {
                role: None,
                content: Some(word.to_owned()),
            },
            None,
        )
    }));

    chunks.push(chunk(
        StreamDelta {
            role: None,
            content: None,
        },
        Some("stop"),
    ));

    let mut body: String = chunks
        .iter()
        .map(|c| format!("data: {}\n\n", serde_json::to_string(c).unwrap()))
        .collect();
    body.push_str("data: [DONE]\n\n");

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
}
