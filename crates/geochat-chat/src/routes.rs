//! HTTP endpoints for chat turns and the tool listing

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt;
use geochat_llm::Message;
use geochat_llm::types::Role;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::orchestrator::ConversationOrchestrator;
use crate::relay::ChunkStream;

const X_ACCEL_BUFFERING: &str = "x-accel-buffering";

/// Build the chat router
pub fn chat_router(orchestrator: Arc<ConversationOrchestrator>) -> Router {
    Router::new()
        .route("/chat", routing::post(chat))
        .route("/tools", routing::get(list_tools))
        .with_state(orchestrator)
}

/// Body of `POST /chat`: the whole conversation so far
#[derive(Debug, Deserialize)]
struct ChatRequest {
    prompt: Vec<PromptMessage>,
}

#[derive(Debug, Deserialize)]
struct PromptMessage {
    role: Role,
    content: String,
}

impl ChatRequest {
    fn into_history(self) -> Result<Vec<Message>, ChatError> {
        if self.prompt.is_empty() {
            return Err(ChatError::InvalidRequest("No messages provided".to_owned()));
        }

        self.prompt
            .into_iter()
            .map(|message| {
                Message::from_role(message.role, message.content).ok_or_else(|| {
                    ChatError::InvalidRequest(format!("unsupported message role: {}", message.role.as_str()))
                })
            })
            .collect()
    }
}

/// Handle `POST /chat`
async fn chat(
    State(orchestrator): State<Arc<ConversationOrchestrator>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ChatError> {
    let Json(request) = payload.map_err(|e| ChatError::InvalidRequest(e.body_text()))?;
    let history = request.into_history()?;

    tracing::debug!(messages = history.len(), "chat turn received");

    let chunks = orchestrator.handle_turn(history).await?;
    Ok(stream_response(chunks))
}

/// Wrap answer chunks in a server-sent event stream
fn stream_response(chunks: ChunkStream) -> Response {
    let events = chunks.map(|chunk| Event::default().json_data(chunk));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static(X_ACCEL_BUFFERING), "no"),
        ],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

#[derive(Serialize)]
struct ToolListing<'a> {
    ready: bool,
    tools: Vec<ToolEntry<'a>>,
}

#[derive(Serialize)]
struct ToolEntry<'a> {
    name: &'a str,
    description: &'a str,
    server: &'a str,
}

/// Handle `GET /tools`
async fn list_tools(State(orchestrator): State<Arc<ConversationOrchestrator>>) -> Response {
    let registry = orchestrator.registry();

    let listing = ToolListing {
        ready: registry.is_ready(),
        tools: registry
            .tools()
            .map(|(tool, server)| ToolEntry {
                name: &tool.name,
                description: &tool.description,
                server,
            })
            .collect(),
    };

    Json(listing).into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use geochat_config::{ChatConfig, LlmConfig};
    use geochat_llm::types::{Choice, ChoiceMessage, CompletionResponse};
    use geochat_llm::{CompletionRequest, LlmError, Provider, ProviderStream};
    use geochat_mcp::{ToolInvoker, ToolRegistry};
    use tower::ServiceExt;

    use super::*;

    /// Answers every turn by repeating the last user message
    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let last = request
                .messages
                .iter()
                .rev()
                .find_map(|message| match message {
                    Message::User { content } => Some(content.clone()),
                    _ => None,
                })
                .unwrap_or_default();

            Ok(CompletionResponse {
                id: "echo-1".to_owned(),
                model: request.model.clone(),
                choices: vec![Choice {
                    index: 0,
                    message: ChoiceMessage {
                        content: Some(format!("You said: {last}")),
                        tool_calls: Vec::new(),
                    },
                    finish_reason: None,
                }],
                usage: None,
            })
        }

        async fn complete_stream(&self, _request: &CompletionRequest) -> Result<ProviderStream, LlmError> {
            Err(LlmError::Internal(anyhow::anyhow!("echo does not stream")))
        }
    }

    /// Rejects every request as over quota
    struct ExhaustedProvider;

    #[async_trait]
    impl Provider for ExhaustedProvider {
        fn name(&self) -> &str {
            "exhausted"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::RateLimited { retry_after: None })
        }

        async fn complete_stream(&self, _request: &CompletionRequest) -> Result<ProviderStream, LlmError> {
            Err(LlmError::RateLimited { retry_after: None })
        }
    }

    fn router(provider: Arc<dyn Provider>) -> Router {
        let invoker = ToolInvoker::new(Arc::new(ToolRegistry::disconnected()), None);
        let orchestrator = ConversationOrchestrator::new(provider, invoker, &LlmConfig::default(), &ChatConfig::default());

        chat_router(Arc::new(orchestrator))
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn chat_streams_answer_as_events() {
        let response = router(Arc::new(EchoProvider))
            .oneshot(post_chat(r#"{"prompt":[{"role":"user","content":"hello"}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[X_ACCEL_BUFFERING], "no");
        assert!(body_text(response).await.contains(r#"data: {"content":"You said: hello"}"#));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let response = router(Arc::new(EchoProvider))
            .oneshot(post_chat(r#"{"prompt":[]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["message"], "No messages provided");
    }

    #[tokio::test]
    async fn tool_role_is_rejected() {
        let response = router(Arc::new(EchoProvider))
            .oneshot(post_chat(r#"{"prompt":[{"role":"tool","content":"x"}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("unsupported message role: tool"));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let response = router(Arc::new(EchoProvider))
            .oneshot(post_chat(r#"{"messages":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failure_before_streaming_is_json() {
        let response = router(Arc::new(ExhaustedProvider))
            .oneshot(post_chat(r#"{"prompt":[{"role":"user","content":"hello"}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["type"], "rate_limit_error");
    }

    #[tokio::test]
    async fn tools_listing_reports_degraded_mode() {
        let response = router(Arc::new(EchoProvider))
            .oneshot(Request::get("/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, serde_json::json!({"ready": false, "tools": []}));
    }
}
