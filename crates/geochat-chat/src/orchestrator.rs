//! One chat turn, from incoming history to a streamed answer

use std::sync::Arc;
use std::time::Instant;

use futures_util::{StreamExt, stream};
use geochat_config::{ChatConfig, LlmConfig};
use geochat_llm::types::{CompletionParams, ToolCall, ToolChoice, ToolDefinition};
use geochat_llm::{CompletionRequest, Message, Provider};
use geochat_mcp::{ToolCallRequest, ToolInvoker, ToolRegistry};
use geochat_telemetry::ChatMetrics;

use crate::error::ChatError;
use crate::prompt::SystemPrompts;
use crate::relay::{self, ChunkStream};
use crate::transcript::Transcript;

/// Drives the probe dispatch, the tool loop and the streamed synthesis
///
/// Stateless between turns; the only shared state is the read-only
/// registry behind the invoker.
pub struct ConversationOrchestrator {
    provider: Arc<dyn Provider>,
    invoker: ToolInvoker,
    prompts: SystemPrompts,
    model: String,
    params: CompletionParams,
    metrics: ChatMetrics,
}

impl ConversationOrchestrator {
    pub fn new(provider: Arc<dyn Provider>, invoker: ToolInvoker, llm: &LlmConfig, chat: &ChatConfig) -> Self {
        Self {
            provider,
            invoker,
            prompts: SystemPrompts::new(chat),
            model: llm.model.clone(),
            params: CompletionParams {
                temperature: llm.temperature,
                max_tokens: llm.max_tokens,
            },
            metrics: ChatMetrics::new(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.invoker.registry()
    }

    /// Run one turn
    ///
    /// Fails only when the first model dispatch fails, before anything has
    /// been streamed. Later failures end the returned stream with an error
    /// chunk.
    pub async fn handle_turn(&self, history: Vec<Message>) -> Result<ChunkStream, ChatError> {
        let tools_ready = self.registry().is_ready();
        let transcript = self.prompts.compose(tools_ready, history);

        let probe = self.request(
            transcript.messages().to_vec(),
            tools_ready.then(|| self.tool_definitions()),
            false,
        );

        let start = Instant::now();
        let response = self.provider.complete(&probe).await.inspect_err(|e| {
            tracing::warn!(provider = self.provider.name(), error = %e, "probe dispatch failed");
            self.metrics.record_turn("failed");
        })?;
        self.metrics.record_dispatch("probe", start);

        let message = response.into_message();
        if message.tool_calls.is_empty() {
            tracing::debug!(tools_ready, "answered without tools");
            self.metrics.record_turn("direct");
            return Ok(relay::replay(message.content));
        }

        let requests: Vec<_> = message.tool_calls.iter().map(call_request).collect();
        tracing::info!(
            tool_calls = requests.len(),
            tools = ?requests.iter().map(|r| r.tool_name.as_str()).collect::<Vec<_>>(),
            "model requested tools"
        );

        let transcript = self
            .run_tools(transcript.with(Message::from(message)), requests)
            .await
            .inspect_err(|_| self.metrics.record_turn("failed"))?;
        self.metrics.record_turn("tools");

        Ok(self.synthesize(transcript).await)
    }

    /// Invoke each call in request order, appending one tool message per call
    ///
    /// Runs on its own task so invocations already dispatched complete even
    /// if the client goes away.
    async fn run_tools(&self, transcript: Transcript, requests: Vec<ToolCallRequest>) -> Result<Transcript, ChatError> {
        let invoker = self.invoker.clone();

        let task = tokio::spawn(async move {
            let invoker = &invoker;
            stream::iter(requests)
                .fold(transcript, move |transcript, request| async move {
                    let result = invoker.invoke(&request).await;
                    transcript.with(Message::tool(result.tool_call_id, result.text))
                })
                .await
        });

        task.await
            .map_err(|e| ChatError::Internal(anyhow::Error::new(e).context("tool execution task failed")))
    }

    /// Second dispatch: streamed, and without tools
    async fn synthesize(&self, transcript: Transcript) -> ChunkStream {
        let request = self.request(transcript.into_messages(), None, true);
        let start = Instant::now();

        match self.provider.complete_stream(&request).await {
            Ok(events) => {
                self.metrics.record_dispatch("synthesis", start);
                relay::relay(events)
            }
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "synthesis dispatch failed");
                relay::failure(&e)
            }
        }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry()
            .list_tool_specs()
            .into_iter()
            .map(|spec| {
                let description = Some(spec.description).filter(|d| !d.is_empty());
                ToolDefinition::function(spec.name, description, spec.parameters)
            })
            .collect()
    }

    fn request(&self, messages: Vec<Message>, tools: Option<Vec<ToolDefinition>>, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages,
            params: self.params.clone(),
            tool_choice: tools.as_ref().map(|_| ToolChoice::Auto),
            tools,
            stream,
        }
    }
}

fn call_request(call: &ToolCall) -> ToolCallRequest {
    ToolCallRequest {
        id: call.id.clone(),
        tool_name: call.function.name.clone(),
        arguments: call.function.arguments.clone(),
    }
}
