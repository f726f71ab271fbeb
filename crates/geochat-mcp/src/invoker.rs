//! Executes single tool calls and normalizes every outcome into text

use std::sync::Arc;
use std::time::{Duration, Instant};

use geochat_telemetry::ChatMetrics;

use crate::error::McpError;
use crate::registry::ToolRegistry;
use crate::server::{JsonObject, ToolOutput};

/// Text fed back to the model when a tool succeeds without returning anything
pub const NO_RESULT: &str = "The tool returned no result.";

/// A tool call the model asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    /// Opaque id assigned by the model
    pub id: String,
    pub tool_name: String,
    /// JSON-encoded argument object, exactly as the model produced it
    pub arguments: String,
}

impl ToolCallRequest {
    /// Decode the arguments; an empty string means no arguments
    pub fn parse_arguments(&self) -> Result<JsonObject, McpError> {
        if self.arguments.trim().is_empty() {
            return Ok(JsonObject::new());
        }

        match serde_json::from_str(&self.arguments) {
            Ok(serde_json::Value::Object(object)) => Ok(object),
            Ok(other) => Err(McpError::MalformedArguments(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(McpError::MalformedArguments(e.to_string())),
        }
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Normalized outcome of one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub is_error: bool,
    /// Never empty
    pub text: String,
}

/// Runs tool calls against whichever server advertised the tool
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    call_timeout: Option<Duration>,
    metrics: ChatMetrics,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>, call_timeout: Option<Duration>) -> Self {
        Self {
            registry,
            call_timeout,
            metrics: ChatMetrics::new(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call; every failure becomes an error result
    pub async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
        let start = Instant::now();
        let (is_error, text) = match self.execute(request).await {
            Ok(output) => normalize(output, &request.tool_name),
            Err(e) => {
                tracing::warn!(tool = %request.tool_name, error = %e, "tool call failed");
                (true, format!("Error executing tool {}: {e}", request.tool_name))
            }
        };

        self.metrics.record_tool_call(&request.tool_name, start, is_error);
        tracing::debug!(tool = %request.tool_name, is_error, "tool call finished");

        ToolCallResult {
            tool_call_id: request.id.clone(),
            is_error,
            text,
        }
    }

    async fn execute(&self, request: &ToolCallRequest) -> Result<ToolOutput, McpError> {
        let server = self
            .registry
            .server_for(&request.tool_name)
            .ok_or_else(|| McpError::UnknownTool {
                tool: request.tool_name.clone(),
            })?;

        let arguments = request.parse_arguments()?;
        let call = server.call_tool(&request.tool_name, arguments);

        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(McpError::Timeout(limit))),
            None => call.await,
        }
    }
}

/// Collapse server output into the single text the model will read
fn normalize(output: ToolOutput, tool_name: &str) -> (bool, String) {
    let text = output.text.join("\n");

    let text = if !text.trim().is_empty() {
        text
    } else if let Some(structured) = output.structured.filter(|v| !v.is_null()) {
        structured.to_string()
    } else if output.is_error {
        "unknown error".to_owned()
    } else {
        NO_RESULT.to_owned()
    };

    if output.is_error {
        (true, format!("Error executing tool {tool_name}: {text}"))
    } else {
        (false, text)
    }
}
