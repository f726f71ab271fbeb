//! The seam between the registry and a concrete tool server

use async_trait::async_trait;
use serde::Serialize;

use crate::error::McpError;

/// JSON object passed as tool arguments
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// A tool as advertised by its server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    /// Unique, stable identifier
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments, forwarded to the model untouched
    pub parameters: serde_json::Value,
}

/// Raw outcome of one tool invocation, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Server flagged the call as failed
    pub is_error: bool,
    /// Text content blocks, in server order
    pub text: Vec<String>,
    /// Structured content, when the server returned any
    pub structured: Option<serde_json::Value>,
}

impl ToolOutput {
    /// Successful output consisting of a single text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            text: vec![text.into()],
            structured: None,
        }
    }

    /// Failed output with the server's explanation
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }
}

/// A remote service that lists and executes tools
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Configured name of this server
    fn name(&self) -> &str;

    /// Fetch every tool the server exposes
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError>;

    /// Invoke a tool once; no retry on failure
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError>;
}
