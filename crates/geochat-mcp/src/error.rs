//! Failures of tool discovery and invocation

use geochat_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Tool subsystem errors
#[derive(Debug, Error)]
pub enum McpError {
    /// No configured tool server could be reached
    #[error("no tool server available: {0}")]
    Unavailable(String),

    /// Tool name was never advertised by any connected server
    #[error("unknown tool: {tool}")]
    UnknownTool { tool: String },

    /// Two servers, or one server twice, advertise the same tool name
    #[error("tool '{tool}' is advertised by both '{first}' and '{second}'")]
    DuplicateTool { tool: String, first: String, second: String },

    /// Model-supplied arguments are not a JSON object or were rejected by the server
    #[error("invalid arguments: {0}")]
    MalformedArguments(String),

    /// Tool server or catalogue rejected our credentials
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    /// Tool server reported a failure executing the tool
    #[error("{0}")]
    Execution(String),

    /// Transport-level connection or communication error
    #[error("transport error: {0}")]
    Transport(String),

    /// Operation did not finish within its time bound
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for McpError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnknownTool { .. } => StatusCode::NOT_FOUND,
            Self::MalformedArguments(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) | Self::Transport(_) | Self::Execution(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::DuplicateTool { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Unavailable(_) => "tool_server_unavailable",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::DuplicateTool { .. } => "duplicate_tool",
            Self::MalformedArguments(_) => "malformed_arguments",
            Self::Unauthenticated(_) => "authentication_error",
            Self::Execution(_) => "execution_error",
            Self::Transport(_) => "transport_error",
            Self::Timeout(_) => "timeout_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Transport(_) => "failed to communicate with tool server".to_owned(),
            Self::Internal(_) => "internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}
