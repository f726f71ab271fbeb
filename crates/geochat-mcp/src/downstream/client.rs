use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use geochat_config::{HttpConfig, McpAuthConfig, McpServerType, StdioConfig};
use rmcp::model::{CallToolRequestParam, CallToolResult, ErrorCode, RawContent, Tool};
use rmcp::service::{RoleClient, RunningService, ServiceError, ServiceExt as _};
use regex::Regex;
use rmcp::transport::TokioChildProcess;
use secrecy::ExposeSecret;

use crate::error::McpError;
use crate::server::{JsonObject, ToolDescriptor, ToolOutput, ToolServer};

/// Connected tool server wrapping a running rmcp service
pub struct McpClient {
    service: RunningService<RoleClient, ()>,
    server_name: String,
}

impl McpClient {
    /// Connect to a tool server and complete the protocol handshake
    pub async fn connect(name: &str, server_type: &McpServerType) -> Result<Self, McpError> {
        let service = match server_type {
            McpServerType::Stdio(config) => Self::connect_stdio(config).await?,
            McpServerType::Sse(config) => Self::connect_sse(config).await?,
            McpServerType::StreamableHttp(config) => Self::connect_streamable_http(config).await?,
        };

        tracing::info!(server = name, "connected to tool server");

        Ok(Self {
            service,
            server_name: name.to_string(),
        })
    }

    async fn connect_stdio(config: &StdioConfig) -> Result<RunningService<RoleClient, ()>, McpError> {
        let mut cmd = tokio::process::Command::new(&config.command);
        cmd.args(&config.args).envs(&config.env);

        let transport =
            TokioChildProcess::new(cmd).map_err(|e| McpError::Transport(format!("failed to spawn process: {e}")))?;

        ().serve(transport)
            .await
            .map_err(|e| McpError::Transport(format!("STDIO handshake failed: {e}")))
    }

    async fn connect_sse(config: &HttpConfig) -> Result<RunningService<RoleClient, ()>, McpError> {
        use rmcp::transport::SseClientTransport;
        use rmcp::transport::sse_client::SseClientConfig;

        let sse_config = SseClientConfig {
            sse_endpoint: Arc::from(config.url.as_str()),
            ..Default::default()
        };

        let client = build_reqwest_client(config.auth.as_ref()).await?;

        let transport = SseClientTransport::start_with_client(client, sse_config)
            .await
            .map_err(|e| classify_connect_error("SSE connection failed", &e.to_string()))?;

        ().serve(transport)
            .await
            .map_err(|e| McpError::Transport(format!("SSE handshake failed: {e}")))
    }

    async fn connect_streamable_http(config: &HttpConfig) -> Result<RunningService<RoleClient, ()>, McpError> {
        use rmcp::transport::StreamableHttpClientTransport;
        use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;

        let transport_config = StreamableHttpClientTransportConfig::with_uri(config.url.as_str());
        let client = build_reqwest_client(config.auth.as_ref()).await?;
        let transport = StreamableHttpClientTransport::with_client(client, transport_config);

        ().serve(transport)
            .await
            .map_err(|e| classify_connect_error("StreamableHTTP handshake failed", &e.to_string()))
    }
}

#[async_trait]
impl ToolServer for McpClient {
    fn name(&self) -> &str {
        &self.server_name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| McpError::Transport(format!("list_tools failed on {}: {e}", self.server_name)))?;

        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError> {
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: Cow::Owned(name.to_string()),
                arguments: Some(arguments),
            })
            .await
            .map_err(classify_call_error)?;

        Ok(result.into())
    }
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.as_deref().unwrap_or_default().to_string(),
            parameters: serde_json::Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

impl From<CallToolResult> for ToolOutput {
    fn from(result: CallToolResult) -> Self {
        let text = result
            .content
            .into_iter()
            .filter_map(|c| match c.raw {
                RawContent::Text(t) => Some(t.text),
                _ => None,
            })
            .collect();

        Self {
            is_error: result.is_error.unwrap_or(false),
            text,
            structured: result.structured_content,
        }
    }
}

/// Whether an error message describes rejected credentials
///
/// A bare `401` only counts when it reads as a status code, so ids and
/// counts that happen to contain those digits stay execution failures.
fn mentions_auth_failure(message: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();

    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:unauthori[sz]ed|unauthenticated|not authenticated)\b|\b(?:status|http)(?:\s+code)?[\s:=]*401\b")
            .expect("must be valid regex")
    })
    .is_match(message)
}

fn classify_connect_error(context: &str, message: &str) -> McpError {
    if mentions_auth_failure(message) {
        McpError::Unauthenticated(format!("{context}: {message}"))
    } else {
        McpError::Transport(format!("{context}: {message}"))
    }
}

/// Map a failed `tools/call` onto the error taxonomy
fn classify_call_error(error: ServiceError) -> McpError {
    match error {
        ServiceError::McpError(data) if data.code == ErrorCode::INVALID_PARAMS => {
            McpError::MalformedArguments(data.message.into_owned())
        }
        ServiceError::McpError(data) if mentions_auth_failure(&data.message) => {
            McpError::Unauthenticated(data.message.into_owned())
        }
        ServiceError::McpError(data) => McpError::Execution(data.message.into_owned()),
        ServiceError::Timeout { timeout } => McpError::Timeout(timeout),
        other => classify_connect_error("tool call failed", &other.to_string()),
    }
}

/// Build the HTTP client a transport uses, carrying any configured credentials
async fn build_reqwest_client(auth: Option<&McpAuthConfig>) -> Result<reqwest::Client, McpError> {
    use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

    let headers = match auth {
        None => HeaderMap::new(),
        Some(McpAuthConfig::Token { token }) => {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| McpError::Transport(format!("invalid auth token: {e}")))?;
            value.set_sensitive(true);
            HeaderMap::from_iter([(AUTHORIZATION, value)])
        }
        Some(McpAuthConfig::Session(session)) => super::session::sign_in(session).await?,
    };

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| McpError::Transport(format!("failed to build HTTP client: {e}")))
}
