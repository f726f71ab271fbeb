use std::collections::HashMap;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Tool server configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    /// Tool servers keyed by name, connected in declaration order
    #[serde(default)]
    pub servers: IndexMap<String, McpServerConfig>,
    /// Upper bound on connecting to and listing one server (e.g. "10s")
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
    /// Upper bound on a single tool invocation; unbounded when unset
    #[serde(default)]
    pub call_timeout: Option<String>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            servers: IndexMap::new(),
            connect_timeout: default_connect_timeout(),
            call_timeout: None,
        }
    }
}

impl McpConfig {
    /// Parsed connect timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is malformed
    pub fn connect_timeout(&self) -> anyhow::Result<std::time::Duration> {
        crate::parse_duration("mcp.connect_timeout", &self.connect_timeout)
    }

    /// Parsed per-invocation timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is malformed
    pub fn call_timeout(&self) -> anyhow::Result<Option<std::time::Duration>> {
        self.call_timeout
            .as_deref()
            .map(|value| crate::parse_duration("mcp.call_timeout", value))
            .transpose()
    }
}

/// Configuration for a single tool server
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpServerConfig {
    /// Server transport type
    #[serde(rename = "type")]
    pub server_type: McpServerType,
}

/// Tool server transport types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpServerType {
    /// STDIO subprocess
    Stdio(StdioConfig),
    /// HTTP with SSE
    Sse(HttpConfig),
    /// HTTP with streamable protocol
    StreamableHttp(HttpConfig),
}

/// STDIO transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StdioConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Server URL
    pub url: Url,
    /// Authentication configuration
    #[serde(default)]
    pub auth: Option<McpAuthConfig>,
}

/// Tool server authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpAuthConfig {
    /// Static bearer token
    Token { token: SecretString },
    /// Form sign-in that yields a session cookie and XSRF token
    Session(SessionAuthConfig),
}

/// Credentials for form-based session sign-in
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionAuthConfig {
    /// Sign-in endpoint; fetched once for the XSRF cookie, then posted to
    pub sign_in_url: Url,
    /// Account name
    pub username: String,
    /// Account password
    pub password: SecretString,
}

fn default_connect_timeout() -> String {
    "10s".to_string()
}
