#![allow(clippy::must_use_candidate)]

pub mod chat;
pub mod cors;
mod env;
pub mod health;
pub mod llm;
mod loader;
pub mod mcp;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use chat::*;
pub use cors::*;
pub use health::*;
pub use llm::*;
pub use mcp::*;
pub use server::*;
pub use telemetry::*;

/// Top-level geochat configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Language-model provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Tool server configuration
    #[serde(default)]
    pub mcp: McpConfig,
    /// Conversation behaviour
    #[serde(default)]
    pub chat: ChatConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

/// Parse a human-readable duration such as `"10s"` or `"1m30s"`
///
/// # Errors
///
/// Returns an error naming the offending field when the string does not parse
pub fn parse_duration(field: &str, value: &str) -> anyhow::Result<std::time::Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}
