//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use geochat_config::{
    ChatConfig, Config, CorsConfig, HealthConfig, HttpConfig, LlmConfig, McpConfig, McpServerConfig, McpServerType,
    ServerConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                llm: LlmConfig::default(),
                mcp: McpConfig {
                    connect_timeout: "2s".to_owned(),
                    ..McpConfig::default()
                },
                chat: ChatConfig::default(),
                telemetry: None,
            },
        }
    }

    /// Point the model provider at a mock OpenAI-compatible backend
    pub fn with_openai(mut self, base_url: &str) -> Self {
        self.config.llm.api_key = Some(SecretString::from("test-key"));
        self.config.llm.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    /// Add a streamable HTTP tool server
    pub fn with_tool_server(mut self, name: &str, url: &str) -> Self {
        self.config.mcp.servers.insert(
            name.to_owned(),
            McpServerConfig {
                server_type: McpServerType::StreamableHttp(HttpConfig {
                    url: url.parse().expect("valid URL"),
                    auth: None,
                }),
            },
        );
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
