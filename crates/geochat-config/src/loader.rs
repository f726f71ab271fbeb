use std::path::Path;

use secrecy::ExposeSecret;

use crate::{Config, McpAuthConfig, McpServerType};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_llm_config()?;
        self.validate_chat_config()?;
        self.validate_mcp_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_llm_config(&self) -> anyhow::Result<()> {
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must not be empty");
        }

        if let Some(temperature) = self.llm.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            anyhow::bail!("llm.temperature must be between 0 and 2, got {temperature}");
        }

        self.llm.request_timeout()?;

        Ok(())
    }

    fn validate_chat_config(&self) -> anyhow::Result<()> {
        if self.chat.tools_prompt.trim().is_empty() {
            anyhow::bail!("chat.tools_prompt must not be empty");
        }

        if self.chat.plain_prompt.trim().is_empty() {
            anyhow::bail!("chat.plain_prompt must not be empty");
        }

        Ok(())
    }

    fn validate_mcp_config(&self) -> anyhow::Result<()> {
        if self.mcp.connect_timeout()?.is_zero() {
            anyhow::bail!("mcp.connect_timeout must be greater than 0");
        }

        if let Some(call_timeout) = self.mcp.call_timeout()?
            && call_timeout.is_zero()
        {
            anyhow::bail!("mcp.call_timeout must be greater than 0");
        }

        for (name, server) in &self.mcp.servers {
            let auth = match &server.server_type {
                McpServerType::Stdio(stdio) => {
                    if stdio.command.trim().is_empty() {
                        anyhow::bail!("MCP server '{name}' has an empty command");
                    }
                    None
                }
                McpServerType::Sse(http) | McpServerType::StreamableHttp(http) => http.auth.as_ref(),
            };

            if let Some(McpAuthConfig::Session(session)) = auth {
                if session.username.trim().is_empty() {
                    anyhow::bail!("MCP server '{name}' session auth requires a username");
                }
                if session.password.expose_secret().is_empty() {
                    anyhow::bail!("MCP server '{name}' session auth requires a password");
                }
            }
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let Some(tracing) = self.telemetry.as_ref().and_then(|t| t.tracing.as_ref()) else {
            return Ok(());
        };

        if !(0.0..=1.0).contains(&tracing.sampling_rate) {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0 and 1");
        }

        Ok(())
    }
}
