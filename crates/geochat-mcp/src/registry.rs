//! Discovered tools, merged across servers and cached for the process lifetime

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use geochat_config::McpConfig;
use indexmap::IndexMap;
use serde::Serialize;

use crate::downstream::McpClient;
use crate::error::McpError;
use crate::server::{ToolDescriptor, ToolServer};

/// The model-facing projection of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolDescriptor> for ModelFunctionSpec {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameters: descriptor.parameters.clone(),
        }
    }
}

type ServerListing = Result<(Arc<dyn ToolServer>, Vec<ToolDescriptor>), McpError>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    server: Arc<dyn ToolServer>,
}

/// Immutable snapshot of every tool the connected servers advertise
///
/// Built once at startup and shared read-only between turns.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Registry with no tools; the service runs in degraded mode
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connect to every configured server and collect its tools
    ///
    /// Each server gets `connect_timeout` to handshake and list. Servers that
    /// fail are skipped; if all of them fail the result is `Unavailable`.
    /// A tool name advertised twice is `DuplicateTool`.
    pub async fn connect(config: &McpConfig) -> Result<Self, McpError> {
        let connect_timeout = config.connect_timeout()?;

        let attempts = config.servers.iter().map(|(name, server)| async move {
            let connected = tokio::time::timeout(connect_timeout, async {
                let client = McpClient::connect(name, &server.server_type).await?;
                let tools = client.list_tools().await?;
                Ok::<_, McpError>((Arc::new(client) as Arc<dyn ToolServer>, tools))
            })
            .await
            .unwrap_or_else(|_| Err(McpError::Timeout(connect_timeout)));

            (name.clone(), connected)
        });

        Self::assemble(join_all(attempts).await)
    }

    /// Build a registry from already-connected servers, bounding each listing by `timeout`
    pub async fn from_servers(servers: Vec<Arc<dyn ToolServer>>, timeout: Duration) -> Result<Self, McpError> {
        let listings = servers.into_iter().map(|server| async move {
            let name = server.name().to_owned();
            let listed = tokio::time::timeout(timeout, server.list_tools())
                .await
                .unwrap_or_else(|_| Err(McpError::Timeout(timeout)));

            (name, listed.map(|tools| (server, tools)))
        });

        Self::assemble(join_all(listings).await)
    }

    fn assemble(outcomes: Vec<(String, ServerListing)>) -> Result<Self, McpError> {
        let attempted = outcomes.len();
        let mut registry = Self::default();
        let mut failures = Vec::new();

        for (name, outcome) in outcomes {
            match outcome {
                Ok((server, tools)) => {
                    tracing::info!(server = %name, tools = tools.len(), "registered tools");
                    for descriptor in tools {
                        registry.register(descriptor, Arc::clone(&server))?;
                    }
                }
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "tool server unavailable, skipping");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if attempted > 0 && failures.len() == attempted {
            return Err(McpError::Unavailable(failures.join("; ")));
        }

        Ok(registry)
    }

    fn register(&mut self, descriptor: ToolDescriptor, server: Arc<dyn ToolServer>) -> Result<(), McpError> {
        if let Some(existing) = self.tools.get(&descriptor.name) {
            return Err(McpError::DuplicateTool {
                tool: descriptor.name,
                first: existing.server.name().to_owned(),
                second: server.name().to_owned(),
            });
        }

        self.tools
            .insert(descriptor.name.clone(), RegisteredTool { descriptor, server });
        Ok(())
    }

    /// Tool specs in the model's function-calling shape, in discovery order
    pub fn list_tool_specs(&self) -> Vec<ModelFunctionSpec> {
        self.tools
            .values()
            .map(|tool| ModelFunctionSpec::from(&tool.descriptor))
            .collect()
    }

    /// Whether at least one tool is cached
    pub fn is_ready(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Every tool with the name of the server that advertised it
    pub fn tools(&self) -> impl Iterator<Item = (&ToolDescriptor, &str)> {
        self.tools
            .values()
            .map(|tool| (&tool.descriptor, tool.server.name()))
    }

    /// Server that advertised `tool`
    pub fn server_for(&self, tool: &str) -> Option<&Arc<dyn ToolServer>> {
        self.tools.get(tool).map(|registered| &registered.server)
    }
}
