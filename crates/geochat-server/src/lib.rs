mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use geochat_chat::ConversationOrchestrator;
use geochat_config::{Config, McpConfig};
use geochat_llm::{OpenAiProvider, Provider};
use geochat_mcp::{McpError, ToolInvoker, ToolRegistry};
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Tool servers are contacted here, once. If none of them answer the
    /// server still starts and chats without tools.
    ///
    /// # Errors
    ///
    /// Returns an error if the model provider cannot be built or two tool
    /// servers advertise the same tool name
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();

        let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(&config.llm)?);
        let registry = connect_tools(&config.mcp).await?;
        let tools_ready = registry.is_ready();

        let invoker = ToolInvoker::new(registry, config.mcp.call_timeout()?);
        let orchestrator = ConversationOrchestrator::new(provider, invoker, &config.llm, &config.chat);

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(
                &config.server.health.path,
                axum::routing::get(health::health_handler).with_state(health::HealthState { tools_ready }),
            );
        }

        app = app.merge(geochat_chat::chat_router(Arc::new(orchestrator)));

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Discover tools, falling back to an empty registry when no server answers
async fn connect_tools(config: &McpConfig) -> anyhow::Result<Arc<ToolRegistry>> {
    let registry = match ToolRegistry::connect(config).await {
        Ok(registry) => registry,
        Err(e @ McpError::DuplicateTool { .. }) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "no tool server available, chatting without tools");
            ToolRegistry::disconnected()
        }
    };

    if registry.is_ready() {
        tracing::info!(tools = registry.tools().count(), "tool registry ready");
    } else if config.servers.is_empty() {
        tracing::info!("no tool servers configured");
    }

    Ok(Arc::new(registry))
}
