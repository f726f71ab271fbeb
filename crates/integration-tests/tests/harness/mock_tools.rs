//! Mock catalogue tool server speaking MCP over streamable HTTP

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::Router;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ListToolsResult, PaginatedRequestParam, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData, RoleServer, ServerHandler};
use tokio_util::sync::CancellationToken;

/// Tool server exposing `search_catalogue` and `get_record`
pub struct MockToolServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    calls: Arc<AtomicU32>,
}

#[derive(Clone)]
struct CatalogueTools {
    calls: Arc<AtomicU32>,
}

impl MockToolServer {
    pub async fn start() -> anyhow::Result<Self> {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = CatalogueTools {
            calls: Arc::clone(&calls),
        };

        let service = StreamableHttpService::new(
            move || Ok(handler.clone()),
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig::default(),
        );
        let app = Router::new().nest_service("/mcp", service);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, calls })
    }

    /// Endpoint to configure as a streamable HTTP tool server
    pub fn url(&self) -> String {
        format!("http://{}/mcp", self.addr)
    }

    /// Number of tool invocations received
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Drop for MockToolServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn query_schema() -> Arc<serde_json::Map<String, serde_json::Value>> {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {"query": {"type": "string"}},
        "required": ["query"]
    });

    Arc::new(serde_json::from_value(schema).unwrap())
}

impl ServerHandler for CatalogueTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(vec![
            Tool::new("search_catalogue", "Search catalogue records", query_schema()),
            Tool::new("get_record", "Fetch one catalogue record by id", query_schema()),
        ]))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        match request.name.as_ref() {
            "search_catalogue" => Ok(CallToolResult::success(vec![Content::text("Found 3 results...")])),
            "get_record" => Ok(CallToolResult::error(vec![Content::text("record not found")])),
            other => Err(ErrorData::invalid_params(format!("unknown tool {other}"), None)),
        }
    }
}
