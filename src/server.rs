//! Tool-calling server boundary: an MCP server over streamable HTTP at
//! `/mcp`, advertising and dispatching the registered tools.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::tools::ToolRegistry;

/// MCP handler backed by a [`ToolRegistry`]. Cloned once per session.
#[derive(Clone)]
pub struct MemoryToolServer {
    tools: Arc<ToolRegistry>,
}

impl MemoryToolServer {
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }

    /// Tool definitions as advertised by `tools/list`. Schemas that do not
    /// describe a valid MCP tool are skipped with a warning.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools
            .schemas()
            .into_iter()
            .filter_map(|schema| match serde_json::from_value::<Tool>(schema) {
                Ok(tool) => Some(tool),
                Err(e) => {
                    warn!(error = %e, "skipping malformed tool schema");
                    None
                }
            })
            .collect()
    }

    /// Run a tool. Failures are reported in-band with `isError`, never as
    /// a protocol error.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let input = Value::Object(arguments.unwrap_or_default());
        match self.tools.execute(name, &input).await {
            Ok(output) => CallToolResult::structured(output),
            Err(message) => {
                warn!(tool = name, error = %message, "tool call failed");
                CallToolResult::error(vec![Content::text(message)])
            }
        }
    }
}

impl ServerHandler for MemoryToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Use get_contextual_memory before answering and add_to_memory to remember \
                 facts about the user."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.call(&request.name, request.arguments).await)
    }
}

/// Router exposing the MCP endpoint at `/mcp`. Cancelling `cancel` ends
/// every open session stream.
pub fn router(tools: ToolRegistry, cancel: CancellationToken) -> Router {
    let server = MemoryToolServer::new(tools);
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: cancel,
            ..Default::default()
        },
    );
    Router::new().nest_service("/mcp", service)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    tools: ToolRegistry,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, tools = ?tools.tool_names(), "tool server listening");
    }
    let cancel = CancellationToken::new();
    let app = router(tools, cancel.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            // Open SSE streams would otherwise hold the graceful shutdown.
            cancel.cancel();
        })
        .await
}
