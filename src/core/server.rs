//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] owns the tool registry and the dispatcher. Every transport
//! goes through it: the stdio transport via rmcp's [`ServerHandler`], the
//! HTTP front ends via the inherent methods.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::Value;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::{
    Arguments, Dispatcher, Invocation, StructuredError, ToolDescriptor, ToolOutcome, ToolRegistry,
    build_registry,
};

const INSTRUCTIONS: &str = "Aggregates weather (OpenWeatherMap), news (News API) and stock market \
                            (Alpha Vantage) data. Only tools whose API key is configured are listed.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registry-backed dispatcher shared by every transport.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Create a server whose tools follow the configured credentials.
    pub fn new(config: Config) -> Self {
        let registry = build_registry(&config);
        Self::with_registry(config, registry)
    }

    /// Create a server around an already built registry.
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(Arc::new(registry)),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Registered tools, in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.dispatcher.registry().list()
    }

    /// Whether `name` is a registered tool.
    pub fn has_tool(&self, name: &str) -> bool {
        self.dispatcher.registry().contains(name)
    }

    /// Run a tool and return the protocol-neutral envelope.
    pub async fn invoke(&self, name: &str, arguments: Arguments) -> ToolOutcome {
        self.dispatcher
            .invoke(Invocation::new(name, arguments))
            .await
    }

    /// Run a tool and render success as an MCP `CallToolResult`.
    pub async fn call(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> Result<CallToolResult, StructuredError> {
        match self.invoke(name, arguments).await {
            ToolOutcome::Success { data, summary } => Ok(tool_result(data, summary)),
            ToolOutcome::Failure(err) => Err(err),
        }
    }

    /// Initialize payload shared by the stdio and HTTP handshakes.
    pub fn info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = self.name().to_string();
        server_info.version = self.version().to_string();

        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            ..Default::default()
        }
    }
}

/// `CallToolResult` carrying the readable summary and the structured data.
fn tool_result(data: Value, summary: String) -> CallToolResult {
    let mut result = CallToolResult::success(vec![Content::text(summary)]);
    result.structured_content = Some(data);
    result
}

impl From<StructuredError> for McpError {
    fn from(err: StructuredError) -> Self {
        McpError::new(
            rmcp::model::ErrorCode(err.code.code()),
            err.message,
            err.data.map(Value::Object),
        )
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        self.info()
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.descriptors().into_iter().map(ToolDescriptor::to_tool).collect(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        self.call(&request.name, arguments)
            .await
            .map_err(McpError::from)
    }
}
