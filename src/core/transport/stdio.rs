//! STDIO transport implementation.
//!
//! Serves the registry to desktop MCP clients over stdin/stdout through
//! rmcp. Logs go to stderr so they never corrupt the protocol stream.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run until the client closes stdin.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!(
            tools = server.descriptors().len(),
            "Ready - communicating via stdin/stdout"
        );

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::Session(e.to_string()))?;

        info!("STDIO transport finished: {:?}", reason);
        Ok(())
    }
}
