//! Transport layer for the MCP server.
//!
//! - **STDIO**: rmcp over stdin/stdout for desktop clients - feature: `stdio`
//! - **HTTP**: resource-style endpoints plus JSON-RPC over POST - feature: `http`
//!
//! Both delegate every tool operation to [`McpServer`](crate::core::McpServer).

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::{ServeMode, TransportConfig};
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
