//! API Aggregator MCP Server Library
//!
//! Exposes weather (OpenWeatherMap), news (News API) and stock market
//! (Alpha Vantage) data as MCP tools, over stdio or HTTP.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the server and its transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: error taxonomy, registry, dispatcher and the tool definitions
//!
//! # Example
//!
//! ```rust,no_run
//! use api_aggregator_mcp::{Config, McpServer, core::TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let transport = TransportService::new(config.transport.clone());
//!     transport.run(McpServer::new(config)).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
