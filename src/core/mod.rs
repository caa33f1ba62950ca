//! Core module containing shared infrastructure components.
//!
//! Configuration, the process-level error type, the [`McpServer`] that owns
//! the tool registry, and the transports that expose it.

pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
