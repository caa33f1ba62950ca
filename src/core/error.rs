//! Error types and handling for the MCP server.
//!
//! Tool failures never reach this type: they are [`StructuredError`]s
//! carried inside the invocation envelope. This enum covers the process
//! level, i.e. configuration, transports and startup.
//!
//! [`StructuredError`]: crate::domains::tools::StructuredError

use thiserror::Error;

use super::transport::TransportError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified process-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure to start or run a transport.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
