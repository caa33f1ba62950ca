//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Ways a transport can fail to start or stop serving.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP listener could not be bound.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),

    /// The MCP handshake over stdio did not complete.
    #[error("MCP handshake failed: {0}")]
    Handshake(String),

    /// The stdio session ended abnormally.
    #[error("MCP session failed: {0}")]
    Session(String),
}

impl TransportError {
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }
}
