//! Transport configuration types.

use serde::{Deserialize, Serialize};

use crate::core::config::parse_bool;
use crate::core::error::{Error, Result};

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport for desktop MCP clients.
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport: resource-style endpoints and/or JSON-RPC over POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// Which HTTP front ends are mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// `GET /tools` and `POST /tools/{name}`.
    Resource,
    /// JSON-RPC on the configured path.
    Rpc,
    #[default]
    Both,
}

impl ServeMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "resource" | "rest" => Some(Self::Resource),
            "rpc" | "mcp" => Some(Self::Rpc),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Rpc => "rpc",
            Self::Both => "both",
        }
    }

    pub fn serves_resource(self) -> bool {
        matches!(self, Self::Resource | Self::Both)
    }

    pub fn serves_rpc(self) -> bool {
        matches!(self, Self::Rpc | Self::Both)
    }
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Front ends to mount.
    #[serde(default)]
    pub mode: ServeMode,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "localhost".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            mode: ServeMode::default(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Bind address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "http")]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(all(not(feature = "http"), feature = "stdio"))]
        {
            return Self::Stdio;
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

impl TransportConfig {
    /// Load transport config through a variable lookup.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = lookup("MCP_TRANSPORT")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "" | "http" => {
                let defaults = HttpConfig::default();
                let port = match lookup("MCP_SERVER_PORT") {
                    Some(raw) => raw.trim().parse().map_err(|_| {
                        Error::config(format!("MCP_SERVER_PORT must be a port number, got '{raw}'"))
                    })?,
                    None => defaults.port,
                };
                let mode = match lookup("MCP_SERVE_MODE") {
                    Some(raw) => ServeMode::parse(&raw).ok_or_else(|| {
                        Error::config(format!(
                            "MCP_SERVE_MODE must be one of resource, rpc, both; got '{raw}'"
                        ))
                    })?,
                    None => defaults.mode,
                };
                let enable_cors = match lookup("MCP_HTTP_CORS") {
                    Some(raw) => parse_bool("MCP_HTTP_CORS", &raw)?,
                    None => defaults.enable_cors,
                };
                let rpc_path = match lookup("MCP_HTTP_PATH") {
                    Some(raw) => rpc_path(&raw)?,
                    None => defaults.rpc_path,
                };

                Ok(Self::Http(HttpConfig {
                    port,
                    host: lookup("MCP_SERVER_HOST").unwrap_or(defaults.host),
                    rpc_path,
                    enable_cors,
                    mode,
                }))
            }
            #[cfg(feature = "stdio")]
            "stdio" => Ok(Self::Stdio),
            #[cfg(all(not(feature = "http"), feature = "stdio"))]
            "" => Ok(Self::Stdio),
            other => Err(Error::config(format!(
                "MCP_TRANSPORT '{other}' is unknown or not compiled in"
            ))),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!(
                "HTTP on {} (mode: {}, RPC path: {})",
                cfg.address(),
                cfg.mode.as_str(),
                cfg.rpc_path
            ),
        }
    }

}

/// Routes that are always mounted next to the JSON-RPC endpoint.
#[cfg(feature = "http")]
const RESERVED_PATHS: [&str; 3] = ["/", "/health", "/tools"];

/// The router panics on a path without a leading slash or one that
/// overlaps a fixed route, so both are rejected here.
#[cfg(feature = "http")]
fn rpc_path(raw: &str) -> Result<String> {
    let path = raw.trim();
    if !path.starts_with('/') {
        return Err(Error::config(format!(
            "MCP_HTTP_PATH must start with '/', got '{raw}'"
        )));
    }
    if RESERVED_PATHS.contains(&path) || path.starts_with("/tools/") {
        return Err(Error::config(format!(
            "MCP_HTTP_PATH '{raw}' collides with a built-in route"
        )));
    }
    Ok(path.to_string())
}
