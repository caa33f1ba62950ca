//! Configuration management for the MCP server.
//!
//! An immutable [`Config`] is built once at startup and shared by `Arc`.
//! Loading goes through a plain key lookup so it can be exercised without
//! touching the process environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::transport::TransportConfig;
use crate::domains::tools::upstream::UpstreamClient;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Upstream API credentials.
    pub credentials: CredentialsConfig,

    /// Upstream endpoints and client settings.
    pub upstream: UpstreamConfig,

    /// Inbound authentication for the HTTP transport.
    pub auth: AuthConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// Verbose logging and HTTP request tracing.
    pub debug: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// API keys for the aggregated upstream services.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// OpenWeatherMap key, enables `get_weather`.
    pub openweather_api_key: Option<String>,

    /// News API key, enables `get_news`.
    pub news_api_key: Option<String>,

    /// Alpha Vantage key, enables `get_stock_price` and `search_stocks`.
    pub alpha_vantage_api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field(
                "openweather_api_key",
                &self.openweather_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "alpha_vantage_api_key",
                &self.alpha_vantage_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Upstream base URLs and request timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub weather_base_url: String,
    pub news_base_url: String,
    pub stock_base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Client used by every tool handler.
    pub fn client(&self) -> UpstreamClient {
        UpstreamClient::new(Duration::from_secs(self.timeout_secs))
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            weather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            news_base_url: "https://newsapi.org/v2".to_string(),
            stock_base_url: "https://www.alphavantage.co".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Shared-key authentication for HTTP clients.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "api-aggregator-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                debug: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            upstream: UpstreamConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment, after `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults; unparsable ones are an error
    /// naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = non_blank(lookup("MCP_SERVER_NAME")) {
            config.server.name = name;
        }
        if let Some(raw) = lookup("MCP_SERVER_DEBUG") {
            config.server.debug = parse_bool("MCP_SERVER_DEBUG", &raw)?;
        }

        config.logging.level = non_blank(lookup("LOG_LEVEL"))
            .or_else(|| non_blank(lookup("MCP_LOG_LEVEL")))
            .unwrap_or_else(|| {
                let level = if config.server.debug { "debug" } else { "info" };
                level.to_string()
            });

        config.transport = TransportConfig::from_lookup(&lookup)?;

        config.credentials = CredentialsConfig {
            openweather_api_key: non_blank(lookup("OPENWEATHER_API_KEY")),
            news_api_key: non_blank(lookup("NEWS_API_KEY")),
            alpha_vantage_api_key: non_blank(lookup("ALPHA_VANTAGE_API_KEY")),
        };

        if let Some(url) = non_blank(lookup("MCP_WEATHER_BASE_URL")) {
            config.upstream.weather_base_url = url;
        }
        if let Some(url) = non_blank(lookup("MCP_NEWS_BASE_URL")) {
            config.upstream.news_base_url = url;
        }
        if let Some(url) = non_blank(lookup("MCP_STOCK_BASE_URL")) {
            config.upstream.stock_base_url = url;
        }
        if let Some(raw) = lookup("MCP_UPSTREAM_TIMEOUT_SECS") {
            config.upstream.timeout_secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(Error::config(format!(
                        "MCP_UPSTREAM_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                    )));
                }
            };
        }

        if let Some(raw) = lookup("MCP_AUTH_ENABLED") {
            config.auth.enabled = parse_bool("MCP_AUTH_ENABLED", &raw)?;
        }
        config.auth.api_key = non_blank(lookup("MCP_API_KEY"));

        Ok(config)
    }

    /// Upstream APIs with a configured key, in registration order.
    pub fn available_apis(&self) -> Vec<&'static str> {
        let credentials = &self.credentials;
        [
            ("weather", credentials.openweather_api_key.is_some()),
            ("news", credentials.news_api_key.is_some()),
            ("stock", credentials.alpha_vantage_api_key.is_some()),
        ]
        .into_iter()
        .filter_map(|(api, configured)| configured.then_some(api))
        .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a boolean flag the way shells usually spell them.
pub(crate) fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::config(format!("{var} must be a boolean, got '{raw}'"))),
    }
}
