//! Tool error taxonomy.
//!
//! Every failure that leaves the tools domain is a [`StructuredError`] carrying
//! one of the closed [`ErrorCode`] kinds. Protocol-level codes follow JSON-RPC;
//! application codes live in the `-32001..=-32005` range.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Closed set of error kinds with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ErrorCode {
    /// Malformed request envelope.
    ParseError,
    /// Envelope structurally invalid.
    InvalidRequest,
    /// Requested tool or method is not registered.
    MethodNotFound,
    /// An argument failed validation.
    InvalidParams,
    /// Unexpected failure inside the server itself.
    InternalError,
    /// Upstream credential not configured.
    ApiKeyMissing,
    /// Upstream rejected the credential.
    ApiKeyInvalid,
    /// Upstream failed in a way not covered by another kind.
    ExternalApiError,
    /// Upstream signaled throttling.
    RateLimitExceeded,
    /// Tool exists in principle but is disabled.
    ToolNotAvailable,
}

impl ErrorCode {
    /// All kinds, in code order within each range.
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::ParseError,
        ErrorCode::InvalidRequest,
        ErrorCode::MethodNotFound,
        ErrorCode::InvalidParams,
        ErrorCode::InternalError,
        ErrorCode::ApiKeyMissing,
        ErrorCode::ApiKeyInvalid,
        ErrorCode::ExternalApiError,
        ErrorCode::RateLimitExceeded,
        ErrorCode::ToolNotAvailable,
    ];

    /// Numeric wire code.
    pub const fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ApiKeyMissing => -32001,
            ErrorCode::ApiKeyInvalid => -32002,
            ErrorCode::ExternalApiError => -32003,
            ErrorCode::RateLimitExceeded => -32004,
            ErrorCode::ToolNotAvailable => -32005,
        }
    }

    /// Whether this kind belongs to the JSON-RPC protocol range.
    pub const fn is_protocol_error(self) -> bool {
        self.code() <= -32600
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or_else(|| format!("unknown error code: {value}"))
    }
}

/// The structured error payload shared by every front end.
///
/// Built at the failure site and passed through unchanged; the `with_*`
/// builders are meant for construction only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct StructuredError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl StructuredError {
    /// Create an error with no contextual data.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a contextual key/value pair.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a contextual value.
    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::ParseError, "Parse error").with_data("detail", detail.to_string())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// The named tool (or RPC method) is not registered.
    pub fn tool_not_found(name: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("Tool '{name}' not found"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("Unknown method: {method}"))
    }

    /// An argument failed validation; records the field and the value received.
    pub fn invalid_param(field: &str, value: impl Into<Value>, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidParams,
            format!("Invalid parameter '{field}': {reason}"),
        )
        .with_data("field", field)
        .with_data("value", value)
    }

    /// Unexpected failure; the original description is kept for diagnostics only.
    pub fn internal(original: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
            .with_data("original_error", original.to_string())
    }

    pub fn api_key_missing(api: &str) -> Self {
        Self::new(ErrorCode::ApiKeyMissing, format!("API key missing for {api}"))
            .with_data("api", api)
    }

    pub fn api_key_invalid(api: &str) -> Self {
        Self::new(ErrorCode::ApiKeyInvalid, format!("Invalid {api} API key")).with_data("api", api)
    }

    pub fn rate_limited(api: &str) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, format!("{api} rate limit exceeded"))
            .with_data("api", api)
    }

    /// Upstream answered with a status not covered by a more specific kind.
    pub fn upstream_status(api: &str, status: u16, response: Value) -> Self {
        Self::new(ErrorCode::ExternalApiError, format!("{api} API error: {status}"))
            .with_data("status_code", status)
            .with_data("response", response)
    }

    /// Transport, timeout or decoding failure while talking to an upstream.
    pub fn upstream_failure(api: &str, operation: &str, original: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::ExternalApiError,
            format!("External API error: {api} {operation} failed"),
        )
        .with_data("api", api)
        .with_data("operation", operation)
        .with_data("original_error", original.to_string())
    }
}

/// Failure returned by a tool handler.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A failure already expressed in the taxonomy.
    #[error(transparent)]
    Structured(#[from] StructuredError),

    /// Anything else; downgraded to InternalError by the dispatcher.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Collapse into the taxonomy.
    pub fn into_structured(self) -> StructuredError {
        match self {
            ToolError::Structured(err) => err,
            ToolError::Internal(original) => StructuredError::internal(original),
        }
    }
}
