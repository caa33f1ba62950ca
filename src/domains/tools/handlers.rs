//! Tool handler contract.
//!
//! A handler accepts the raw argument object of a call and produces one of
//! the closed set of normalized result shapes, or a [`ToolError`]. Handlers
//! validate their own arguments; nothing upstream of them enforces the
//! advertised input schema.

use serde::Serialize;
use serde_json::{Map, Value};

use super::definitions::{NewsDigest, StockQuote, SymbolSearch, WeatherReport};
use super::error::{StructuredError, ToolError};

/// Argument object of a tool call.
pub type Arguments = Map<String, Value>;

/// Result type returned by every handler.
pub type HandlerResult = Result<ToolOutput, ToolError>;

/// Normalized result of a successful tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Weather(WeatherReport),
    News(NewsDigest),
    StockQuote(StockQuote),
    StockSearch(SymbolSearch),
}

impl ToolOutput {
    /// Render as a JSON value for the wire.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Human-readable text for clients that only display content blocks.
    pub fn summary(&self) -> String {
        match self {
            ToolOutput::Weather(report) => report.summary(),
            ToolOutput::News(digest) => digest.summary(),
            ToolOutput::StockQuote(quote) => quote.summary(),
            ToolOutput::StockSearch(results) => results.summary(),
        }
    }
}

/// Executable behavior bound to a tool name in the registry.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given arguments.
    async fn call(&self, arguments: Arguments) -> HandlerResult;
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Fail with ApiKeyMissing unless a non-blank key is configured.
pub fn require_api_key<'a>(key: Option<&'a str>, api: &str) -> Result<&'a str, StructuredError> {
    key.filter(|k| !k.trim().is_empty())
        .ok_or_else(|| StructuredError::api_key_missing(api))
}

/// Read an optional string argument. `null` counts as absent.
pub fn optional_str<'a>(
    args: &'a Arguments,
    field: &str,
) -> Result<Option<&'a str>, StructuredError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(StructuredError::invalid_param(
            field,
            other.clone(),
            "must be a string",
        )),
    }
}

/// Read a required string argument and reject it when blank.
///
/// Returns the trimmed value.
pub fn required_str<'a>(
    args: &'a Arguments,
    field: &str,
    missing_reason: &str,
    blank_reason: &str,
) -> Result<&'a str, StructuredError> {
    let value = optional_str(args, field)?
        .ok_or_else(|| StructuredError::invalid_param(field, Value::Null, missing_reason))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StructuredError::invalid_param(field, value, blank_reason));
    }
    Ok(trimmed)
}

/// Read an optional integer argument. `null` counts as absent.
pub fn optional_int(args: &Arguments, field: &str) -> Result<Option<i64>, StructuredError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| {
                StructuredError::invalid_param(field, value.clone(), "must be an integer")
            }),
    }
}
