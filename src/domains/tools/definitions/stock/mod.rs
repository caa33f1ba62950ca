//! Alpha Vantage stock tools.
//!
//! - `quote`: latest price and trading data for one symbol
//! - `search`: symbol lookup by company name or keywords
//!
//! Alpha Vantage answers 200 even when a call failed; the failure is reported
//! through an `Error Message` or `Note` key in the body, checked here before
//! any normalization.

pub mod quote;
pub mod search;

pub use quote::{GetStockPriceTool, PriceInfo, StockQuote, TradingInfo};
pub use search::{SearchStocksTool, SymbolMatch, SymbolSearch};

use serde_json::{Map, Value};

use crate::domains::tools::error::StructuredError;
use crate::domains::tools::upstream::UpstreamCall;

const API_NAME: &str = "Alpha Vantage";

fn query_url(base_url: &str) -> String {
    format!("{}/query", base_url.trim_end_matches('/'))
}

/// In-body failure signaled by Alpha Vantage.
#[derive(Debug, PartialEq)]
enum Notice {
    ErrorMessage(String),
    RateLimited,
}

fn notice(body: &Map<String, Value>) -> Option<Notice> {
    if let Some(message) = body.get("Error Message") {
        let message = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Some(Notice::ErrorMessage(message));
    }
    if body.contains_key("Note") {
        return Some(Notice::RateLimited);
    }
    None
}

/// String field of an Alpha Vantage record, or `default` when absent.
fn text_field(record: &Map<String, Value>, key: &str, default: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Numeric field of an Alpha Vantage record (sent as a string).
///
/// Absent fields read as zero; anything unparsable is an upstream failure.
fn numeric_field<T>(
    record: &Map<String, Value>,
    key: &str,
    call: UpstreamCall<'_>,
) -> Result<T, StructuredError>
where
    T: std::str::FromStr + Default,
{
    let raw = match record.get(key) {
        None | Some(Value::Null) => return Ok(T::default()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    };
    raw.parse::<T>().map_err(|_| {
        StructuredError::upstream_failure(
            call.api,
            call.operation,
            format!("field '{key}' is not numeric: {raw}"),
        )
        .with_data("field", key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ErrorCode;
    use serde_json::json;

    const CALL: UpstreamCall<'static> = UpstreamCall {
        api: API_NAME,
        operation: "test",
    };

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_notice_detection() {
        assert_eq!(
            notice(&record(json!({ "Error Message": "bad" }))),
            Some(Notice::ErrorMessage("bad".to_string()))
        );
        assert_eq!(
            notice(&record(json!({ "Note": "Thank you for using Alpha Vantage!" }))),
            Some(Notice::RateLimited)
        );
        assert_eq!(notice(&record(json!({ "Global Quote": {} }))), None);
    }

    #[test]
    fn test_numeric_field_defaults_and_failures() {
        let r = record(json!({ "05. price": "189.8400", "06. volume": "bad" }));
        assert_eq!(numeric_field::<f64>(&r, "05. price", CALL).unwrap(), 189.84);
        assert_eq!(numeric_field::<f64>(&r, "02. open", CALL).unwrap(), 0.0);

        let err = numeric_field::<u64>(&r, "06. volume", CALL).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalApiError);
        assert_eq!(err.data_value("field"), Some(&json!("06. volume")));
    }
}
