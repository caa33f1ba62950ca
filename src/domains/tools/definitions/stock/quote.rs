//! Alpha Vantage `GLOBAL_QUOTE` tool.

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;

use super::{API_NAME, Notice, notice, numeric_field, query_url, text_field};
use crate::core::config::Config;
use crate::domains::tools::error::{ErrorCode, StructuredError};
use crate::domains::tools::handlers::{
    Arguments, HandlerResult, ToolHandler, ToolOutput, require_api_key, required_str,
};
use crate::domains::tools::registry::ToolDescriptor;
use crate::domains::tools::upstream::{UpstreamCall, UpstreamClient};

const CALL: UpstreamCall<'static> = UpstreamCall {
    api: API_NAME,
    operation: "get_stock_quote",
};

/// Normalized stock quote.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct StockQuote {
    pub symbol: String,
    pub price: PriceInfo,
    pub trading: TradingInfo,
    pub last_trading_day: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PriceInfo {
    pub current: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TradingInfo {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

impl StockQuote {
    /// Readable rendering shown to MCP clients.
    pub fn summary(&self) -> String {
        let price = &self.price;
        let trading = &self.trading;
        let sign = if price.change < 0.0 { "-" } else { "+" };
        let percent = if price.change_percent.starts_with('-') {
            price.change_percent.clone()
        } else {
            format!("+{}", price.change_percent)
        };

        let mut output = format!("Stock Quote for {}\n\n", self.symbol);
        output.push_str(&format!("Current Price: ${:.2}\n", price.current));
        output.push_str(&format!(
            "Change: {sign}${:.2} ({percent})\n",
            price.change.abs()
        ));
        output.push_str(&format!("Previous Close: ${:.2}\n\n", price.previous_close));
        output.push_str("Day's Trading:\n");
        output.push_str(&format!("   Open: ${:.2}\n", trading.open));
        output.push_str(&format!("   High: ${:.2}\n", trading.high));
        output.push_str(&format!("   Low: ${:.2}\n", trading.low));
        output.push_str(&format!("   Volume: {}\n\n", group_thousands(trading.volume)));
        output.push_str(&format!("Last Trading Day: {}\n", self.last_trading_day));
        output.push_str(&format!("Data from {}", self.source));
        output
    }
}

/// `3958512` -> `3,958,512`.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn normalize(body: &Map<String, Value>, symbol: &str) -> Result<StockQuote, StructuredError> {
    match notice(body) {
        Some(Notice::ErrorMessage(message)) => {
            return Err(StructuredError::new(
                ErrorCode::InvalidParams,
                format!("Invalid stock symbol: {symbol}"),
            )
            .with_data("symbol", symbol)
            .with_data("error", message));
        }
        Some(Notice::RateLimited) => return Err(StructuredError::rate_limited(API_NAME)),
        None => {}
    }

    let quote = match body.get("Global Quote") {
        Some(Value::Object(quote)) if !quote.is_empty() => quote,
        _ => {
            return Err(StructuredError::new(
                ErrorCode::ExternalApiError,
                format!("No data available for symbol: {symbol}"),
            )
            .with_data("symbol", symbol));
        }
    };

    let change_percent = text_field(quote, "10. change percent", "0%").replace('%', "");

    Ok(StockQuote {
        symbol: text_field(quote, "01. symbol", symbol),
        price: PriceInfo {
            current: numeric_field(quote, "05. price", CALL)?,
            previous_close: numeric_field(quote, "08. previous close", CALL)?,
            change: numeric_field(quote, "09. change", CALL)?,
            change_percent: format!("{change_percent}%"),
            currency: "USD".to_string(),
        },
        trading: TradingInfo {
            open: numeric_field(quote, "02. open", CALL)?,
            high: numeric_field(quote, "03. high", CALL)?,
            low: numeric_field(quote, "04. low", CALL)?,
            volume: numeric_field(quote, "06. volume", CALL)?,
        },
        last_trading_day: text_field(quote, "07. latest trading day", "Unknown"),
        source: API_NAME.to_string(),
    })
}

/// `get_stock_price` tool.
#[derive(Debug, Clone)]
pub struct GetStockPriceTool {
    api_key: Option<String>,
    base_url: String,
    upstream: UpstreamClient,
}

impl GetStockPriceTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_stock_price";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Get current stock price and trading information for a given symbol";

    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        upstream: UpstreamClient,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            upstream,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.credentials.alpha_vantage_api_key.clone(),
            config.upstream.stock_base_url.clone(),
            config.upstream.client(),
        )
    }

    pub fn input_schema() -> JsonObject {
        let schema = json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Stock symbol (e.g., AAPL, MSFT, GOOGL)",
                    "minLength": 1,
                    "pattern": "^[A-Za-z0-9.-]+$",
                },
            },
            "required": ["symbol"],
            "additionalProperties": false,
        });
        match schema {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::input_schema())
            .with_output_schema(cached_schema_for_type::<StockQuote>().as_ref().clone())
    }

    /// Fetch and normalize a quote.
    pub async fn fetch(&self, args: &Arguments) -> Result<StockQuote, StructuredError> {
        let api_key = require_api_key(self.api_key.as_deref(), API_NAME)?;
        let symbol = required_str(
            args,
            "symbol",
            "Stock symbol parameter is required",
            "Stock symbol cannot be empty",
        )?
        .to_uppercase();
        info!(symbol = %symbol, "Processing stock quote request");

        let query = [
            ("function", "GLOBAL_QUOTE".to_string()),
            ("symbol", symbol.clone()),
            ("apikey", api_key.to_string()),
        ];
        let response = self
            .upstream
            .get(CALL, &query_url(&self.base_url), &query)
            .await?;
        if !response.is_success() {
            return Err(response.status_error(CALL));
        }

        let body: Map<String, Value> = response.json(CALL)?;
        let quote = normalize(&body, &symbol)?;
        info!(symbol = %symbol, "Stock quote request completed");
        Ok(quote)
    }
}

#[async_trait::async_trait]
impl ToolHandler for GetStockPriceTool {
    async fn call(&self, arguments: Arguments) -> HandlerResult {
        Ok(ToolOutput::StockQuote(self.fetch(&arguments).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn tool(server: &MockServer, key: Option<&str>) -> GetStockPriceTool {
        GetStockPriceTool::new(key.map(String::from), server.base_url(), UpstreamClient::default())
    }

    fn ibm_quote() -> Value {
        json!({
            "Global Quote": {
                "01. symbol": "IBM",
                "02. open": "168.2000",
                "03. high": "170.1000",
                "04. low": "167.5000",
                "05. price": "169.9000",
                "06. volume": "3958512",
                "07. latest trading day": "2024-05-31",
                "08. previous close": "167.7500",
                "09. change": "2.1500",
                "10. change percent": "1.2817%"
            }
        })
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = tool(&server, None)
            .fetch(&args(json!({ "symbol": "IBM" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiKeyMissing);
        assert_eq!(err.data_value("api"), Some(&json!("Alpha Vantage")));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_blank_symbol_fails_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "symbol": "" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert_eq!(err.data_value("field"), Some(&json!("symbol")));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_normalizes_quote_and_uppercases_symbol() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/query")
                    .query_param("function", "GLOBAL_QUOTE")
                    .query_param("symbol", "IBM")
                    .query_param("apikey", "key");
                then.status(200).json_body(ibm_quote());
            })
            .await;

        let quote = tool(&server, Some("key"))
            .fetch(&args(json!({ "symbol": " ibm " })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(quote.symbol, "IBM");
        assert_eq!(quote.price.current, 169.9);
        assert_eq!(quote.price.previous_close, 167.75);
        assert_eq!(quote.price.change, 2.15);
        assert_eq!(quote.price.change_percent, "1.2817%");
        assert_eq!(quote.price.currency, "USD");
        assert_eq!(quote.trading.volume, 3958512);
        assert_eq!(quote.last_trading_day, "2024-05-31");
        assert_eq!(quote.source, "Alpha Vantage");
    }

    #[tokio::test]
    async fn test_summary_formats_prices_and_volume() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query");
                then.status(200).json_body(ibm_quote());
            })
            .await;

        let quote = tool(&server, Some("key"))
            .fetch(&args(json!({ "symbol": "IBM" })))
            .await
            .unwrap();
        let summary = quote.summary();

        assert!(summary.starts_with("Stock Quote for IBM\n\n"));
        assert!(summary.contains("Current Price: $169.90\n"));
        assert!(summary.contains("Change: +$2.15 (+1.2817%)\n"));
        assert!(summary.contains("Previous Close: $167.75\n"));
        assert!(summary.contains("   Volume: 3,958,512\n"));
        assert!(summary.ends_with("Last Trading Day: 2024-05-31\nData from Alpha Vantage"));

        let falling = StockQuote {
            price: PriceInfo {
                change: -1.5,
                change_percent: "-0.8800%".to_string(),
                ..quote.price.clone()
            },
            ..quote
        };
        assert!(falling.summary().contains("Change: -$1.50 (-0.8800%)\n"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(3958512), "3,958,512");
    }

    #[tokio::test]
    async fn test_note_in_ok_body_is_rate_limit() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query");
                then.status(200).json_body(json!({
                    "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."
                }));
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "symbol": "IBM" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RateLimitExceeded);
        assert_eq!(err.message, "Alpha Vantage rate limit exceeded");
    }

    #[tokio::test]
    async fn test_error_message_is_invalid_symbol() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query");
                then.status(200)
                    .json_body(json!({ "Error Message": "Invalid API call." }));
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "symbol": "NOPE" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert_eq!(err.message, "Invalid stock symbol: NOPE");
        assert_eq!(err.data_value("error"), Some(&json!("Invalid API call.")));
    }

    #[tokio::test]
    async fn test_empty_quote_is_external_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query");
                then.status(200).json_body(json!({ "Global Quote": {} }));
            })
            .await;

        let err = tool(&server, Some("key"))
            .fetch(&args(json!({ "symbol": "ZZZZ" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalApiError);
        assert_eq!(err.message, "No data available for symbol: ZZZZ");
    }

    #[tokio::test]
    async fn test_upstream_status_mapping() {
        for (status, expected) in [
            (401, ErrorCode::ApiKeyInvalid),
            (429, ErrorCode::RateLimitExceeded),
            (500, ErrorCode::ExternalApiError),
        ] {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/query");
                    then.status(status).body("upstream down");
                })
                .await;

            let err = tool(&server, Some("key"))
                .fetch(&args(json!({ "symbol": "IBM" })))
                .await
                .unwrap_err();
            assert_eq!(err.code, expected, "status {status}");
        }
    }
}
