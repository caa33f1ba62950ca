//! Alpha Vantage `SYMBOL_SEARCH` tool.

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
    operation: "get_stock_search",
};

/// Normalized symbol search results.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SymbolSearch {
    pub search_keywords: String,
    pub total_matches: usize,
    pub matches: Vec<SymbolMatch>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub region: String,
    pub market_open: String,
    pub market_close: String,
    pub timezone: String,
    pub currency: String,
    pub match_score: f64,
}

/// Matches rendered in the text summary; the structured result keeps all.
const SUMMARY_LIMIT: usize = 10;

impl SymbolSearch {
    /// Readable rendering shown to MCP clients.
    pub fn summary(&self) -> String {
        if self.matches.is_empty() {
            return format!("No stocks found matching '{}'", self.search_keywords);
        }

        let mut output = format!("Stock Search Results for '{}':\n\n", self.search_keywords);
        for (i, m) in self.matches.iter().take(SUMMARY_LIMIT).enumerate() {
            output.push_str(&format!(
                "{}. **{}** - {}\n   Type: {}\n   Region: {} | Currency: {}\n\n",
                i + 1,
                m.symbol,
                or_na(&m.name),
                or_na(&m.kind),
                or_na(&m.region),
                or_na(&m.currency),
            ));
        }
        output
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

fn normalize(body: &Map<String, Value>, keywords: &str) -> Result<SymbolSearch, StructuredError> {
    match notice(body) {
        Some(Notice::ErrorMessage(message)) => {
            return Err(StructuredError::new(
                ErrorCode::ExternalApiError,
                format!("Search error: {message}"),
            )
            .with_data("keywords", keywords));
        }
        Some(Notice::RateLimited) => return Err(StructuredError::rate_limited(API_NAME)),
        None => {}
    }

    let mut matches = Vec::new();
    if let Some(Value::Array(best)) = body.get("bestMatches") {
        for entry in best.iter().filter_map(Value::as_object) {
            matches.push(SymbolMatch {
                symbol: text_field(entry, "1. symbol", ""),
                name: text_field(entry, "2. name", ""),
                kind: text_field(entry, "3. type", ""),
                region: text_field(entry, "4. region", ""),
                market_open: text_field(entry, "5. marketOpen", ""),
                market_close: text_field(entry, "6. marketClose", ""),
                timezone: text_field(entry, "7. timezone", ""),
                currency: text_field(entry, "8. currency", ""),
                match_score: numeric_field(entry, "9. matchScore", CALL)?,
            });
        }
    }

    Ok(SymbolSearch {
        search_keywords: keywords.to_string(),
        total_matches: matches.len(),
        matches,
        source: API_NAME.to_string(),
    })
}

/// `search_stocks` tool.
#[derive(Debug, Clone)]
pub struct SearchStocksTool {
    api_key: Option<String>,
    base_url: String,
    upstream: UpstreamClient,
}

impl SearchStocksTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_stocks";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Search for stock symbols by company name or keywords";

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
                "keywords": {
                    "type": "string",
                    "description": "Search keywords (company name, symbol, etc.)",
                    "minLength": 1,
                },
            },
            "required": ["keywords"],
            "additionalProperties": false,
        });
        match schema {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::input_schema())
            .with_output_schema(cached_schema_for_type::<SymbolSearch>().as_ref().clone())
    }

    /// Search symbols matching the keywords.
    pub async fn fetch(&self, args: &Arguments) -> Result<SymbolSearch, StructuredError> {
        let api_key = require_api_key(self.api_key.as_deref(), API_NAME)?;
        let keywords = required_str(
            args,
            "keywords",
            "Search keywords parameter is required",
            "Search keywords cannot be empty",
        )?;
        info!(keywords = %keywords, "Processing stock search request");

        let query = [
            ("function", "SYMBOL_SEARCH".to_string()),
            ("keywords", keywords.to_string()),
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
        let results = normalize(&body, keywords)?;
        info!(
            keywords = %keywords,
            matches = results.total_matches,
            "Stock search request completed"
        );
        Ok(results)
    }
}

#[async_trait::async_trait]
impl ToolHandler for SearchStocksTool {
    async fn call(&self, arguments: Arguments) -> HandlerResult {
        Ok(ToolOutput::StockSearch(self.fetch(&arguments).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn tool(server: &MockServer, key: Option<&str>) -> SearchStocksTool {
        SearchStocksTool::new(key.map(String::from), server.base_url(), UpstreamClient::default())
    }

    #[tokio::test]
    async fn test_missing_keywords_fails_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = tool(&server, Some("key")).fetch(&Arguments::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
        assert_eq!(err.data_value("field"), Some(&json!("keywords")));
        assert_eq!(err.data_value("value"), Some(&Value::Null));

        let err = tool(&server, None)
            .fetch(&args(json!({ "keywords": "tesla" })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiKeyMissing);
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_normalizes_best_matches() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/query")
                    .query_param("function", "SYMBOL_SEARCH")
                    .query_param("keywords", "tesco")
                    .query_param("apikey", "key");
                then.status(200).json_body(json!({
                    "bestMatches": [
                        {
                            "1. symbol": "TSCO.LON",
                            "2. name": "Tesco PLC",
                            "3. type": "Equity",
                            "4. region": "United Kingdom",
                            "5. marketOpen": "08:00",
                            "6. marketClose": "16:30",
                            "7. timezone": "UTC+01",
                            "8. currency": "GBX",
                            "9. matchScore": "0.7273"
                        },
                        { "1. symbol": "TSCDF" }
                    ]
                }));
            })
            .await;

        let results = tool(&server, Some("key"))
            .fetch(&args(json!({ "keywords": "  tesco " })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(results.search_keywords, "tesco");
        assert_eq!(results.total_matches, 2);
        assert_eq!(results.matches[0].name, "Tesco PLC");
        assert_eq!(results.matches[0].match_score, 0.7273);
        assert_eq!(results.matches[1].currency, "");
        assert_eq!(results.matches[1].match_score, 0.0);

        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["matches"][0]["type"], "Equity");
    }

    #[test]
    fn test_summary_lists_top_matches() {
        let entry = |i: usize| SymbolMatch {
            symbol: format!("SYM{i}"),
            name: format!("Company {i}"),
            kind: "Equity".to_string(),
            region: "United States".to_string(),
            market_open: "09:30".to_string(),
            market_close: "16:00".to_string(),
            timezone: "UTC-04".to_string(),
            currency: String::new(),
            match_score: 0.5,
        };
        let results = SymbolSearch {
            search_keywords: "corp".to_string(),
            total_matches: 12,
            matches: (1..=12).map(entry).collect(),
            source: API_NAME.to_string(),
        };
        let summary = results.summary();

        assert!(summary.starts_with("Stock Search Results for 'corp':\n\n"));
        assert!(summary.contains(
            "1. **SYM1** - Company 1\n   Type: Equity\n   Region: United States | Currency: N/A\n"
        ));
        assert!(summary.contains("10. **SYM10**"));
        assert!(!summary.contains("SYM11"));

        let none = SymbolSearch {
            matches: vec![],
            total_matches: 0,
            ..results
        };
        assert_eq!(none.summary(), "No stocks found matching 'corp'");
    }

    #[tokio::test]
    async fn test_in_body_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query").query_param("keywords", "limited");
                then.status(200).json_body(json!({ "Note": "slow down" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query").query_param("keywords", "broken");
                then.status(200)
                    .json_body(json!({ "Error Message": "the parameter keywords is invalid" }));
            })
            .await;
        let search = tool(&server, Some("key"));

        let err = search.fetch(&args(json!({ "keywords": "limited" }))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RateLimitExceeded);

        let err = search.fetch(&args(json!({ "keywords": "broken" }))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalApiError);
        assert_eq!(err.message, "Search error: the parameter keywords is invalid");
        assert_eq!(err.data_value("keywords"), Some(&json!("broken")));
    }
}
