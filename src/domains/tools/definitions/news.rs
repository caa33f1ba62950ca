//! News API headlines tool.
//!
//! A free-text query goes to the `everything` endpoint sorted by recency;
//! otherwise `top-headlines` is used, defaulting to US headlines when neither
//! a category nor a country narrows the request.

use chrono::{DateTime, Utc};
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::core::config::Config;
use crate::domains::tools::error::StructuredError;
use crate::domains::tools::handlers::{
    Arguments, HandlerResult, ToolHandler, ToolOutput, optional_int, optional_str, require_api_key,
};
use crate::domains::tools::registry::ToolDescriptor;
use crate::domains::tools::upstream::{UpstreamCall, UpstreamClient};

const API_NAME: &str = "News API";
const CALL: UpstreamCall<'static> = UpstreamCall {
    api: API_NAME,
    operation: "get_news",
};

pub const CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

const DEFAULT_PAGE_SIZE: i64 = 10;
const DEFAULT_COUNTRY: &str = "us";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

// ============================================================================
// Endpoint selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsEndpoint {
    Everything,
    TopHeadlines,
}

impl NewsEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            NewsEndpoint::Everything => "everything",
            NewsEndpoint::TopHeadlines => "top-headlines",
        }
    }
}

/// Upstream request derived from validated arguments, minus the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRequest {
    pub endpoint: NewsEndpoint,
    pub params: Vec<(&'static str, String)>,
}

impl NewsRequest {
    pub fn plan(
        query: Option<&str>,
        category: Option<&str>,
        country: Option<&str>,
        page_size: i64,
    ) -> Self {
        if let Some(query) = query {
            return Self {
                endpoint: NewsEndpoint::Everything,
                params: vec![
                    ("q", query.to_string()),
                    ("pageSize", page_size.to_string()),
                    ("sortBy", "publishedAt".to_string()),
                    ("language", "en".to_string()),
                ],
            };
        }

        let mut params = vec![("pageSize", page_size.to_string())];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        match country {
            Some(country) => params.push(("country", country.to_string())),
            None if category.is_none() => params.push(("country", DEFAULT_COUNTRY.to_string())),
            None => {}
        }

        Self {
            endpoint: NewsEndpoint::TopHeadlines,
            params,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// Structured Output
// ============================================================================

/// Normalized list of articles.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct NewsDigest {
    pub query_info: QueryInfo,
    pub articles: Vec<Article>,
    pub source: String,
    pub retrieved_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct QueryInfo {
    pub search_query: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub total_results: u64,
    pub articles_returned: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub source: ArticleSource,
    pub author: String,
    pub published_at: String,
    pub url_to_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ArticleSource {
    pub name: String,
    pub id: Option<String>,
}

impl NewsDigest {
    /// Readable rendering shown to MCP clients.
    pub fn summary(&self) -> String {
        let info = &self.query_info;
        let filters: Vec<String> = [
            info.search_query.as_ref().map(|q| format!("Query: {q}")),
            info.category.as_ref().map(|c| format!("Category: {c}")),
            info.country.as_ref().map(|c| format!("Country: {c}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        let heading = if filters.is_empty() {
            "Top Headlines".to_string()
        } else {
            filters.join(" | ")
        };

        let mut output = format!("Latest News ({heading})\n");
        output.push_str(&format!(
            "Found {} articles, showing {}:\n\n",
            info.total_results, info.articles_returned
        ));
        for (i, article) in self.articles.iter().enumerate() {
            output.push_str(&format!(
                "{}. **{}**\n   Source: {} | {}\n   {}\n",
                i + 1,
                article.title,
                article.source.name,
                article.published_at,
                article.description,
            ));
            if let Some(url) = &article.url {
                output.push_str(&format!("   {url}\n"));
            }
            output.push('\n');
        }
        output
    }
}

// ============================================================================
// Upstream payload
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNews {
    #[serde(default)]
    articles: Vec<RawArticle>,
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
    author: Option<String>,
    published_at: Option<String>,
    url_to_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    id: Option<String>,
    name: Option<String>,
}

/// Render an upstream timestamp as UTC; unparsable values pass through.
fn format_published(value: Option<&str>) -> String {
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc).format(DATE_FORMAT).to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => "Unknown".to_string(),
    }
}

fn normalize_article(raw: RawArticle) -> Article {
    let (source_name, source_id) = match raw.source {
        Some(source) => (source.name, source.id),
        None => (None, None),
    };

    Article {
        title: raw.title.unwrap_or_else(|| "No title".to_string()),
        description: raw
            .description
            .unwrap_or_else(|| "No description available".to_string()),
        url: raw.url,
        source: ArticleSource {
            name: source_name.unwrap_or_else(|| "Unknown".to_string()),
            id: source_id,
        },
        author: raw.author.unwrap_or_else(|| "Unknown".to_string()),
        published_at: format_published(raw.published_at.as_deref()),
        url_to_image: raw.url_to_image,
    }
}

// ============================================================================
// Tool Implementation
// ============================================================================

/// `get_news` tool.
#[derive(Debug, Clone)]
pub struct GetNewsTool {
    api_key: Option<String>,
    base_url: String,
    upstream: UpstreamClient,
}

impl GetNewsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_news";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Get latest news headlines by topic, category, or country";

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
            config.credentials.news_api_key.clone(),
            config.upstream.news_base_url.clone(),
            config.upstream.client(),
        )
    }

    pub fn input_schema() -> JsonObject {
        let schema = json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for specific news topics (optional)",
                },
                "category": {
                    "type": "string",
                    "description": "News category (optional)",
                    "enum": CATEGORIES,
                },
                "country": {
                    "type": "string",
                    "description": "Country code for country-specific news (e.g., 'us', 'gb', 'ca')",
                    "pattern": "^[a-z]{2}$",
                },
                "page_size": {
                    "type": "integer",
                    "description": "Number of articles to return (1-100)",
                    "minimum": 1,
                    "maximum": 100,
                    "default": DEFAULT_PAGE_SIZE,
                },
            },
            "additionalProperties": false,
        });
        match schema {
            serde_json::Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::input_schema())
            .with_output_schema(cached_schema_for_type::<NewsDigest>().as_ref().clone())
    }

    /// Fetch and normalize headlines.
    pub async fn fetch(&self, args: &Arguments) -> Result<NewsDigest, StructuredError> {
        let api_key = require_api_key(self.api_key.as_deref(), API_NAME)?;

        let query = optional_str(args, "query")?
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let category = optional_str(args, "category")?
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let country = optional_str(args, "country")?
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let page_size = optional_int(args, "page_size")?.unwrap_or(DEFAULT_PAGE_SIZE);

        if !(1..=100).contains(&page_size) {
            return Err(StructuredError::invalid_param(
                "page_size",
                page_size,
                "Page size must be between 1 and 100",
            ));
        }
        if let Some(category) = category {
            if !CATEGORIES.contains(&category) {
                return Err(StructuredError::invalid_param(
                    "category",
                    category,
                    &format!("Category must be one of: {}", CATEGORIES.join(", ")),
                ));
            }
        }

        let request = NewsRequest::plan(query, category, country, page_size);
        info!(
            endpoint = request.endpoint.path(),
            query = ?query,
            category = ?category,
            country = ?country,
            "Processing news request"
        );

        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            request.endpoint.path()
        );
        let mut params = request.params;
        params.push(("apiKey", api_key.to_string()));
        let response = self.upstream.get(CALL, &url, &params).await?;

        if !response.is_success() {
            return Err(response.status_error(CALL));
        }

        let raw: RawNews = response.json(CALL)?;
        let articles: Vec<Article> = raw.articles.into_iter().map(normalize_article).collect();
        info!(articles_count = articles.len(), "News request completed");

        Ok(NewsDigest {
            query_info: QueryInfo {
                search_query: query.map(String::from),
                category: category.map(String::from),
                country: country.map(String::from),
                total_results: raw.total_results,
                articles_returned: articles.len(),
            },
            articles,
            source: API_NAME.to_string(),
            retrieved_at: Utc::now().format(DATE_FORMAT).to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ToolHandler for GetNewsTool {
    async fn call(&self, arguments: Arguments) -> HandlerResult {
        Ok(ToolOutput::News(self.fetch(&arguments).await?))
    }
}
