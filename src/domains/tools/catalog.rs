//! Tool catalog - decides which tools exist for a given configuration.
//!
//! A tool is registered only when the credential for its upstream API is
//! configured. Registration order is fixed so listings are reproducible.

use std::sync::Arc;

use tracing::{info, warn};

use super::definitions::{GetNewsTool, GetStockPriceTool, GetWeatherTool, SearchStocksTool};
use super::registry::ToolRegistry;
use crate::core::config::Config;

/// Build the registry for `config`.
pub fn build_registry(config: &Config) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    let credentials = &config.credentials;

    if credentials.openweather_api_key.is_some() {
        registry.register(
            GetWeatherTool::descriptor(),
            Arc::new(GetWeatherTool::from_config(config)),
        );
    } else {
        warn!("OPENWEATHER_API_KEY not set - {} disabled", GetWeatherTool::NAME);
    }

    if credentials.news_api_key.is_some() {
        registry.register(
            GetNewsTool::descriptor(),
            Arc::new(GetNewsTool::from_config(config)),
        );
    } else {
        warn!("NEWS_API_KEY not set - {} disabled", GetNewsTool::NAME);
    }

    if credentials.alpha_vantage_api_key.is_some() {
        registry.register(
            GetStockPriceTool::descriptor(),
            Arc::new(GetStockPriceTool::from_config(config)),
        );
        registry.register(
            SearchStocksTool::descriptor(),
            Arc::new(SearchStocksTool::from_config(config)),
        );
    } else {
        warn!(
            "ALPHA_VANTAGE_API_KEY not set - {} and {} disabled",
            GetStockPriceTool::NAME,
            SearchStocksTool::NAME
        );
    }

    if registry.is_empty() {
        warn!("No tools registered");
    } else {
        info!(count = registry.len(), "Tools available: {}", registry.tool_names().join(", "));
    }
    registry
}
