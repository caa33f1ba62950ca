//! Tool definitions module.
//!
//! One file (or directory) per upstream API. Each tool exposes a descriptor,
//! a typed `fetch` and a [`ToolHandler`](super::ToolHandler) implementation.

pub mod news;
pub mod stock;
pub mod weather;

pub use news::{GetNewsTool, NewsDigest};
pub use stock::{GetStockPriceTool, SearchStocksTool, StockQuote, SymbolSearch};
pub use weather::{GetWeatherTool, WeatherReport};
