//! Tools domain module.
//!
//! Tools are the only MCP capability this server offers. Each one wraps an
//! upstream data API behind a stable, normalized result shape.
//!
//! ## Architecture
//!
//! - `definitions/` - One module per upstream API (weather, news, stock)
//! - `catalog.rs` - Builds the registry from configured credentials
//! - `registry.rs` - Descriptor + handler bindings, in registration order
//! - `dispatch.rs` - Invokes handlers and normalizes every outcome
//! - `handlers.rs` - Handler trait, result shapes and argument helpers
//! - `upstream.rs` - Outbound HTTP and status translation
//! - `error.rs` - Error taxonomy shared by every front end
//!
//! ## Adding a New Tool
//!
//! 1. Create a definition with a descriptor, a typed `fetch` and a
//!    `ToolHandler` impl
//! 2. Add its result type to `ToolOutput`
//! 3. Register it in `catalog.rs`
//!
//! Neither front end needs to change.

mod catalog;
pub mod definitions;
mod dispatch;
mod error;
mod handlers;
pub(crate) mod registry;
pub mod upstream;

pub use catalog::build_registry;
pub use dispatch::{Dispatcher, Invocation, ToolOutcome};
pub use error::{ErrorCode, StructuredError, ToolError};
pub use handlers::*;
pub use registry::{RegisteredTool, ToolDescriptor, ToolRegistry};
