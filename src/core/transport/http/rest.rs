//! Resource-style front end.
//!
//! `POST /tools/{name}` always answers HTTP 200; success or failure is
//! carried by the envelope's `success` field.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde_json::Value;
use tracing::{info, warn};

use super::AppState;
use crate::domains::tools::{Arguments, StructuredError, ToolDescriptor, ToolOutcome};

/// `GET /tools` - every registered descriptor, in registration order.
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.server.descriptors().into_iter().cloned().collect())
}

/// `POST /tools/{name}` - the body is the argument object.
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<ToolOutcome> {
    info!(tool = %name, "Resource-style tool call");

    let arguments = match parse_arguments(&body) {
        Ok(arguments) => arguments,
        Err(err) => {
            warn!(tool = %name, "Rejected request body: {}", err.message);
            return Json(err.into());
        }
    };

    if !state.server.has_tool(&name) {
        warn!("Unknown tool requested: {}", name);
        return Json(StructuredError::tool_not_found(&name).into());
    }

    Json(state.server.invoke(&name, arguments).await)
}

/// An empty body means no arguments.
fn parse_arguments(body: &[u8]) -> Result<Arguments, StructuredError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Arguments::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(_) => Err(StructuredError::invalid_request(
            "Request body must be a JSON object",
        )),
        Err(e) => Err(StructuredError::parse_error(e)),
    }
}
