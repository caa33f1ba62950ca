//! JSON-RPC front end.
//!
//! One POST endpoint speaking the MCP subset needed for tool use:
//! `initialize`, `ping`, `tools/list`, `tools/call` and notifications.
//! Every response echoes the request `id` and carries exactly one of
//! `result` or `error`.

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Span, info, instrument, warn};

use super::AppState;
use crate::domains::tools::{Arguments, ErrorCode, StructuredError};

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, error: StructuredError) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(error),
        }
    }

    fn from_result(id: Option<Value>, result: Result<Value, StructuredError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(err) => Self::error(id, err),
        }
    }
}

/// Handle one JSON-RPC request.
#[instrument(skip_all, fields(method))]
pub async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Malformed JSON-RPC body: {}", e);
            return Json(JsonRpcResponse::error(None, StructuredError::parse_error(e)));
        }
    };
    let id = raw.get("id").cloned();

    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid JSON-RPC envelope: {}", e);
            let err = StructuredError::invalid_request(format!("Invalid Request: {e}"));
            return Json(JsonRpcResponse::error(id, err));
        }
    };

    Span::current().record("method", request.method.as_str());
    info!("Received JSON-RPC request: {}", request.method);

    Json(process_request(&state, request).await)
}

/// Process a decoded request and build its response.
async fn process_request(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    if let Some(version) = request.jsonrpc.as_deref().filter(|v| *v != "2.0") {
        let err =
            StructuredError::invalid_request(format!("Unsupported jsonrpc version: {version}"));
        return JsonRpcResponse::error(request.id, err);
    }

    let id = request.id;
    match request.method.as_str() {
        "initialize" => {
            let result =
                serde_json::to_value(state.server.info()).map_err(StructuredError::internal);
            JsonRpcResponse::from_result(id, result)
        }

        "ping" => JsonRpcResponse::success(id, json!({})),

        "tools/list" => {
            let tools: Vec<Value> = state
                .server
                .descriptors()
                .into_iter()
                .map(|d| d.to_mcp_json())
                .collect();
            JsonRpcResponse::success(id, json!({ "tools": tools }))
        }

        "tools/call" => JsonRpcResponse::from_result(id, call_tool(state, request.params).await),

        // Stateless over HTTP: acknowledge and move on.
        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            JsonRpcResponse::success(id, Value::Null)
        }

        method => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::error(id, StructuredError::method_not_found(method))
        }
    }
}

/// `tools/call`: params must name a registered tool.
async fn call_tool(state: &AppState, params: Option<Value>) -> Result<Value, StructuredError> {
    let params = params.unwrap_or(Value::Null);

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StructuredError::new(ErrorCode::InvalidParams, "Tool name is required"))?;

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Arguments::new(),
        Some(Value::Object(arguments)) => arguments.clone(),
        Some(other) => {
            return Err(StructuredError::invalid_param(
                "arguments",
                other.clone(),
                "Tool arguments must be an object",
            ));
        }
    };

    if !state.server.has_tool(name) {
        warn!("Unknown tool requested: {}", name);
        return Err(StructuredError::tool_not_found(name));
    }

    let result = state.server.call(name, arguments).await?;
    serde_json::to_value(result).map_err(StructuredError::internal)
}
