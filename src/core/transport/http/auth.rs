//! Shared-key authentication for the tool routes.
//!
//! Accepts `X-API-Key: <key>` or `Authorization: Bearer <key>`. Only active
//! when `MCP_AUTH_ENABLED` is set; with no key configured every protected
//! request is refused.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::AppState;
use crate::domains::tools::{ErrorCode, StructuredError, ToolOutcome};

const API_KEY_HEADER: &str = "x-api-key";

/// Middleware guarding the resource-style and RPC routes.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let auth = &state.server.config().auth;
    if !auth.enabled {
        return next.run(request).await;
    }

    let authorized = match (auth.api_key.as_deref(), presented_key(request.headers())) {
        (Some(expected), Some(presented)) => keys_match(expected, presented),
        _ => false,
    };

    if authorized {
        next.run(request).await
    } else {
        warn!(path = %request.uri().path(), "Rejected unauthenticated request");
        unauthorized()
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Constant-time comparison.
fn keys_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

fn unauthorized() -> Response {
    let outcome: ToolOutcome =
        StructuredError::new(ErrorCode::InvalidRequest, "Unauthorized").into();
    (StatusCode::UNAUTHORIZED, Json(outcome)).into_response()
}
