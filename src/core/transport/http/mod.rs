//! HTTP transport implementation.
//!
//! Two independent front ends share one axum router, both thin translators
//! over [`McpServer`]:
//! - resource-style: `GET /tools`, `POST /tools/{name}` ([`rest`])
//! - JSON-RPC over POST on the configured path ([`rpc`])
//!
//! `GET /` and `GET /health` are always mounted and never require auth.

pub mod auth;
pub mod rest;
pub mod rpc;

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{HttpConfig, TransportError, TransportResult};
use crate::core::McpServer;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub server: McpServer,
    pub config: HttpConfig,
}

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.config.address();
        let auth = &server.config().auth;
        if auth.enabled && auth.api_key.is_none() {
            warn!(
                "MCP_AUTH_ENABLED is set but MCP_API_KEY is not - \
                 every protected request will be rejected"
            );
        }

        let app = router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (mode {}, CORS {})",
            addr,
            self.config.mode.as_str(),
            cors_status
        );
        if self.config.mode.serves_resource() {
            info!("  → Tools:    GET /tools, POST /tools/{{name}}");
        }
        if self.config.mode.serves_rpc() {
            info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        }
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(TransportError::Serve)?;

        Ok(())
    }
}

/// Build the router for the configured serve mode.
pub fn router(server: McpServer, config: &HttpConfig) -> Router {
    let debug = server.config().server.debug;
    let state = AppState {
        server,
        config: config.clone(),
    };

    let mut protected = Router::new();
    if config.mode.serves_resource() {
        protected = protected
            .route("/tools", get(rest::list_tools))
            .route("/tools/{name}", post(rest::call_tool));
    }
    if config.mode.serves_rpc() {
        protected = protected.route(&config.rpc_path, post(rpc::handle_rpc));
    }
    let protected = protected.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_api_key,
    ));

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    if debug {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

/// Root handler - liveness plus a summary of what is served.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tools: Vec<&str> = state
        .server
        .descriptors()
        .into_iter()
        .map(|d| d.name.as_str())
        .collect();

    Json(json!({
        "status": "healthy",
        "server": "API Aggregator MCP",
        "version": state.server.version(),
        "mode": state.config.mode.as_str(),
        "tools": tools,
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
