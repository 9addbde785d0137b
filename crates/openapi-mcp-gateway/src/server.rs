//! Axum-based HTTP surface.
//!
//! [`GatewayServer`] wires the registry, snapshot cache and tool groups into
//! a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`. |
//! | `GET`  | `/metrics` | Prometheus text exposition of the cache metrics. |
//! | `GET`  | `/v1/tools` | Tool definitions. |
//! | `POST` | `/v1/tools/{name}` | Invoke one tool with a JSON object of arguments. |
//! | `POST` | `/mcp` | MCP JSON-RPC 2.0 (`initialize`, `tools/list`, `tools/call`). |

use crate::cache::SnapshotCache;
use crate::error::{GatewayResult, ToolCallError};
use crate::fetcher::HttpDocumentFetcher;
use crate::metrics::CacheMetrics;
use crate::registry::InMemoryServiceRegistry;
use crate::tools::{ApiCallerTools, DiscoveryTools, ToolRouter, ToolSupport};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use openapi_mcp_kernel::config::AppConfig;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "openapi-mcp-gateway";

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into every axum handler via [`State`] extractor.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolRouter>,
    pub metrics: Arc<CacheMetrics>,
}

impl AppState {
    pub fn new(tools: Arc<ToolRouter>, metrics: Arc<CacheMetrics>) -> Self {
        Self { tools, metrics }
    }

    /// Build the full object graph from configuration: one shared reqwest
    /// client for document fetches and proxy calls.
    pub fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        let registry = Arc::new(InMemoryServiceRegistry::new(config.services.clone()));
        let support = ToolSupport::new(registry);
        let metrics = Arc::new(CacheMetrics::new()?);
        let cache = Arc::new(SnapshotCache::new(
            Arc::new(HttpDocumentFetcher::new(client.clone())),
            config.cache_ttl(),
            Arc::clone(&metrics),
        ));

        let tools = ToolRouter::new(
            DiscoveryTools::new(support.clone(), cache),
            ApiCallerTools::new(support, client)
                .with_max_response_bytes(config.http.max_response_bytes),
        );
        Ok(Self::new(Arc::new(tools), metrics))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

pub struct GatewayServer {
    config: AppConfig,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Build the axum [`Router`] for the configured services.
    pub fn build_app(&self) -> GatewayResult<Router> {
        Ok(router(AppState::from_config(&self.config)?))
    }

    /// Bind to `server.host:server.port` and serve until the process exits.
    pub async fn start(self) -> GatewayResult<()> {
        let app = self.build_app()?;
        let addr = self.config.server.bind_address();
        info!(
            addr = %addr,
            services = self.config.services.len(),
            cache_ttl_seconds = self.config.cache.ttl_seconds,
            "OpenAPI MCP gateway starting"
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Routes over an already-built [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/tools", get(list_tools_handler))
        .route("/v1/tools/{name}", post(call_tool_handler))
        .route("/mcp", post(mcp_handler))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `GET /metrics`: Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /v1/tools`: tool definitions.
async fn list_tools_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.tools.definitions() }))
}

/// `POST /v1/tools/{name}`: an empty body means no arguments.
async fn call_tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(arguments) => arguments,
            Err(e) => {
                return ToolCallError::InvalidArguments {
                    tool: name,
                    message: e.to_string(),
                }
                .into_response();
            }
        }
    };

    match state.tools.call(&name, arguments).await {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            text,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MCP JSON-RPC
// ─────────────────────────────────────────────────────────────────────────────

struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    const PARSE_ERROR: i64 = -32700;
    const INVALID_REQUEST: i64 = -32600;
    const METHOD_NOT_FOUND: i64 = -32601;
    const INVALID_PARAMS: i64 = -32602;

    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn into_envelope(self, id: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": self.code, "message": self.message }
        })
    }
}

/// `POST /mcp`: one JSON-RPC message per request. Notifications are
/// acknowledged with `202 Accepted` and no body.
async fn mcp_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            let error = RpcError::new(RpcError::PARSE_ERROR, format!("parse error: {e}"));
            return Json(error.into_envelope(Value::Null)).into_response();
        }
    };

    let id = message.get("id").cloned();
    let Some(method) = message.get("method").and_then(Value::as_str) else {
        let error = RpcError::new(RpcError::INVALID_REQUEST, "request requires string field 'method'");
        return Json(error.into_envelope(id.unwrap_or(Value::Null))).into_response();
    };
    let Some(id) = id else {
        debug!(method = %method, "MCP notification");
        return StatusCode::ACCEPTED.into_response();
    };

    let params = message.get("params").cloned().unwrap_or(Value::Null);
    let outcome = match method {
        "initialize" => Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": state.tools.definitions() })),
        "tools/call" => mcp_tools_call(&state, params).await,
        other => Err(RpcError::new(
            RpcError::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    };

    let envelope = match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => error.into_envelope(id),
    };
    Json(envelope).into_response()
}

async fn mcp_tools_call(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::new(RpcError::INVALID_PARAMS, "tools/call requires string field 'name'"))?;
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    let (text, is_error) = match state.tools.call(name, arguments).await {
        Ok(text) => (text, false),
        Err(ToolCallError::UnknownTool(name)) => {
            return Err(RpcError::new(
                RpcError::INVALID_PARAMS,
                format!("unknown tool: {name}"),
            ));
        }
        Err(e) => (e.to_payload().to_string(), true),
    };

    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    }))
}
