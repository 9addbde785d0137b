//! Gateway error types
//!
//! [`ToolError`] is the failure taxonomy of the tool operations. Most of it
//! never reaches the caller as an `Err`: operations render it with
//! [`ToolError::to_payload`] into the structured JSON object the agent
//! branches on. [`ToolCallError`] is what the tool-invocation boundary
//! reports, and [`GatewayError`] covers startup.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use openapi_mcp_kernel::FetchError;
use openapi_mcp_kernel::config::ConfigError;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Failure modes of the discovery and proxy operations.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown service name '{service_name}'")]
    UnknownService {
        service_name: String,
        available: Vec<String>,
    },

    #[error("base URL of service '{service_name}' is empty")]
    MissingBaseUrl { service_name: String },

    #[error(transparent)]
    OpenApiFetchFailed(#[from] FetchError),

    #[error("path '{path}' not found")]
    PathNotFound { path: String },

    #[error("method '{method}' not found for path '{path}'")]
    MethodNotFoundForPath { path: String, method: String },

    #[error("method '{method}' is not allowed")]
    MethodNotAllowed { method: String },

    #[error("method '{method}' is invalid")]
    InvalidMethod { method: String },

    #[error("absolute URL '{path}' is not allowed")]
    AbsoluteUrlRejected { path: String },

    /// The upstream answered with a 4xx/5xx status. Not a local failure.
    #[error("upstream returned HTTP {status}")]
    HttpError {
        status: u16,
        headers: IndexMap<String, String>,
        body: String,
    },

    /// No response was obtained from the proxy target.
    #[error("request failed: {message}")]
    RequestFailed { message: String },
}

impl ToolError {
    /// Structured JSON object returned to the calling agent.
    ///
    /// The `error` key comes first, followed by context fields.
    pub fn to_payload(&self) -> Value {
        match self {
            ToolError::UnknownService {
                service_name,
                available,
            } => error_payload(
                "Unknown service name",
                [
                    ("serviceName", json!(service_name)),
                    ("available", json!(available)),
                ],
            ),
            ToolError::MissingBaseUrl { service_name } => {
                error_payload("Base URL is empty", [("serviceName", json!(service_name))])
            }
            ToolError::OpenApiFetchFailed(err) => {
                error_payload("OPENAPI_FETCH_FAILED", [("message", json!(err.to_string()))])
            }
            ToolError::PathNotFound { path } => {
                error_payload("Path not found", [("path", json!(path))])
            }
            ToolError::MethodNotFoundForPath { path, method } => error_payload(
                "Method not found for path",
                [("path", json!(path)), ("method", json!(method))],
            ),
            ToolError::MethodNotAllowed { method } => {
                error_payload("Method not allowed", [("method", json!(method))])
            }
            ToolError::InvalidMethod { method } => {
                error_payload("Invalid method", [("method", json!(method))])
            }
            ToolError::AbsoluteUrlRejected { path } => {
                error_payload("Absolute URLs are not allowed", [("path", json!(path))])
            }
            ToolError::HttpError {
                status,
                headers,
                body,
            } => error_payload(
                "HTTP_ERROR",
                [
                    ("status", json!(status)),
                    ("headers", json!(headers)),
                    ("body", json!(body)),
                ],
            ),
            ToolError::RequestFailed { message } => {
                error_payload("REQUEST_FAILED", [("message", json!(message))])
            }
        }
    }
}

fn error_payload<const N: usize>(error: &str, fields: [(&str, Value); N]) -> Value {
    let mut payload = Map::new();
    payload.insert("error".to_string(), json!(error));
    for (key, value) in fields {
        payload.insert(key.to_string(), value);
    }
    Value::Object(payload)
}

/// Failure reported by the tool-invocation boundary instead of a JSON result.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// A cache fetch failure propagated out of `listApis`, `getApiDetail` or
    /// `getComponentSchemas`.
    #[error("OpenAPI fetch failed for service '{service_name}': {source}")]
    Fetch {
        service_name: String,
        #[source]
        source: FetchError,
    },
}

impl ToolCallError {
    /// JSON body describing the failure at the HTTP/MCP boundary.
    pub fn to_payload(&self) -> Value {
        match self {
            ToolCallError::UnknownTool(name) => {
                error_payload("Unknown tool", [("tool", json!(name))])
            }
            ToolCallError::InvalidArguments { tool, message } => error_payload(
                "Invalid arguments",
                [("tool", json!(tool)), ("message", json!(message))],
            ),
            ToolCallError::Fetch {
                service_name,
                source,
            } => error_payload(
                "OPENAPI_FETCH_FAILED",
                [
                    ("serviceName", json!(service_name)),
                    ("message", json!(source.to_string())),
                ],
            ),
        }
    }
}

impl IntoResponse for ToolCallError {
    fn into_response(self) -> Response {
        let status = match &self {
            ToolCallError::UnknownTool(_) => StatusCode::NOT_FOUND,
            ToolCallError::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
            ToolCallError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(self.to_payload())).into_response()
    }
}

/// Startup errors of the gateway binary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
