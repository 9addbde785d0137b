//! Generic, validated pass-through call to a configured service.

use super::support::{ToolSupport, shape};
use crate::error::ToolError;
use indexmap::IndexMap;
use openapi_mcp_kernel::service::normalize_path;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Response body cap used unless configured otherwise.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

/// Arguments of `callApi`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallRequest {
    pub service_name: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: Option<IndexMap<String, String>>,
    /// Appended as given; values must already be percent-encoded.
    #[serde(default)]
    pub query_params: Option<IndexMap<String, String>>,
    /// A JSON string is sent as-is, anything else is serialized.
    #[serde(default)]
    pub body: Option<Value>,
}

impl ApiCallRequest {
    pub fn new(
        service_name: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

pub struct ApiCallerTools {
    support: ToolSupport,
    client: Client,
    max_response_bytes: u64,
}

impl ApiCallerTools {
    pub fn new(support: ToolSupport, client: Client) -> Self {
        Self {
            support,
            client,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Validate and forward one request.
    ///
    /// Returns `{status, headers, body}` for 1xx-3xx responses, an
    /// `HTTP_ERROR` payload carrying the upstream response for 4xx/5xx, and
    /// `REQUEST_FAILED` when no response was obtained or its body exceeds
    /// the configured size cap.
    pub async fn call_api(&self, request: ApiCallRequest) -> Value {
        shape(self.execute(request).await)
    }

    #[instrument(skip(self, request), fields(service = %request.service_name, method = %request.method, path = %request.path))]
    async fn execute(&self, request: ApiCallRequest) -> Result<Value, ToolError> {
        let service = self.support.resolve_service(&request.service_name)?;

        if request.path.starts_with("http://") || request.path.starts_with("https://") {
            return Err(ToolError::AbsoluteUrlRejected { path: request.path });
        }
        let path = normalize_path(&request.path);

        let method_name = request.method.to_uppercase();
        if !ALLOWED_METHODS.contains(&method_name.as_str()) {
            return Err(ToolError::MethodNotAllowed {
                method: method_name,
            });
        }
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| ToolError::InvalidMethod {
                method: method_name.clone(),
            })?;

        let url = build_url(service.trimmed_base_url(), &path, request.query_params.as_ref())?;
        let headers = build_headers(request.headers.as_ref(), request.body.is_some())?;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(match body {
                Value::String(text) => text,
                other => other.to_string(),
            });
        }

        debug!("forwarding request");
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "proxy request failed");
            ToolError::RequestFailed {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let (headers, body) = read_response(response, self.max_response_bytes).await?;

        if status.is_client_error() || status.is_server_error() {
            warn!(status = status.as_u16(), "upstream returned error status");
            return Err(ToolError::HttpError {
                status: status.as_u16(),
                headers,
                body,
            });
        }

        Ok(json!({
            "status": status.as_u16(),
            "headers": headers,
            "body": body,
        }))
    }
}

/// `base + path`, then each query entry appended verbatim. A `#fragment` in
/// the path stays last so it cannot swallow the query.
fn build_url(
    base: &str,
    path: &str,
    query: Option<&IndexMap<String, String>>,
) -> Result<Url, ToolError> {
    let (path, fragment) = match path.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (path, None),
    };
    let mut uri = format!("{base}{path}");
    for (key, value) in query.into_iter().flatten() {
        uri.push(if uri.contains('?') { '&' } else { '?' });
        uri.push_str(key);
        uri.push('=');
        uri.push_str(value);
    }
    if let Some(fragment) = fragment {
        uri.push('#');
        uri.push_str(fragment);
    }
    Url::parse(&uri).map_err(|e| ToolError::RequestFailed {
        message: format!("invalid request URI '{uri}': {e}"),
    })
}

fn build_headers(
    supplied: Option<&IndexMap<String, String>>,
    has_body: bool,
) -> Result<HeaderMap, ToolError> {
    let mut headers = HeaderMap::new();
    for (name, value) in supplied.into_iter().flatten() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ToolError::RequestFailed {
                message: format!("invalid header name '{name}': {e}"),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ToolError::RequestFailed {
            message: format!("invalid value for header '{name}': {e}"),
        })?;
        headers.append(name, value);
    }
    if has_body && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}

/// Single-value header map (first value per name) and the body as text.
/// Bodies larger than `limit` bytes are rejected.
async fn read_response(
    mut response: Response,
    limit: u64,
) -> Result<(IndexMap<String, String>, String), ToolError> {
    let too_large = || {
        warn!(limit, "upstream response body too large");
        ToolError::RequestFailed {
            message: format!("response body exceeds {limit} bytes"),
        }
    };

    let mut headers = IndexMap::new();
    for (name, value) in response.headers() {
        headers
            .entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    if response.content_length().is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| ToolError::RequestFailed {
        message: e.to_string(),
    })? {
        if (bytes.len() + chunk.len()) as u64 > limit {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok((headers, String::from_utf8_lossy(&bytes).into_owned()))
}
