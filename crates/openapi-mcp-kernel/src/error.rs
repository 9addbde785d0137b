//! Error types for `openapi-mcp-kernel`.
//!
//! [`FetchError`] covers every way obtaining an OpenAPI document can fail.
//! It lives in the kernel (rather than next to the HTTP client) so that the
//! cache, the discovery operations and test doubles all share one type
//! without depending on a particular transport crate.

use thiserror::Error;

/// Failure to obtain or parse a service's OpenAPI document.
///
/// The `Display` text is what `listServices` reports in the `message` field
/// of an `OPENAPI_FETCH_FAILED` entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    // ── Transport ───────────────────────────────────────────────────────────
    /// No response was obtained (connection refused, DNS, timeout, ...).
    #[error("failed to fetch OpenAPI document from {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("OpenAPI document request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    // ── Payload ──────────────────────────────────────────────────────────────
    /// The body was non-empty but not valid JSON.
    #[error("OpenAPI document from {url} is not valid JSON: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// The document URL the failed attempt targeted.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }
}
