//! `openapi-mcp-kernel`: data model and pure introspection logic.
//!
//! Nothing in this crate performs network I/O. It defines:
//!
//! | Concern | Items |
//! |---------|-------|
//! | Configured backends | [`ServiceDescriptor`], [`ServiceRegistry`] |
//! | OpenAPI index | [`OpenApiIndex`], [`MethodEntry`], [`OpenApiSnapshot`], [`IndexBuilder`] |
//! | Schema introspection | [`SchemaFragment`], [`SchemaNode`], [`schema::extract_schema`], [`schema::collect_refs`] |
//! | Failures | [`FetchError`] |
//!
//! The runtime side (HTTP fetch, TTL cache, tool operations, HTTP server)
//! lives in `openapi-mcp-gateway`.
//!
//! # Quick start
//!
//! ```rust
//! use openapi_mcp_kernel::IndexBuilder;
//! use serde_json::json;
//!
//! let document = json!({
//!     "tags": [{ "name": "posts" }],
//!     "paths": {
//!         "/posts/{id}": {
//!             "get": { "tags": ["posts"], "operationId": "getPost" }
//!         }
//!     }
//! });
//!
//! let index = IndexBuilder::build(&document);
//! assert_eq!(index.api_groups, vec!["posts".to_string()]);
//! assert!(index.api_index.contains_key("/posts/{id}"));
//! ```

#[cfg(feature = "config")]
pub mod config;
pub mod error;
pub mod openapi;
pub mod schema;
pub mod service;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use error::FetchError;
pub use openapi::{IndexBuilder, MethodEntry, OpenApiDocument, OpenApiIndex, OpenApiSnapshot};
pub use schema::{InlineSchema, SchemaFragment, SchemaNode};
pub use service::{ServiceDescriptor, ServiceRegistry};
