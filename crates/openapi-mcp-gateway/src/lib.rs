//! `openapi-mcp-gateway`: OpenAPI discovery and API proxy tools for agents.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`registry`] | [`InMemoryServiceRegistry`](registry::InMemoryServiceRegistry) |
//! | [`fetcher`] | [`DocumentFetcher`](fetcher::DocumentFetcher) trait and the reqwest implementation |
//! | [`cache`] | [`SnapshotCache`](cache::SnapshotCache), TTL cache with per-service single-flight |
//! | [`metrics`] | Prometheus counters, fetch timer and size gauge |
//! | [`tools`] | Discovery operations, `callApi` and the [`ToolRouter`](tools::ToolRouter) |
//! | [`server`] | axum HTTP and MCP JSON-RPC surface |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use openapi_mcp_gateway::server::GatewayServer;
//! use openapi_mcp_kernel::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("openapi-mcp.yaml")?;
//!     GatewayServer::new(config).start().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod tools;

pub use error::{GatewayError, GatewayResult, ToolCallError, ToolError};
