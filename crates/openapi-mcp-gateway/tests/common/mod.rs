//! Shared fixtures for the gateway integration tests.

#![allow(dead_code)]

use openapi_mcp_gateway::cache::SnapshotCache;
use openapi_mcp_gateway::fetcher::HttpDocumentFetcher;
use openapi_mcp_gateway::metrics::CacheMetrics;
use openapi_mcp_gateway::registry::InMemoryServiceRegistry;
use openapi_mcp_gateway::tools::{ApiCallerTools, DiscoveryTools, ToolRouter, ToolSupport};
use openapi_mcp_kernel::ServiceDescriptor;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

pub struct Fixture {
    pub router: ToolRouter,
    pub metrics: Arc<CacheMetrics>,
}

pub fn fixture(services: Vec<ServiceDescriptor>, ttl_secs: u64) -> Fixture {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let support = ToolSupport::new(Arc::new(InMemoryServiceRegistry::new(services)));
    let metrics = Arc::new(CacheMetrics::new().unwrap());
    let cache = Arc::new(SnapshotCache::new(
        Arc::new(HttpDocumentFetcher::new(client.clone())),
        Some(Duration::from_secs(ttl_secs)),
        Arc::clone(&metrics),
    ));
    let router = ToolRouter::new(
        DiscoveryTools::new(support.clone(), cache),
        ApiCallerTools::new(support, client),
    );
    Fixture { router, metrics }
}

/// Minimal blog service document.
pub fn blog_document() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "Blog API", "version": "1.0" },
        "tags": [{ "name": "posts" }, { "name": "comments" }],
        "paths": {
            "/posts/{id}": {
                "parameters": [{ "name": "trace", "in": "header" }],
                "get": {
                    "tags": ["posts"],
                    "operationId": "getPost",
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "responses": {
                        "200": {
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Post" } } }
                        },
                        "404": { "description": "not found" }
                    }
                }
            },
            "/posts": {
                "post": {
                    "tags": ["Admin"],
                    "operationId": "createPost",
                    "summary": "Create a post",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PostInput" } } }
                    },
                    "responses": {
                        "201": {
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Post" } } }
                        },
                        "400": {
                            "content": { "*/*": { "schema": { "$ref": "#/components/schemas/ErrorMessage" } } }
                        }
                    }
                }
            },
            "/comments": {
                "get": { "tags": ["comments"], "operationId": "listComments" }
            },
            "/internal": {
                "summary": "no operations here"
            }
        },
        "components": {
            "schemas": {
                "Post": {
                    "type": "object",
                    "required": ["id", "title"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "status": { "type": "string", "enum": ["DRAFT", "PUBLISHED"] },
                        "author": { "$ref": "#/components/schemas/Author", "description": "ignored" }
                    }
                },
                "PostInput": {
                    "type": "object",
                    "properties": { "title": { "type": "string" } }
                },
                "ErrorMessage": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } }
                }
            }
        }
    })
}
