//! Read-only introspection over cached OpenAPI snapshots.
//!
//! Validation failures come back as structured JSON payloads. A snapshot
//! fetch failure is only downgraded to a per-entry field by
//! [`DiscoveryTools::list_services`]; the other three operations return it
//! as `Err` so the invoking runtime sees it.

use super::support::{ToolSupport, shape_discovery};
use crate::cache::SnapshotCache;
use crate::error::ToolError;
use futures::future::join_all;
use indexmap::IndexSet;
use openapi_mcp_kernel::schema::{
    collect_refs, extract_schema, resolve_schema_node, resolve_schema_node_from_content,
};
use openapi_mcp_kernel::{FetchError, SchemaFragment, ServiceDescriptor};
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub struct DiscoveryTools {
    support: ToolSupport,
    cache: Arc<SnapshotCache>,
}

impl DiscoveryTools {
    pub fn new(support: ToolSupport, cache: Arc<SnapshotCache>) -> Self {
        Self { support, cache }
    }

    /// One entry per configured service with a non-blank name, in
    /// configuration order. Services are fetched concurrently.
    ///
    /// A descriptor shadowed by a later one with the same name is skipped, so
    /// the snapshot cached under that name always belongs to the descriptor
    /// that lookups resolve to.
    pub async fn list_services(&self) -> Value {
        let registry = self.support.registry();
        let services = registry.list_all().into_iter().filter(|service| {
            registry
                .lookup(&service.name)
                .is_some_and(|winner| std::ptr::eq(winner, *service))
        });
        let entries = join_all(services.map(|service| self.describe_service(service))).await;
        Value::Array(entries)
    }

    /// `path → method → {tags, operationId?, summary?}`, optionally restricted
    /// to methods tagged with `api_group` (case-insensitive).
    pub async fn list_apis(
        &self,
        service_name: &str,
        api_group: Option<&str>,
    ) -> Result<Value, FetchError> {
        shape_discovery(self.try_list_apis(service_name, api_group).await)
    }

    /// Parameters, request body, response schemas and referenced components
    /// of one operation.
    pub async fn get_api_detail(
        &self,
        service_name: &str,
        request_url: &str,
        http_method: &str,
    ) -> Result<Value, FetchError> {
        shape_discovery(
            self.try_get_api_detail(service_name, request_url, http_method)
                .await,
        )
    }

    /// Normalized `components.schemas` entries keyed by the full reference
    /// string. `refs` is comma-separated; unknown names are skipped.
    pub async fn get_component_schemas(
        &self,
        service_name: &str,
        refs: &str,
    ) -> Result<Value, FetchError> {
        shape_discovery(self.try_get_component_schemas(service_name, refs).await)
    }

    async fn describe_service(&self, service: &ServiceDescriptor) -> Value {
        if !service.has_base_url() {
            return json!({ "serviceName": service.name, "error": "MISSING_BASE_URL" });
        }
        match self.cache.get(service).await {
            Ok(snapshot) => json!({
                "serviceName": service.name,
                "apiGroups": snapshot.index.api_groups,
            }),
            Err(err) => json!({
                "serviceName": service.name,
                "error": "OPENAPI_FETCH_FAILED",
                "message": err.to_string(),
            }),
        }
    }

    async fn try_list_apis(
        &self,
        service_name: &str,
        api_group: Option<&str>,
    ) -> Result<Value, ToolError> {
        let service = self.support.resolve_service(service_name)?;
        let snapshot = self.cache.get(service).await?;
        let group = api_group.filter(|group| !group.trim().is_empty());

        let mut result = Map::new();
        for (path, methods) in &snapshot.index.api_index {
            let matching: Map<String, Value> = methods
                .iter()
                .filter(|(_, entry)| group.is_none_or(|group| entry.has_tag(group)))
                .map(|(method, entry)| (method.clone(), json!(entry)))
                .collect();
            if !matching.is_empty() {
                result.insert(path.clone(), Value::Object(matching));
            }
        }
        Ok(Value::Object(result))
    }

    async fn try_get_api_detail(
        &self,
        service_name: &str,
        request_url: &str,
        http_method: &str,
    ) -> Result<Value, ToolError> {
        let service = self.support.resolve_service(service_name)?;
        let snapshot = self.cache.get(service).await?;

        let path_item = snapshot
            .document
            .get("paths")
            .and_then(|paths| paths.get(request_url))
            .ok_or_else(|| ToolError::PathNotFound {
                path: request_url.to_string(),
            })?;

        let method = http_method.to_lowercase();
        let operation = path_item
            .get(&method)
            .ok_or_else(|| ToolError::MethodNotFoundForPath {
                path: request_url.to_string(),
                method: method.clone(),
            })?;

        Ok(describe_operation(operation))
    }

    async fn try_get_component_schemas(
        &self,
        service_name: &str,
        refs: &str,
    ) -> Result<Value, ToolError> {
        let service = self.support.resolve_service(service_name)?;
        let snapshot = self.cache.get(service).await?;
        let schemas = snapshot
            .document
            .get("components")
            .and_then(|components| components.get("schemas"));

        let mut result = Map::new();
        for reference in refs.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let name = reference
                .rsplit_once('/')
                .map_or(reference, |(_, name)| name);
            if let Some(schema) = schemas.and_then(|schemas| schemas.get(name)) {
                result.insert(reference.to_string(), extract_schema(schema).to_value());
            }
        }
        Ok(Value::Object(result))
    }
}

fn describe_operation(operation: &Value) -> Value {
    let parameters: Vec<Value> = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|param| param.is_object())
                .map(describe_parameter)
                .collect()
        })
        .unwrap_or_default();

    let request_body = SchemaFragment::classify(operation.get("requestBody").unwrap_or(&Value::Null));
    let request_schema = resolve_schema_node_from_content(request_body.field("content"));

    let mut component_refs = IndexSet::new();
    if let Some(schema) = request_schema {
        collect_refs(schema, &mut component_refs);
    }

    let mut responses = Map::new();
    if let Some(declared) = operation.get("responses").and_then(Value::as_object) {
        for (status, response) in declared {
            if let Some(schema) = resolve_schema_node_from_content(response.get("content")) {
                collect_refs(schema, &mut component_refs);
                responses.insert(status.clone(), extract_schema(schema).to_value());
            }
        }
    }

    let mut detail = Map::new();
    detail.insert("parameters".to_string(), Value::Array(parameters));
    if let Some(schema) = request_schema {
        let mut body = Map::new();
        if let Some(required) = request_body.field("required").and_then(Value::as_bool) {
            body.insert("required".to_string(), Value::Bool(required));
        }
        body.insert("schema".to_string(), extract_schema(schema).to_value());
        detail.insert("requestBody".to_string(), Value::Object(body));
    }
    detail.insert("responses".to_string(), Value::Object(responses));
    detail.insert("componentRefs".to_string(), json!(component_refs));
    Value::Object(detail)
}

fn describe_parameter(parameter: &Value) -> Value {
    let fragment = SchemaFragment::classify(parameter);
    let mut entry = Map::new();
    if let Some(name) = fragment.text("name") {
        entry.insert("name".to_string(), json!(name));
    }
    if let Some(location) = fragment.text("in") {
        entry.insert("in".to_string(), json!(location));
    }
    if let Some(required) = fragment.field("required").and_then(Value::as_bool) {
        entry.insert("required".to_string(), Value::Bool(required));
    }
    if let Some(schema) = resolve_schema_node(parameter) {
        entry.insert("schema".to_string(), extract_schema(schema).to_value());
    }
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_detail_collects_request_and_response_refs_in_order() {
        let operation = json!({
            "parameters": [
                { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } },
                { "name": "verbose", "in": "query", "required": "yes" },
                "not-an-object"
            ],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": { "schema": { "$ref": "#/components/schemas/PostInput" } }
                }
            },
            "responses": {
                "200": {
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Post" }
                            }
                        }
                    }
                },
                "204": { "description": "no content" },
                "404": {
                    "content": {
                        "*/*": { "schema": { "$ref": "#/components/schemas/PostInput" } }
                    }
                }
            }
        });

        let detail = describe_operation(&operation);
        assert_eq!(
            detail,
            json!({
                "parameters": [
                    { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } },
                    { "name": "verbose", "in": "query" }
                ],
                "requestBody": {
                    "required": true,
                    "schema": { "$ref": "#/components/schemas/PostInput" }
                },
                "responses": {
                    "200": { "type": "array", "items": { "$ref": "#/components/schemas/Post" } },
                    "404": { "$ref": "#/components/schemas/PostInput" }
                },
                "componentRefs": ["#/components/schemas/PostInput", "#/components/schemas/Post"]
            })
        );
    }

    #[test]
    fn composed_response_schemas_contribute_refs() {
        let operation = json!({
            "responses": {
                "200": {
                    "content": {
                        "application/json": {
                            "schema": {
                                "allOf": [
                                    { "$ref": "#/components/schemas/Page" },
                                    { "properties": { "items": { "$ref": "#/components/schemas/Post" } } }
                                ]
                            }
                        }
                    }
                },
                "400": {
                    "content": {
                        "application/json": {
                            "schema": { "oneOf": [{ "$ref": "#/components/schemas/ErrorMessage" }] }
                        }
                    }
                }
            }
        });

        let detail = describe_operation(&operation);
        assert_eq!(
            detail["componentRefs"],
            json!([
                "#/components/schemas/Page",
                "#/components/schemas/Post",
                "#/components/schemas/ErrorMessage"
            ])
        );
    }

    #[test]
    fn request_body_without_schema_is_omitted() {
        let operation = json!({
            "requestBody": { "required": true, "content": { "application/json": {} } },
            "responses": {}
        });
        let detail = describe_operation(&operation);
        assert!(detail.get("requestBody").is_none());
        assert_eq!(detail["parameters"], json!([]));
        assert_eq!(detail["componentRefs"], json!([]));
    }

    #[test]
    fn parameter_schema_falls_back_to_content() {
        let parameter = json!({
            "name": "filter",
            "in": "query",
            "content": { "application/json": { "schema": { "type": "object" } } }
        });
        assert_eq!(
            describe_parameter(&parameter),
            json!({ "name": "filter", "in": "query", "schema": { "type": "object" } })
        );
    }
}
