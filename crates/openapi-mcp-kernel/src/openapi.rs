//! OpenAPI document index.
//!
//! [`IndexBuilder`] derives an [`OpenApiIndex`] from a raw document: the
//! sorted set of API groups (tags) and, per path, the operations it declares.
//! A fetched document and its index travel together as an
//! [`OpenApiSnapshot`], the unit the snapshot cache stores.

use crate::error::FetchError;
use crate::schema::text_of;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Raw parsed OpenAPI document.
pub type OpenApiDocument = Value;

/// Path-item keys that denote operations.
pub const OPERATION_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Per-operation metadata kept in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodEntry {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl MethodEntry {
    /// Whether any tag equals `group`, ignoring case.
    pub fn has_tag(&self, group: &str) -> bool {
        let group = group.to_lowercase();
        self.tags.iter().any(|tag| tag.to_lowercase() == group)
    }
}

/// Compact index of a document.
///
/// Every path in `api_index` has at least one method entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiIndex {
    /// Sorted, deduplicated union of root tag names and operation tags.
    pub api_groups: Vec<String>,
    /// path → lower-cased method → entry, in document order.
    pub api_index: IndexMap<String, IndexMap<String, MethodEntry>>,
}

/// A fetched document together with its index. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiSnapshot {
    pub document: OpenApiDocument,
    pub index: OpenApiIndex,
}

impl OpenApiSnapshot {
    /// Index `document` and bundle both.
    pub fn from_document(document: OpenApiDocument) -> Self {
        let index = IndexBuilder::build(&document);
        Self { document, index }
    }
}

/// Parse a fetched document body.
///
/// An empty or whitespace-only body is read as `{}` so a backend that serves
/// nothing yields an empty index instead of an error.
pub fn parse_document(url: &str, body: &str) -> Result<OpenApiDocument, FetchError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(body).map_err(|e| FetchError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Builds an [`OpenApiIndex`] from a raw document.
pub struct IndexBuilder;

impl IndexBuilder {
    pub fn build(document: &Value) -> OpenApiIndex {
        let mut groups = BTreeSet::new();

        if let Some(tags) = document.get("tags").and_then(Value::as_array) {
            for tag in tags {
                if let Some(name) = tag.get("name").and_then(Value::as_str) {
                    groups.insert(name.to_string());
                }
            }
        }

        let mut api_index = IndexMap::new();
        if let Some(paths) = document.get("paths").and_then(Value::as_object) {
            for (path, path_item) in paths {
                let Some(path_item) = path_item.as_object() else {
                    continue;
                };

                let mut methods = IndexMap::new();
                for (method, operation) in path_item {
                    let method = method.to_lowercase();
                    if !OPERATION_METHODS.contains(&method.as_str()) || !operation.is_object() {
                        continue;
                    }

                    let tags: Vec<String> = operation
                        .get("tags")
                        .and_then(Value::as_array)
                        .map(|tags| tags.iter().map(text_of).collect())
                        .unwrap_or_default();
                    groups.extend(tags.iter().cloned());

                    methods.insert(
                        method,
                        MethodEntry {
                            tags,
                            operation_id: text_field(operation, "operationId"),
                            summary: text_field(operation, "summary"),
                        },
                    );
                }

                if !methods.is_empty() {
                    api_index.insert(path.clone(), methods);
                }
            }
        }

        OpenApiIndex {
            api_groups: groups.into_iter().collect(),
            api_index,
        }
    }
}

fn text_field(node: &Value, field: &str) -> Option<String> {
    node.get(field).and_then(Value::as_str).map(str::to_string)
}
