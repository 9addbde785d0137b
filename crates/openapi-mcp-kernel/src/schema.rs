//! Schema normalization and component-reference extraction.
//!
//! Raw OpenAPI schema fragments are viewed through [`SchemaFragment`], a
//! tagged variant over the JSON tree (reference / object / array / scalar)
//! with typed accessors. [`extract_schema`] turns a fragment into the
//! compact [`SchemaNode`] handed back to agents, and [`collect_refs`] walks
//! a fragment for `$ref` targets.
//!
//! References are never followed: a node carrying `$ref` is reported as
//! exactly `{"$ref": ...}` and the caller asks for the component separately.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};

pub const REF_KEY: &str = "$ref";
const JSON_MEDIA_TYPE: &str = "application/json";
const COMPOSITION_KEYS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

/// Text rendering of a JSON scalar, as used for tags, enum values and refs.
///
/// Strings are returned verbatim, numbers and booleans in their JSON form,
/// `null` as `"null"`; containers have no text and yield an empty string.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SchemaFragment
// ─────────────────────────────────────────────────────────────────────────────

/// Borrowed, classified view of one raw schema node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaFragment<'a> {
    /// An object carrying `$ref`; holds the `$ref` value. Sibling keys are ignored.
    Ref(&'a Value),
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> SchemaFragment<'a> {
    pub fn classify(node: &'a Value) -> Self {
        match node {
            Value::Object(map) => match map.get(REF_KEY) {
                Some(reference) => SchemaFragment::Ref(reference),
                None => SchemaFragment::Object(map),
            },
            Value::Array(items) => SchemaFragment::Array(items),
            other => SchemaFragment::Scalar(other),
        }
    }

    /// The `$ref` target, if this fragment is a reference.
    pub fn reference(&self) -> Option<String> {
        match self {
            SchemaFragment::Ref(value) => Some(text_of(value)),
            _ => None,
        }
    }

    /// A field of an object fragment. References expose no fields.
    pub fn field(&self, key: &str) -> Option<&'a Value> {
        match self {
            SchemaFragment::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// A field, only if it is a JSON string.
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.field(key).and_then(Value::as_str)
    }

    /// A field, only if it is an array, rendered element-wise via [`text_of`].
    pub fn text_list(&self, key: &str) -> Option<Vec<String>> {
        self.field(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(text_of).collect())
    }

    pub fn properties(&self) -> Option<&'a Map<String, Value>> {
        self.field("properties").and_then(Value::as_object)
    }

    pub fn items(&self) -> Option<&'a Value> {
        self.field("items")
    }

    /// Members of a composition keyword (`allOf`, `oneOf`, `anyOf`).
    pub fn composition(&self, key: &str) -> &'a [Value] {
        self.field(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SchemaNode
// ─────────────────────────────────────────────────────────────────────────────

/// Normalized schema returned by the discovery operations.
///
/// Serializes either as `{"$ref": "..."}` or as an object containing only the
/// fields that were present in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaNode {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(InlineSchema),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InlineSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    pub fn reference(reference: impl Into<String>) -> Self {
        SchemaNode::Ref {
            reference: reference.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Normalize a raw schema node.
///
/// A node with `$ref` becomes a bare reference. Otherwise `type` and
/// `format` are copied when textual, `enum` and `required` when arrays,
/// `properties` and `items` are extracted recursively.
pub fn extract_schema(node: &Value) -> SchemaNode {
    let fragment = SchemaFragment::classify(node);
    if let Some(reference) = fragment.reference() {
        return SchemaNode::reference(reference);
    }

    let properties = fragment.properties().map(|props| {
        props
            .iter()
            .map(|(name, property)| (name.clone(), extract_schema(property)))
            .collect::<IndexMap<_, _>>()
    });

    SchemaNode::Inline(InlineSchema {
        schema_type: fragment.text("type").map(str::to_string),
        format: fragment.text("format").map(str::to_string),
        enum_values: fragment.text_list("enum"),
        required: fragment.text_list("required"),
        properties,
        items: fragment.items().map(|items| Box::new(extract_schema(items))),
    })
}

/// Schema of a parameter: the inline `schema` field, else via its `content`.
pub fn resolve_schema_node(parameter: &Value) -> Option<&Value> {
    match parameter.get("schema") {
        Some(schema) => Some(schema),
        None => resolve_schema_node_from_content(parameter.get("content")),
    }
}

/// Schema of a `content` map: `application/json` first, else the first
/// declared media type in document order.
pub fn resolve_schema_node_from_content(content: Option<&Value>) -> Option<&Value> {
    let media_types = content?.as_object()?;
    match media_types.get(JSON_MEDIA_TYPE) {
        Some(json) => json.get("schema"),
        None => media_types.values().next()?.get("schema"),
    }
}

/// Collect `$ref` targets from a raw schema node into `refs`.
///
/// Descends through `properties.*`, `items` and the members of `allOf`,
/// `oneOf` and `anyOf`; stops at the first `$ref` on each branch. `refs`
/// keeps first-seen order.
pub fn collect_refs(node: &Value, refs: &mut IndexSet<String>) {
    let fragment = SchemaFragment::classify(node);
    if let Some(reference) = fragment.reference() {
        refs.insert(reference);
        return;
    }

    if let Some(properties) = fragment.properties() {
        for property in properties.values() {
            collect_refs(property, refs);
        }
    }
    if let Some(items) = fragment.items() {
        collect_refs(items, refs);
    }
    for key in COMPOSITION_KEYS {
        for member in fragment.composition(key) {
            collect_refs(member, refs);
        }
    }
}
