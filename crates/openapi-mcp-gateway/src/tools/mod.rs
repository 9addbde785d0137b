//! Tool operations and name-based dispatch.
//!
//! | Tool | Operation |
//! |------|-----------|
//! | `listServices` | [`DiscoveryTools::list_services`] |
//! | `listApis` | [`DiscoveryTools::list_apis`] |
//! | `getApiDetail` | [`DiscoveryTools::get_api_detail`] |
//! | `getComponentSchemas` | [`DiscoveryTools::get_component_schemas`] |
//! | `callApi` | [`ApiCallerTools::call_api`] |

mod discovery;
mod proxy;
mod support;

pub use discovery::DiscoveryTools;
pub use proxy::{ApiCallRequest, ApiCallerTools};
pub use support::ToolSupport;

use crate::error::ToolCallError;
use openapi_mcp_kernel::FetchError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

pub const LIST_SERVICES: &str = "listServices";
pub const LIST_APIS: &str = "listApis";
pub const GET_API_DETAIL: &str = "getApiDetail";
pub const GET_COMPONENT_SCHEMAS: &str = "getComponentSchemas";
pub const CALL_API: &str = "callApi";

/// Name, description and JSON-Schema parameters of one tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListApisArgs {
    service_name: String,
    #[serde(default)]
    api_group: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDetailArgs {
    service_name: String,
    request_url: String,
    http_method: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentSchemasArgs {
    service_name: String,
    refs: String,
}

/// Routes a tool name and JSON arguments to the matching operation.
pub struct ToolRouter {
    discovery: DiscoveryTools,
    caller: ApiCallerTools,
}

impl ToolRouter {
    pub fn new(discovery: DiscoveryTools, caller: ApiCallerTools) -> Self {
        Self { discovery, caller }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let service_name = json!({ "type": "string", "description": "Service name" });
        vec![
            ToolDefinition {
                name: LIST_SERVICES,
                description: "List services and API groups available in this gateway",
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            ToolDefinition {
                name: LIST_APIS,
                description: "List APIs for a service, optionally filtered by API group (tag)",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "serviceName": service_name,
                        "apiGroup": { "type": "string", "description": "API group tag to filter" }
                    },
                    "required": ["serviceName"]
                }),
            },
            ToolDefinition {
                name: GET_API_DETAIL,
                description: "Get detailed API info for a path and method",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "serviceName": service_name,
                        "requestUrl": { "type": "string", "description": "Request path, e.g. /posts/{id}" },
                        "httpMethod": { "type": "string", "description": "HTTP method, e.g. GET" }
                    },
                    "required": ["serviceName", "requestUrl", "httpMethod"]
                }),
            },
            ToolDefinition {
                name: GET_COMPONENT_SCHEMAS,
                description: "Get component schemas by ref",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "serviceName": service_name,
                        "refs": {
                            "type": "string",
                            "description": "Comma-separated component refs, e.g. #/components/schemas/ErrorMessage"
                        }
                    },
                    "required": ["serviceName", "refs"]
                }),
            },
            ToolDefinition {
                name: CALL_API,
                description: "Call a service endpoint with optional headers, query params, and JSON body",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "serviceName": service_name,
                        "method": { "type": "string", "description": "HTTP method, e.g. GET" },
                        "path": { "type": "string", "description": "Request path, e.g. /posts/1" },
                        "headers": {
                            "type": "object",
                            "description": "Headers map",
                            "additionalProperties": { "type": "string" }
                        },
                        "queryParams": {
                            "type": "object",
                            "description": "Query params map, values already percent-encoded",
                            "additionalProperties": { "type": "string" }
                        },
                        "body": { "description": "JSON body object or string" }
                    },
                    "required": ["serviceName", "method", "path"]
                }),
            },
        ]
    }

    /// Invoke tool `name` and return its JSON result as text.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolCallError> {
        debug!(tool = %name, "tool call");
        let arguments = match arguments {
            Value::Null => json!({}),
            other => other,
        };

        let result = match name {
            LIST_SERVICES => self.discovery.list_services().await,
            LIST_APIS => {
                let args: ListApisArgs = parse_args(name, arguments)?;
                self.discovery
                    .list_apis(&args.service_name, args.api_group.as_deref())
                    .await
                    .map_err(|source| fetch_failed(&args.service_name, source))?
            }
            GET_API_DETAIL => {
                let args: ApiDetailArgs = parse_args(name, arguments)?;
                self.discovery
                    .get_api_detail(&args.service_name, &args.request_url, &args.http_method)
                    .await
                    .map_err(|source| fetch_failed(&args.service_name, source))?
            }
            GET_COMPONENT_SCHEMAS => {
                let args: ComponentSchemasArgs = parse_args(name, arguments)?;
                self.discovery
                    .get_component_schemas(&args.service_name, &args.refs)
                    .await
                    .map_err(|source| fetch_failed(&args.service_name, source))?
            }
            CALL_API => {
                let request: ApiCallRequest = parse_args(name, arguments)?;
                self.caller.call_api(request).await
            }
            _ => return Err(ToolCallError::UnknownTool(name.to_string())),
        };

        Ok(result.to_string())
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolCallError> {
    serde_json::from_value(arguments).map_err(|e| ToolCallError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn fetch_failed(service_name: &str, source: FetchError) -> ToolCallError {
    ToolCallError::Fetch {
        service_name: service_name.to_string(),
        source,
    }
}
