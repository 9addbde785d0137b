//! Service resolution and error shaping shared by every tool group.

use crate::error::ToolError;
use openapi_mcp_kernel::{FetchError, ServiceDescriptor, ServiceRegistry};
use serde_json::Value;
use std::sync::Arc;

/// Registry access injected into each tool group.
#[derive(Clone)]
pub struct ToolSupport {
    registry: Arc<dyn ServiceRegistry>,
}

impl ToolSupport {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &dyn ServiceRegistry {
        self.registry.as_ref()
    }

    /// Resolve `service_name` to a descriptor with a usable base URL.
    pub fn resolve_service(&self, service_name: &str) -> Result<&ServiceDescriptor, ToolError> {
        let service = self
            .registry
            .lookup(service_name)
            .ok_or_else(|| ToolError::UnknownService {
                service_name: service_name.to_string(),
                available: self.registry.available_names(),
            })?;

        if !service.has_base_url() {
            return Err(ToolError::MissingBaseUrl {
                service_name: service_name.to_string(),
            });
        }
        Ok(service)
    }
}

/// Render validation failures as their JSON payload while letting a
/// snapshot fetch failure escape to the invoking runtime.
pub fn shape_discovery(result: Result<Value, ToolError>) -> Result<Value, FetchError> {
    match result {
        Ok(value) => Ok(value),
        Err(ToolError::OpenApiFetchFailed(err)) => Err(err),
        Err(err) => Ok(err.to_payload()),
    }
}

/// Render every failure as its JSON payload.
pub fn shape(result: Result<Value, ToolError>) -> Value {
    result.unwrap_or_else(|err| err.to_payload())
}
