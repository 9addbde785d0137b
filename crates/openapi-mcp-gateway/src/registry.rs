//! In-memory [`ServiceRegistry`] implementation.

use openapi_mcp_kernel::{ServiceDescriptor, ServiceRegistry};
use std::collections::HashMap;

/// [`ServiceRegistry`] backed by the configured service list.
///
/// Built once at startup and read-only afterwards. When two descriptors
/// share a name, lookups resolve to the one configured last; both still
/// appear in [`list_all`](ServiceRegistry::list_all).
#[derive(Debug, Default)]
pub struct InMemoryServiceRegistry {
    services: Vec<ServiceDescriptor>,
    by_name: HashMap<String, usize>,
}

impl InMemoryServiceRegistry {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        let by_name = services
            .iter()
            .enumerate()
            .filter(|(_, s)| s.has_name())
            .map(|(idx, s)| (s.name.clone(), idx))
            .collect();
        Self { services, by_name }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn lookup(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.by_name.get(name).map(|idx| &self.services[*idx])
    }

    fn list_all(&self) -> Vec<&ServiceDescriptor> {
        self.services.iter().collect()
    }
}
