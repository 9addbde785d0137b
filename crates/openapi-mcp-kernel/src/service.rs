//! Configured backend services: kernel contract.
//!
//! A [`ServiceDescriptor`] names one REST backend and where its OpenAPI
//! document lives. The [`ServiceRegistry`] trait is the lookup abstraction
//! every tool operation goes through; the in-memory implementation lives in
//! `openapi-mcp-gateway`.

use serde::{Deserialize, Serialize};

/// Default location of the OpenAPI document relative to `base_url`.
pub const DEFAULT_API_DOCS_PATH: &str = "/v3/api-docs";

fn default_api_docs_path() -> String {
    DEFAULT_API_DOCS_PATH.to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// One configured backend service.
///
/// `name` is the external lookup key. A descriptor with a blank `name` is
/// kept in the configuration listing but can never be resolved; a blank
/// `base_url` resolves but every operation on it reports `Base URL is empty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_api_docs_path")]
    pub api_docs_path: String,
}

impl ServiceDescriptor {
    /// Construct a descriptor using the default docs path.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_docs_path: default_api_docs_path(),
        }
    }

    /// Builder: override the OpenAPI document path.
    pub fn with_api_docs_path(mut self, path: impl Into<String>) -> Self {
        self.api_docs_path = path.into();
        self
    }

    /// `base_url` with any trailing slashes removed.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Full URL of the OpenAPI document: `base_url` + normalized `api_docs_path`.
    pub fn docs_url(&self) -> String {
        format!(
            "{}{}",
            self.trimmed_base_url(),
            normalize_path(&self.api_docs_path)
        )
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn has_base_url(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

/// Ensure `path` starts with a single leading `/`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceRegistry trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for the static service registry.
pub trait ServiceRegistry: Send + Sync {
    /// Look up a service by name. Blank names never resolve.
    fn lookup(&self, name: &str) -> Option<&ServiceDescriptor>;

    /// Every configured descriptor, in configuration order, blank names included.
    fn list_all(&self) -> Vec<&ServiceDescriptor>;

    /// Sorted names of all services with a non-blank name.
    ///
    /// Used as the `available` field of the unknown-service error.
    fn available_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .list_all()
            .into_iter()
            .filter(|s| s.has_name())
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
