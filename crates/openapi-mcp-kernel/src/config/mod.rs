//! Configuration System
//!
//! Loads the service list, cache TTL and server settings from a YAML, TOML
//! or JSON file.
//!
//! ## Features
//!
//! - Auto-detection of format from file extension
//! - Environment variable substitution (`${VAR}` and `$VAR` syntax) in the file body
//! - Environment overrides with a prefix and `__` as the nesting separator
//!   (`OPENAPI_MCP__CACHE__TTL_SECONDS=0`)

use crate::service::ServiceDescriptor;
use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "OPENAPI_MCP";

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// ─────────────────────────────────────────────────────────────────────────────
// Application configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration of the gateway binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backends whose OpenAPI documents are exposed. Later entries win on
    /// duplicate names.
    pub services: Vec<ServiceDescriptor>,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub http: HttpConfig,
}

/// Snapshot cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshot lifetime in seconds. `<= 0` disables caching.
    pub ttl_seconds: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 60 }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Outbound HTTP client settings shared by document fetches and proxy calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Upper bound on a proxied response body; larger bodies fail the call.
    pub max_response_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Detect configuration format from file extension
///
/// # Supported Extensions
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid braced env var pattern")
});

static SIMPLE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("valid env var pattern")
});

/// Substitute environment variables in a string
///
/// Supports both `${VAR_NAME}` and `$VAR_NAME` syntax. Unset variables are
/// left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    SIMPLE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Load configuration from a string with explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted_content = substitute_env_vars(content);

    let config = Cfg::builder()
        .add_source(File::from_str(&substituted_content, format))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration with environment variable overrides
///
/// Environment variables are prefixed with `env_prefix` and use double
/// underscores `__` for nesting: `cache.ttl_seconds` is overridden by
/// `{env_prefix}__CACHE__TTL_SECONDS`.
pub fn load_with_env<T>(path: &str, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    let substituted = substitute_env_vars(&content);

    let config = Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .add_source(env_source(env_prefix))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from environment overrides only, on top of defaults.
pub fn load_from_env<T>(env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let config = Cfg::builder()
        .add_source(env_source(env_prefix))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

fn env_source(env_prefix: &str) -> Environment {
    Environment::with_prefix(env_prefix)
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    /// Load the application config.
    ///
    /// When `path` exists it is read and overlaid with `OPENAPI_MCP__*`
    /// variables; otherwise only defaults and the environment apply.
    pub fn load(path: &str) -> ConfigResult<Self> {
        if Path::new(path).exists() {
            load_with_env(path, ENV_PREFIX)
        } else {
            tracing::warn!(path = %path, "config file not found, using defaults and environment");
            load_from_env(ENV_PREFIX)
        }
    }

    /// Cache TTL as a duration, or `None` when caching is disabled.
    pub fn cache_ttl(&self) -> Option<std::time::Duration> {
        u64::try_from(self.cache.ttl_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}
