//! OpenAPI MCP gateway: entry point.
//!
//! Usage: `openapi-mcp-gateway [CONFIG]`
//!
//! | Source | Meaning |
//! |--------|---------|
//! | first argument | Config file path (YAML, TOML or JSON). |
//! | `OPENAPI_MCP_CONFIG` | Config file path when no argument is given. |
//! | `OPENAPI_MCP__*` | Overrides, e.g. `OPENAPI_MCP__SERVER__PORT=9000`. |
//! | `RUST_LOG` | Log filter, default `openapi_mcp_gateway=info`. |

use openapi_mcp_gateway::server::GatewayServer;
use openapi_mcp_kernel::config::AppConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "openapi-mcp.yaml";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("openapi_mcp_gateway=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OPENAPI_MCP_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %config_path, error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    info!(
        path = %config_path,
        services = config.services.len(),
        "configuration loaded"
    );

    if let Err(e) = GatewayServer::new(config).start().await {
        error!(error = %e, "gateway error");
        std::process::exit(1);
    }
}
