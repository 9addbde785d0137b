//! OpenAPI document fetching.
//!
//! [`DocumentFetcher`] is the seam between the snapshot cache and the
//! network; [`HttpDocumentFetcher`] is the reqwest implementation.

use async_trait::async_trait;
use openapi_mcp_kernel::openapi::parse_document;
use openapi_mcp_kernel::{FetchError, OpenApiDocument, ServiceDescriptor};
use reqwest::Client;
use tracing::{debug, instrument};

/// Retrieves the raw OpenAPI document of a service.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, service: &ServiceDescriptor) -> Result<OpenApiDocument, FetchError>;
}

/// Fetches `<base_url><api_docs_path>` with a plain HTTP GET.
pub struct HttpDocumentFetcher {
    client: Client,
}

impl HttpDocumentFetcher {
    /// Wrap a shared client. Timeouts and other transport policy are the
    /// client's configuration.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    #[instrument(skip(self, service), fields(service = %service.name))]
    async fn fetch(&self, service: &ServiceDescriptor) -> Result<OpenApiDocument, FetchError> {
        let url = service.docs_url();
        debug!(url = %url, "fetching OpenAPI document");

        let network_error = |e: reqwest::Error| FetchError::Network {
            url: url.clone(),
            message: e.to_string(),
        };

        let response = self.client.get(&url).send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(network_error)?;
        parse_document(&url, &body)
    }
}
