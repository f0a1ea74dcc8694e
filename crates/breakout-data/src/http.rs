//! reqwest-backed HTTP transport.

use async_trait::async_trait;
use std::sync::Arc;
use breakout_core::error::DataError;
use breakout_core::traits::{HttpClient, HttpRequest, HttpResponse};
use tracing::debug;

/// Production HTTP client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    /// Create a client with default connection settings.
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DataError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Wrap a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, DataError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(url = %request.url, timeout = ?request.timeout, "GET");
        let response = builder
            .send()
            .await
            .map_err(|e| classify(&request.url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(&request.url, e))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn classify(url: &str, error: reqwest::Error) -> DataError {
    if error.is_timeout() {
        DataError::Timeout(format!("{}: {}", url, error))
    } else if error.is_connect() {
        DataError::ConnectionError(format!("{}: {}", url, error))
    } else {
        DataError::Internal(format!("request to {} failed: {}", url, error))
    }
}
