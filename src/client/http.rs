//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::port::{Transport, TransportError, TransportRequest, TransportResponse};

/// Sends requests to the configured origin.
pub struct HttpTransport {
    http: HttpClient,
    base_url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
        }
    }

    /// Transport honouring the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Http`] if the underlying client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.origin.trim_end_matches('/').to_string(),
        })
    }

    fn classify(err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Network(e.to_string()))?;

        debug!(method = %request.method, url = %url, "Sending request");

        let response = self
            .http
            .request(method, &url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| Self::classify(&e))?;

        let status_code = response.status().as_u16();
        let body = response.text().await.map_err(|e| Self::classify(&e))?;

        debug!(status_code, bytes = body.len(), "Received response");
        Ok(TransportResponse { status_code, body })
    }
}
