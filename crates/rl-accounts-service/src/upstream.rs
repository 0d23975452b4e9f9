//! Client for the upstream users API behind `/api/proxy/users`.

use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Error type for upstream calls.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Upstream users API client.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Create a user upstream, relaying the upstream status and JSON body.
    ///
    /// A non-JSON upstream body is relayed as `null`.
    pub async fn create_user(
        &self,
        body: &serde_json::Value,
    ) -> Result<(StatusCode, serde_json::Value), UpstreamError> {
        let mut request = self.client.post(format!("{}/users", self.base_url)).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let payload = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        tracing::debug!(status = %status, "Upstream user create completed");
        Ok((status, payload))
    }
}
