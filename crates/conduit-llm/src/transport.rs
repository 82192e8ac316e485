//! Outbound HTTP for both adapters

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::{Map, Value};

use crate::error::{InvokeError, classify_status};

/// Connect and read ceiling applied to every call, streaming or not
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Bearer-authenticated JSON POST client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Client with the default timeouts
    pub fn new() -> Result<Self, InvokeError> {
        let client = Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .read_timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| InvokeError::Invocation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// POST `body` to `url`, returning the response only if its status is 2xx
    ///
    /// Network faults map to [`InvokeError::Connection`]; non-2xx statuses are
    /// classified from the status and the error body.
    pub async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Map<String, Value>,
    ) -> Result<Response, InvokeError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = %url, error = %e, "upstream request failed");
                InvokeError::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!(endpoint = %url, status = %status, "upstream returned error");

        Err(classify_status(status.as_u16(), &text))
    }
}
