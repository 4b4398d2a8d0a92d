//! Transport for completion requests.

use crate::error::{DocFinderError, EndpointFailure, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Maximum number of response body characters kept in error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Sends a JSON payload to an endpoint and returns the JSON reply.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        headers: &[(String, String)],
        payload: &Value,
    ) -> Result<Value>;
}

/// Production sender backed by `reqwest`.
pub struct HttpRequestSender {
    client: reqwest::Client,
}

impl HttpRequestSender {
    /// Create a sender whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocFinderError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

pub(crate) fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Excerpt of a failed response's body, or a note saying why it could not be read.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => excerpt(&body),
        Err(e) => {
            warn!("Failed to read error response body: {}", e);
            format!("<unreadable body: {}>", e)
        }
    }
}

#[async_trait]
impl RequestSender for HttpRequestSender {
    #[instrument(skip(self, headers, payload))]
    async fn send(
        &self,
        endpoint: &str,
        headers: &[(String, String)],
        payload: &Value,
    ) -> Result<Value> {
        debug!("Sending request to {}", endpoint);

        let mut request = self.client.post(endpoint).json(payload);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            let failure = EndpointFailure::from_reqwest(endpoint, &e);
            error!("Failed to make the request: {}", failure);
            failure
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let failure = EndpointFailure::from_reqwest(endpoint, &e);
            error!("Failed to read the response: {}", failure);
            failure
        })?;

        if !status.is_success() {
            let failure = EndpointFailure::Status {
                url: endpoint.to_string(),
                status: status.as_u16(),
                body: excerpt(&body),
            };
            error!("{}", failure);
            return Err(failure.into());
        }

        serde_json::from_str(&body).map_err(|e| {
            let failure = EndpointFailure::InvalidResponse {
                url: endpoint.to_string(),
                message: e.to_string(),
            };
            error!("Failed to parse the response as JSON: {}", failure);
            failure.into()
        })
    }
}
