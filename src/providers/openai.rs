//! OpenAI-compatible HTTP transport

use super::{ChatRequest, ChatTransport, RawResponse, TransportError};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Chat-completions client for OpenAI-compatible servers
///
/// The endpoint is used verbatim, so it must be the full
/// `.../chat/completions` URL. One instance (and its connection pool) is
/// shared by every request in a run.
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl OpenAIProvider {
    /// Create a provider whose underlying client gives up after `timeout`
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            timeout,
        })
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for OpenAIProvider {
    async fn send(&self, request: &ChatRequest) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Connect(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        Ok(RawResponse { status, body })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
