//! Chat-completion transport
//!
//! The escalation core only needs a way to POST one chat request and get the
//! raw `(status, body)` pair back. [`ChatTransport`] is that seam; the
//! [`openai`] module implements it over HTTP.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Request payload for a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Build a single-turn request carrying `prompt` as the user message
    pub fn user_prompt(
        model: impl Into<String>,
        prompt: impl Into<String>,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.into(),
            }],
            temperature,
            max_tokens,
        }
    }
}

/// Message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Successful-response shape; only the fields the classifier reads
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

/// A single completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

/// Message inside a completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

/// Status and body exactly as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failures below the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response within the per-request timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure, ...
    #[error("connection failed: {0}")]
    Connect(String),

    /// Response started but the body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Sends one chat request and returns the raw reply
///
/// Implementations are shared read-only by every in-flight request of a
/// stage, so `send` takes `&self`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// POST the request and return its status and body
    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, TransportError>;

    /// Transport name for logs
    fn name(&self) -> &str;
}
