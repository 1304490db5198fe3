//! Outcome classification
//!
//! [`classify`] is total: every transport error, non-200 status and
//! unparseable body becomes [`RequestOutcome::Failure`]. Only a 200 with a
//! readable `choices[0].message.content` is a success.

use crate::metrics::RequestOutcome;
use crate::providers::{ChatResponse, RawResponse, TransportError};
use crate::tokenizer::TokenCounter;
use std::time::Duration;
use thiserror::Error;

/// Reasons a received response is not a usable completion
#[derive(Debug, Error)]
enum ProtocolError {
    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("response has no choices")]
    MissingContent,
}

/// Classify one request
///
/// `latency` is the time from launch until the reply (or error) was
/// received. Tokens are `count(prompt) + count(completion)`.
pub fn classify(
    prompt: &str,
    reply: Result<RawResponse, TransportError>,
    latency: Duration,
    counter: &dyn TokenCounter,
) -> RequestOutcome {
    let response = match reply {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Request failed: {}", e);
            return RequestOutcome::Failure;
        }
    };

    match completion_text(&response) {
        Ok(text) => {
            let tokens = counter.count(prompt) + counter.count(&text);
            RequestOutcome::Success {
                tokens: tokens as u64,
                latency,
            }
        }
        Err(e) => {
            tracing::debug!("Request failed: {}", e);
            RequestOutcome::Failure
        }
    }
}

fn completion_text(response: &RawResponse) -> Result<String, ProtocolError> {
    if response.status != 200 {
        return Err(ProtocolError::Status(response.status));
    }

    let parsed: ChatResponse = serde_json::from_str(&response.body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(ProtocolError::MissingContent)
}
