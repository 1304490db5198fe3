//! genai-escalate - rate-escalating load tester for chat-completion APIs
//!
//! Sends bursts of requests at successively higher rates-per-minute,
//! measures each stage's failure rate and token throughput, and stops the
//! first time a stage's failure rate reaches the threshold.
//!
//! # Architecture
//!
//! - **Classifier**: turns one reply (or transport error) into a success/failure outcome
//! - **Runner**: paces and dispatches one stage's requests, then joins them
//! - **Metrics**: aggregates a stage's outcomes into a `StageResult`
//! - **Escalation**: the stage-by-stage continue/halt state machine
//! - **Providers**: the `ChatTransport` seam and its OpenAI-compatible HTTP client
//!
//! # Example
//!
//! ```rust,no_run
//! use genai_escalate::{EscalationConfig, EscalationDriver, PromptCorpus};
//! use genai_escalate::providers::openai::OpenAIProvider;
//! use genai_escalate::tokenizer::WhitespaceTokenCounter;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EscalationConfig::new(
//!         "http://localhost:8000/v1/chat/completions",
//!         "my-model",
//!     );
//!     let provider = OpenAIProvider::new(
//!         config.endpoint.clone(),
//!         None,
//!         config.request_timeout,
//!     )?;
//!     let corpus = PromptCorpus::from_prompt("Hello!".to_string())?;
//!
//!     let driver = EscalationDriver::new(
//!         config,
//!         Arc::new(provider),
//!         Arc::new(corpus),
//!         Arc::new(WhitespaceTokenCounter),
//!     )?;
//!     let run = driver.run().await?;
//!     println!("{:?}", run.termination);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod escalation;
pub mod metrics;
pub mod providers;
pub mod report;
pub mod runner;
pub mod sampling;
pub mod tokenizer;

// Re-export commonly used types
pub use config::{ConfigError, EscalationConfig};
pub use error::{Error, Result};
pub use escalation::{EscalationDriver, EscalationRun, Termination};
pub use metrics::{RequestOutcome, StageAggregator, StageResult};
pub use providers::{ChatTransport, RawResponse, TransportError};
pub use sampling::PromptCorpus;
