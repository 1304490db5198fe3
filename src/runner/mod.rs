//! Stage execution
//!
//! A stage launches exactly `rpm` requests, one per pacing tick, without
//! waiting for earlier requests to finish. After one more interval following
//! the last launch, the runner waits for every outstanding request before
//! aggregating.

pub mod rate_controller;

pub use rate_controller::{Pacer, RateController};

use crate::classifier::classify;
use crate::config::EscalationConfig;
use crate::error::Result;
use crate::metrics::{RequestOutcome, StageAggregator, StageResult};
use crate::providers::{ChatRequest, ChatTransport, TransportError};
use crate::sampling::PromptCorpus;
use crate::tokenizer::TokenCounter;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};

/// Payload and timeout settings shared by every request of a run
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub request_timeout: Duration,
}

impl From<&EscalationConfig> for RequestSettings {
    fn from(config: &EscalationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout: config.request_timeout,
        }
    }
}

/// Dispatches the requests of one stage under uniform pacing
pub struct StageRunner<T: ChatTransport> {
    transport: Arc<T>,
    corpus: Arc<PromptCorpus>,
    counter: Arc<dyn TokenCounter>,
    settings: RequestSettings,
    show_progress: bool,
}

impl<T: ChatTransport + 'static> StageRunner<T> {
    /// Create a new stage runner
    pub fn new(
        transport: Arc<T>,
        corpus: Arc<PromptCorpus>,
        counter: Arc<dyn TokenCounter>,
        settings: RequestSettings,
    ) -> Self {
        Self {
            transport,
            corpus,
            counter,
            settings,
            show_progress: false,
        }
    }

    /// Show an indicatif bar counting resolved requests
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run one stage at `rpm` and return its finalized result
    pub async fn run_stage(&self, rpm: u32) -> Result<StageResult> {
        let controller = RateController::new(rpm)?;
        let mut pacer = controller.pacer();
        let pb = self.progress_bar(rpm);

        tracing::debug!(
            "Stage {} rpm: launching every {:?} via {}",
            rpm,
            controller.interval(),
            self.transport.name()
        );

        let mut handles = Vec::with_capacity(rpm as usize);
        for i in 0..rpm as usize {
            pacer.tick().await;

            let prompt = self.corpus.get(i).to_string();
            let request = ChatRequest::user_prompt(
                self.settings.model.clone(),
                prompt.clone(),
                self.settings.temperature,
                self.settings.max_tokens,
            );
            let transport = self.transport.clone();
            let counter = self.counter.clone();
            let request_timeout = self.settings.request_timeout;
            let pb = pb.clone();

            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                let reply = match timeout(request_timeout, transport.send(&request)).await {
                    Ok(reply) => reply,
                    Err(_) => Err(TransportError::Timeout(request_timeout)),
                };
                let outcome = classify(&prompt, reply, start.elapsed(), counter.as_ref());
                pb.inc(1);
                outcome
            }));
        }

        // The last launch still gets its full interval before the stage drains.
        pacer.tick().await;

        let mut aggregator = StageAggregator::new(rpm as usize);
        for (i, joined) in join_all(handles).await.into_iter().enumerate() {
            let outcome = joined.unwrap_or_else(|e| {
                tracing::warn!("Request {} task aborted: {}", i + 1, e);
                RequestOutcome::Failure
            });
            aggregator.record(outcome);
        }

        pb.finish_and_clear();
        aggregator.finalize()
    }

    fn progress_bar(&self, rpm: u32) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(rpm as u64);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(format!("{} rpm", rpm));
        pb
    }
}
