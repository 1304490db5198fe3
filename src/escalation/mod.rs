//! Escalation driver
//!
//! Runs one stage per configured rate, strictly in order, and stops the first
//! time a stage's failure rate reaches the threshold.
//!
//! ```text
//! Pending(i) -> Running(i) -> Evaluating(i, r) -+-> Continuing(i) -> Pending(i+1)
//!                                               |                 \-> Completed
//!                                               \-> Halted(i, r)
//! ```


use crate::config::EscalationConfig;
use crate::error::Result;
use crate::metrics::StageResult;
use crate::providers::ChatTransport;
use crate::runner::{RequestSettings, StageRunner};
use crate::sampling::PromptCorpus;
use crate::tokenizer::TokenCounter;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

/// Driver state
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationState {
    /// Stage `i` is next
    Pending(usize),
    /// Stage `i` is dispatching or draining
    Running(usize),
    /// Stage `i` finished with this result
    Evaluating(usize, StageResult),
    /// Stage `i` passed
    Continuing(usize),
    /// Stage `i` breached the threshold (terminal)
    Halted(usize, StageResult),
    /// Every stage passed (terminal)
    Completed,
}

impl EscalationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EscalationState::Halted(..) | EscalationState::Completed)
    }
}

/// Decide what follows an evaluated stage
pub fn evaluate(index: usize, result: StageResult, threshold: f64) -> EscalationState {
    if result.failure_rate() < threshold {
        EscalationState::Continuing(index)
    } else {
        EscalationState::Halted(index, result)
    }
}

/// Move past a passed stage
pub fn advance(index: usize, stage_count: usize) -> EscalationState {
    if index + 1 < stage_count {
        EscalationState::Pending(index + 1)
    } else {
        EscalationState::Completed
    }
}

/// Result of one stage within a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub rpm: u32,
    pub result: StageResult,
}

/// Why the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// All stages stayed under the threshold
    Completed,
    /// The stage at `stage_index` reached the threshold
    Halted { stage_index: usize, rpm: u32 },
}

/// Ordered stage results plus the terminal reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationRun {
    pub stages: Vec<StageRecord>,
    pub termination: Termination,
}

impl EscalationRun {
    pub fn is_halted(&self) -> bool {
        matches!(self.termination, Termination::Halted { .. })
    }

    /// Highest rate whose stage stayed under the threshold
    pub fn max_sustained_rpm(&self) -> Option<u32> {
        let passed = match self.termination {
            Termination::Completed => self.stages.len(),
            Termination::Halted { stage_index, .. } => stage_index,
        };
        self.stages[..passed].last().map(|s| s.rpm)
    }
}

/// Drives stages over the configured rates
pub struct EscalationDriver<T: ChatTransport> {
    config: EscalationConfig,
    runner: StageRunner<T>,
}

impl<T: ChatTransport + 'static> EscalationDriver<T> {
    /// Create a driver; the configuration is validated here so that no
    /// stage starts with a bad schedule
    pub fn new(
        config: EscalationConfig,
        transport: Arc<T>,
        corpus: Arc<PromptCorpus>,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self> {
        config.validate()?;

        let runner = StageRunner::new(
            transport,
            corpus,
            counter,
            RequestSettings::from(&config),
        );

        Ok(Self { config, runner })
    }

    /// Show per-stage progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.runner = self.runner.with_progress(show);
        self
    }

    /// Validated configuration the driver runs with
    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Run stages until one halts or all complete
    pub async fn run(&self) -> Result<EscalationRun> {
        let rates = &self.config.rates;
        let threshold = self.config.failure_threshold;
        let mut stages = Vec::with_capacity(rates.len());
        let mut state = EscalationState::Pending(0);

        while !state.is_terminal() {
            state = match state {
                EscalationState::Pending(i) => {
                    tracing::info!(
                        "Stage {}/{}: {} requests/minute ({:.2} rps)",
                        i + 1,
                        rates.len(),
                        rates[i],
                        rates[i] as f64 / 60.0
                    );
                    EscalationState::Running(i)
                }
                EscalationState::Running(i) => {
                    let started = Instant::now();
                    let result = self.runner.run_stage(rates[i]).await?;
                    let elapsed = started.elapsed();
                    if elapsed.as_secs() > self.config.stage_budget.as_secs() {
                        tracing::warn!(
                            "Stage at {} rpm took {:.1}s, over the {:.0}s budget",
                            rates[i],
                            elapsed.as_secs_f64(),
                            self.config.stage_budget.as_secs_f64()
                        );
                    }
                    EscalationState::Evaluating(i, result)
                }
                EscalationState::Evaluating(i, result) => {
                    tracing::info!(
                        "Stage at {} rpm: {} ok, {} failed ({:.1}% failures), {:.2} tokens/sec",
                        rates[i],
                        result.success_count,
                        result.fail_count,
                        result.failure_rate() * 100.0,
                        result.tokens_per_second()
                    );
                    stages.push(StageRecord {
                        rpm: rates[i],
                        result,
                    });
                    evaluate(i, result, threshold)
                }
                EscalationState::Continuing(i) => advance(i, rates.len()),
                terminal => terminal,
            };
        }

        let termination = match state {
            EscalationState::Halted(i, result) => {
                tracing::info!(
                    "Halting: {:.1}% of requests failed at {} rpm (threshold {:.1}%)",
                    result.failure_rate() * 100.0,
                    rates[i],
                    threshold * 100.0
                );
                Termination::Halted {
                    stage_index: i,
                    rpm: rates[i],
                }
            }
            _ => {
                tracing::info!("All {} stages passed", rates.len());
                Termination::Completed
            }
        };

        Ok(EscalationRun {
            stages,
            termination,
        })
    }
}
