//! Escalation run configuration
//!
//! The configuration is built once at startup and handed to the
//! [`EscalationDriver`](crate::escalation::EscalationDriver) by value. Nothing
//! in the core reads ambient global state.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rates tried when none are supplied, in requests per minute
pub const DEFAULT_RATES_RPM: [u32; 6] = [30, 60, 120, 300, 600, 1200];

/// A stage whose failure rate reaches this value halts the run
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.5;

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Expected wall-clock length of one stage (informational)
pub const DEFAULT_STAGE_BUDGET: Duration = Duration::from_secs(60);

/// Sampling temperature sent with every request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Escalation run configuration
///
/// Describes the endpoint under test, the request payload, and the
/// escalation schedule with its stop threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Full chat-completions URL requests are POSTed to
    pub endpoint: String,

    /// Bearer key, sent as `Authorization: Bearer <key>` when present
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    /// Model identifier placed in every payload
    pub model: String,

    /// Requests-per-minute for each stage, strictly increasing
    pub rates: Vec<u32>,

    /// Failure rate at or above which the run halts
    pub failure_threshold: f64,

    /// Sampling temperature
    pub temperature: f32,

    /// Optional completion length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-request timeout; an expired request counts as a failure
    pub request_timeout: Duration,

    /// Expected stage length. Overruns are logged, never enforced.
    pub stage_budget: Duration,
}

impl EscalationConfig {
    /// Create a config for the given endpoint and model with default schedule
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: model.into(),
            rates: DEFAULT_RATES_RPM.to_vec(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stage_budget: DEFAULT_STAGE_BUDGET,
        }
    }

    /// Set the bearer key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the escalation schedule
    pub fn with_rates(mut self, rates: Vec<u32>) -> Self {
        self.rates = rates;
        self
    }

    /// Set the halting failure rate
    pub fn with_failure_threshold(mut self, threshold: f64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the completion length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the informational stage budget
    pub fn with_stage_budget(mut self, budget: Duration) -> Self {
        self.stage_budget = budget;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("endpoint"));
        }

        let url = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField("model"));
        }

        if self.rates.is_empty() {
            return Err(ConfigError::NoRates);
        }

        for (i, &rpm) in self.rates.iter().enumerate() {
            if rpm == 0 {
                return Err(ConfigError::InvalidRate(rpm));
            }
            if i > 0 && rpm <= self.rates[i - 1] {
                return Err(ConfigError::RatesNotIncreasing {
                    previous: self.rates[i - 1],
                    next: rpm,
                });
            }
        }

        if !(self.failure_threshold > 0.0 && self.failure_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(self.failure_threshold));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(self.request_timeout));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required field is empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Endpoint is not an absolute http(s) URL
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No stages to run
    #[error("rate list is empty")]
    NoRates,

    /// Requests per minute must be at least 1
    #[error("invalid rate: {0} rpm (must be at least 1)")]
    InvalidRate(u32),

    /// Stages must escalate
    #[error("rates must be strictly increasing, got {previous} then {next}")]
    RatesNotIncreasing { previous: u32, next: u32 },

    /// Threshold outside (0, 1]
    #[error("invalid failure threshold: {0} (must be in (0, 1])")]
    InvalidThreshold(f64),

    /// Zero request timeout
    #[error("invalid request timeout: {0:?}")]
    InvalidTimeout(Duration),

    /// Prompt corpus has no usable prompts
    #[error("prompt corpus is empty")]
    EmptyCorpus,
}
