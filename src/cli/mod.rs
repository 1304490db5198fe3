//! CLI argument parsing and run wiring

use crate::config::{
    EscalationConfig, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RATES_RPM, DEFAULT_TEMPERATURE,
};
use crate::escalation::EscalationDriver;
use crate::providers::openai::OpenAIProvider;
use crate::report::RunSummary;
use crate::sampling::PromptCorpus;
use crate::tokenizer::{TiktokenCounter, TokenCounter, WhitespaceTokenCounter};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Token counting backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TokenizerKind {
    /// tiktoken cl100k_base
    Cl100k,
    /// Whitespace word count (offline, approximate)
    Whitespace,
}

/// Report format printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// genai-escalate - find the request rate a chat-completion API sustains
#[derive(Parser, Debug)]
#[command(name = "genai-escalate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Full chat-completions URL
    #[arg(short, long, env = "OPENAI_API_BASE")]
    pub endpoint: String,

    /// API key sent as a bearer token
    #[arg(short = 'k', long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(short, long, env = "OPENAI_API_MODEL")]
    pub model: String,

    /// Escalation rates in requests per minute, comma separated
    #[arg(short, long, value_delimiter = ',', default_values_t = DEFAULT_RATES_RPM)]
    pub rates: Vec<u32>,

    /// Stop once a stage's failure rate reaches this fraction
    #[arg(long, default_value_t = DEFAULT_FAILURE_THRESHOLD)]
    pub max_failure_rate: f64,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub request_timeout_secs: u64,

    /// Expected stage length in seconds; overruns are only logged
    #[arg(long, default_value = "60")]
    pub stage_budget_secs: u64,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Maximum tokens in each response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Prompt dataset: .jsonl with a "prompt" field, or one prompt per line
    #[arg(short, long)]
    pub dataset_path: Option<PathBuf>,

    /// Keep only the first N prompts of the dataset
    #[arg(long, default_value = "200")]
    pub dataset_limit: usize,

    /// Prompt to use if no dataset is provided
    #[arg(long, default_value = "Hello, how are you today?")]
    pub default_prompt: String,

    /// Token counter used for throughput
    #[arg(long, value_enum, default_value = "cl100k")]
    pub tokenizer: TokenizerKind,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Hide per-stage progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the run configuration from flags
    pub fn config(&self) -> EscalationConfig {
        let mut config = EscalationConfig::new(self.endpoint.clone(), self.model.clone())
            .with_rates(self.rates.clone())
            .with_failure_threshold(self.max_failure_rate)
            .with_temperature(self.temperature)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_stage_budget(Duration::from_secs(self.stage_budget_secs));

        if let Some(ref key) = self.api_key {
            config = config.with_api_key(key.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        config
    }

    /// Load the prompt corpus
    pub fn corpus(&self) -> Result<PromptCorpus> {
        match self.dataset_path {
            Some(ref path) => PromptCorpus::from_file(path, Some(self.dataset_limit))
                .with_context(|| format!("Failed to load dataset from: {}", path.display())),
            None => PromptCorpus::from_prompt(self.default_prompt.clone())
                .context("Default prompt is empty"),
        }
    }

    fn token_counter(&self) -> Result<Arc<dyn TokenCounter>> {
        let counter: Arc<dyn TokenCounter> = match self.tokenizer {
            TokenizerKind::Cl100k => Arc::new(
                TiktokenCounter::cl100k().context("Failed to load cl100k_base encoding")?,
            ),
            TokenizerKind::Whitespace => Arc::new(WhitespaceTokenCounter),
        };
        Ok(counter)
    }

    /// Run the escalation based on CLI arguments
    pub async fn run(&self) -> Result<()> {
        let config = self.config();
        config.validate().context("Invalid configuration")?;

        let corpus = self.corpus()?;
        let counter = self.token_counter()?;

        tracing::info!("Starting escalation against {}", config.endpoint);
        tracing::info!("Model: {}", config.model);
        tracing::info!("Rates (rpm): {:?}", config.rates);
        tracing::info!("Loaded {} prompts", corpus.len());
        tracing::info!("Tokenizer: {}", counter.name());

        let provider = OpenAIProvider::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )?;

        let driver = EscalationDriver::new(
            config,
            Arc::new(provider),
            Arc::new(corpus),
            counter.clone(),
        )?
        .with_progress(!self.no_progress);

        let run = driver.run().await?;
        let summary = RunSummary::new(
            &run,
            &driver.config().model,
            driver.config().failure_threshold,
            counter.name(),
        );

        match self.format {
            OutputFormat::Text => {
                println!();
                print!("{}", summary.to_text());
            }
            OutputFormat::Json => {
                println!("{}", summary.to_json().context("Failed to render report")?);
            }
        }

        Ok(())
    }
}
