//! Error types for genai-escalate

use crate::config::ConfigError;
use thiserror::Error;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration rejected before any stage started
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Prompt dataset could not be loaded
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Tokenizer could not be initialised
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// HTTP client could not be built
    #[error("client error: {0}")]
    Client(String),

    /// A stage finished without accounting for every launched request
    #[error("stage error: {0}")]
    Stage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
