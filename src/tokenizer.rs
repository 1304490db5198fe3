//! Token counting for throughput figures
//!
//! Tokens are counted locally on the prompt and the returned text, never
//! taken from the server's `usage` block, so every backend is measured the
//! same way.

use crate::error::{Error, Result};
use tiktoken_rs::CoreBPE;

/// Trait for counting tokens in text.
pub trait TokenCounter: Send + Sync {
    /// Count the number of tokens in the given text.
    fn count(&self, text: &str) -> usize;

    /// Counter name for logs and reports.
    fn name(&self) -> &str;
}

/// `cl100k_base` BPE counter, the encoding used by the gpt-3.5/gpt-4 family.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load the `cl100k_base` encoding.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    /// Special-token markup such as `<|endoftext|>` is counted as plain text.
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}

/// Whitespace word count.
///
/// A rough stand-in for a BPE tokenizer, typically 2-4x below real token
/// counts. Useful offline and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}
