//! Prompt corpus
//!
//! Prompts are drawn in order and reused cyclically: launch `i` of a stage
//! always sends `prompts[i % len]`.

use crate::config::ConfigError;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One row of a JSONL prompt dataset
#[derive(Debug, Deserialize)]
struct PromptRecord {
    #[serde(default)]
    prompt: Option<String>,
}

/// Non-empty, ordered pool of prompts
#[derive(Debug, Clone)]
pub struct PromptCorpus {
    prompts: Vec<String>,
}

impl PromptCorpus {
    /// Build a corpus, dropping empty prompts
    pub fn new(prompts: Vec<String>) -> std::result::Result<Self, ConfigError> {
        let prompts: Vec<String> = prompts.into_iter().filter(|p| !p.is_empty()).collect();

        if prompts.is_empty() {
            return Err(ConfigError::EmptyCorpus);
        }

        Ok(Self { prompts })
    }

    /// Create a corpus with a single prompt
    pub fn from_prompt(prompt: String) -> std::result::Result<Self, ConfigError> {
        Self::new(vec![prompt])
    }

    /// Load prompts from the first `limit` rows of a file
    ///
    /// `.jsonl` files are read as one JSON object per non-blank line and the
    /// `prompt` field is used; rows without one are skipped. Any other file
    /// is read one line per row and blank lines are skipped. The limit
    /// applies to rows, before skipping.
    pub fn from_file(path: &Path, limit: Option<usize>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let limit = limit.unwrap_or(usize::MAX);

        let is_jsonl = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
            .unwrap_or(false);

        let prompts = if is_jsonl {
            parse_jsonl(&content, limit)
                .map_err(|e| Error::Dataset(format!("{}: {}", path.display(), e)))?
        } else {
            content
                .lines()
                .take(limit)
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.to_string())
                .collect::<Vec<_>>()
        };

        let corpus = Self::new(prompts).map_err(|_| {
            Error::Dataset(format!("no prompts found in file: {}", path.display()))
        })?;

        tracing::debug!("Loaded {} prompts from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Prompt for launch `index`, wrapping around the corpus
    pub fn get(&self, index: usize) -> &str {
        &self.prompts[index % self.prompts.len()]
    }

    /// Get the number of prompts
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always false for a constructed corpus
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

fn parse_jsonl(
    content: &str,
    limit: usize,
) -> std::result::Result<Vec<String>, serde_json::Error> {
    let mut prompts = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()).take(limit) {
        let record: PromptRecord = serde_json::from_str(line)?;
        if let Some(prompt) = record.prompt.filter(|p| !p.is_empty()) {
            prompts.push(prompt);
        }
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_corpus_cycles() {
        let corpus = PromptCorpus::new((0..5).map(|i| format!("p{}", i)).collect()).unwrap();
        let drawn: Vec<&str> = (0..12).map(|i| corpus.get(i)).collect();
        assert_eq!(
            drawn,
            vec!["p0", "p1", "p2", "p3", "p4", "p0", "p1", "p2", "p3", "p4", "p0", "p1"]
        );
    }

    #[test]
    fn test_corpus_rejects_empty() {
        assert_eq!(PromptCorpus::new(vec![]).unwrap_err(), ConfigError::EmptyCorpus);
        assert_eq!(
            PromptCorpus::new(vec!["".into(), "".into()]).unwrap_err(),
            ConfigError::EmptyCorpus
        );
    }

    #[test]
    fn test_corpus_keeps_whitespace_prompt() {
        let corpus = PromptCorpus::new(vec!["".into(), "  ".into()]).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0), "  ");
    }

    #[test]
    fn test_corpus_from_prompt() {
        let corpus = PromptCorpus::from_prompt("Hello".to_string()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(7), "Hello");
    }

    #[test]
    fn test_corpus_from_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Prompt 1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Prompt 2").unwrap();
        writeln!(file, "Prompt 3").unwrap();

        let corpus = PromptCorpus::from_file(file.path(), None).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.get(1), "Prompt 2");

        // The blank second line still counts toward the limit.
        let limited = PromptCorpus::from_file(file.path(), Some(2)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited.get(2), "Prompt 1");
    }

    #[test]
    fn test_corpus_from_jsonl_file() {
        let mut file = Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"act": "Linux Terminal", "prompt": "Act as a terminal"}}"#).unwrap();
        writeln!(file, r#"{{"act": "No prompt"}}"#).unwrap();
        writeln!(file, r#"{{"prompt": ""}}"#).unwrap();
        writeln!(file, r#"{{"prompt": "Act as a translator"}}"#).unwrap();

        let corpus = PromptCorpus::from_file(file.path(), None).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0), "Act as a terminal");
        assert_eq!(corpus.get(1), "Act as a translator");
    }

    #[test]
    fn test_jsonl_limit_applies_before_filtering() {
        let mut file = Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"prompt": "first"}}"#).unwrap();
        writeln!(file, r#"{{"act": "No prompt"}}"#).unwrap();
        writeln!(file, r#"{{"prompt": "third"}}"#).unwrap();

        let corpus = PromptCorpus::from_file(file.path(), Some(2)).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0), "first");

        let all = PromptCorpus::from_file(file.path(), None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_corpus_from_malformed_jsonl() {
        let mut file = Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "not json").unwrap();

        let err = PromptCorpus::from_file(file.path(), None).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn test_corpus_from_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let err = PromptCorpus::from_file(file.path(), None).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn test_corpus_missing_file() {
        let err = PromptCorpus::from_file(Path::new("/nonexistent/prompts.txt"), None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
