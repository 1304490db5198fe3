//! Run summaries for the console
//!
//! Nothing here touches the filesystem; the CLI prints either the text table
//! or the JSON document to stdout.

use crate::escalation::{EscalationRun, Termination};
use serde::Serialize;
use std::fmt;

/// Per-stage figures as reported
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub rpm: u32,
    pub success_count: usize,
    pub fail_count: usize,
    pub failure_rate: f64,
    pub total_tokens: u64,
    pub total_latency_secs: f64,
    pub tokens_per_second: f64,
}

/// Complete report for one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub model: String,
    pub failure_threshold: f64,
    pub tokenizer: String,
    pub stages: Vec<StageSummary>,
    pub termination: Termination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sustained_rpm: Option<u32>,
}

impl RunSummary {
    pub fn new(run: &EscalationRun, model: &str, failure_threshold: f64, tokenizer: &str) -> Self {
        let stages = run
            .stages
            .iter()
            .map(|s| StageSummary {
                rpm: s.rpm,
                success_count: s.result.success_count,
                fail_count: s.result.fail_count,
                failure_rate: s.result.failure_rate(),
                total_tokens: s.result.total_tokens,
                total_latency_secs: s.result.total_latency.as_secs_f64(),
                tokens_per_second: s.result.tokens_per_second(),
            })
            .collect();

        Self {
            model: model.to_string(),
            failure_threshold,
            tokenizer: tokenizer.to_string(),
            stages,
            termination: run.termination,
            max_sustained_rpm: run.max_sustained_rpm(),
        }
    }

    /// Pretty JSON document
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Console table
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);

        writeln!(f, "{}", rule)?;
        writeln!(f, "   Escalation Results")?;
        writeln!(f, "{}", rule)?;
        writeln!(f)?;
        writeln!(f, "  Model:              {}", self.model)?;
        writeln!(
            f,
            "  Failure threshold:  {:.1}%",
            self.failure_threshold * 100.0
        )?;
        writeln!(f, "  Tokenizer:          {}", self.tokenizer)?;
        writeln!(f)?;
        writeln!(
            f,
            "  {:>6}  {:>8}  {:>8}  {:>9}  {:>12}",
            "RPM", "Success", "Failed", "Failures", "Tokens/sec"
        )?;
        for stage in &self.stages {
            writeln!(
                f,
                "  {:>6}  {:>8}  {:>8}  {:>8.1}%  {:>12.2}",
                stage.rpm,
                stage.success_count,
                stage.fail_count,
                stage.failure_rate * 100.0,
                stage.tokens_per_second
            )?;
        }
        writeln!(f)?;

        match self.termination {
            Termination::Completed => {
                writeln!(f, "  All {} stages passed.", self.stages.len())?;
            }
            Termination::Halted { stage_index, rpm } => {
                writeln!(
                    f,
                    "  Halted at stage {} ({} rpm): failure rate reached the threshold.",
                    stage_index + 1,
                    rpm
                )?;
            }
        }
        match self.max_sustained_rpm {
            Some(rpm) => writeln!(f, "  Highest sustained rate: {} rpm", rpm)?,
            None => writeln!(f, "  No stage stayed under the threshold.")?,
        }

        writeln!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::StageRecord;
    use crate::metrics::StageResult;
    use std::time::Duration;

    fn halted_run() -> EscalationRun {
        EscalationRun {
            stages: vec![
                StageRecord {
                    rpm: 30,
                    result: StageResult {
                        success_count: 30,
                        fail_count: 0,
                        total_tokens: 3000,
                        total_latency: Duration::from_secs(60),
                    },
                },
                StageRecord {
                    rpm: 60,
                    result: StageResult {
                        success_count: 24,
                        fail_count: 36,
                        total_tokens: 2400,
                        total_latency: Duration::from_secs(48),
                    },
                },
            ],
            termination: Termination::Halted {
                stage_index: 1,
                rpm: 60,
            },
        }
    }

    #[test]
    fn test_summary_figures() {
        let summary = RunSummary::new(&halted_run(), "test-model", 0.5, "whitespace");
        assert_eq!(summary.stages.len(), 2);
        assert_eq!(summary.stages[0].tokens_per_second, 50.0);
        assert!((summary.stages[1].failure_rate - 0.6).abs() < 1e-9);
        assert_eq!(summary.max_sustained_rpm, Some(30));
    }

    #[test]
    fn test_text_report() {
        let text = RunSummary::new(&halted_run(), "test-model", 0.5, "whitespace").to_text();
        assert!(text.contains("Escalation Results"));
        assert!(text.contains("test-model"));
        assert!(text.contains("60.0%"));
        assert!(text.contains("Halted at stage 2 (60 rpm)"));
        assert!(text.contains("Highest sustained rate: 30 rpm"));
    }

    #[test]
    fn test_text_report_completed_run() {
        let mut run = halted_run();
        run.stages.truncate(1);
        run.termination = Termination::Completed;

        let summary = RunSummary::new(&run, "test-model", 0.5, "whitespace");
        assert_eq!(summary.to_text(), format!("{}", summary));
        assert!(summary.to_text().contains("All 1 stages passed."));
        assert!(summary.to_text().ends_with(&format!("{}\n", "=".repeat(70))));
    }

    #[test]
    fn test_json_report() {
        let json = RunSummary::new(&halted_run(), "test-model", 0.5, "whitespace")
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["termination"]["reason"], "halted");
        assert_eq!(value["termination"]["rpm"], 60);
        assert_eq!(value["stages"][1]["fail_count"], 36);
        assert_eq!(value["max_sustained_rpm"], 30);
    }
}
