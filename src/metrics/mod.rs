//! Per-request outcomes and per-stage aggregation

use crate::error::{Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Classified result of one request
///
/// Failures carry no detail; why a request failed is logged by the
/// classifier and then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success { tokens: u64, latency: Duration },
    Failure,
}

/// Aggregate over every outcome of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StageResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// Prompt + completion tokens over successful requests
    pub total_tokens: u64,
    /// Sum of successful requests' latencies
    pub total_latency: Duration,
}

impl StageResult {
    /// Number of resolved requests
    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    /// `fail / (success + fail)`, always within `[0, 1]`
    pub fn failure_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.fail_count as f64 / total as f64
    }

    /// Tokens per second of summed request latency; 0 when no latency was
    /// recorded
    pub fn tokens_per_second(&self) -> f64 {
        let secs = self.total_latency.as_secs_f64();
        if secs > 0.0 {
            self.total_tokens as f64 / secs
        } else {
            0.0
        }
    }
}

/// Collects outcomes for one stage and finalizes once all have arrived
///
/// Outcomes may arrive in any order; each one only contributes its own
/// tokens and latency.
#[derive(Debug, Clone)]
pub struct StageAggregator {
    expected: usize,
    result: StageResult,
}

impl StageAggregator {
    /// Create an aggregator expecting `expected` outcomes
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            result: StageResult::default(),
        }
    }

    /// Record one outcome
    pub fn record(&mut self, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::Success { tokens, latency } => {
                self.result.success_count += 1;
                self.result.total_tokens += tokens;
                self.result.total_latency += latency;
            }
            RequestOutcome::Failure => {
                self.result.fail_count += 1;
            }
        }
    }

    /// Outcomes recorded so far
    pub fn resolved(&self) -> usize {
        self.result.total()
    }

    /// Produce the stage result
    ///
    /// Fails unless exactly `expected` outcomes were recorded; a partial
    /// stage is never reported.
    pub fn finalize(self) -> Result<StageResult> {
        if self.expected == 0 {
            return Err(Error::Stage("stage launched no requests".into()));
        }
        if self.resolved() != self.expected {
            return Err(Error::Stage(format!(
                "expected {} outcomes, got {}",
                self.expected,
                self.resolved()
            )));
        }
        Ok(self.result)
    }
}

impl Extend<RequestOutcome> for StageAggregator {
    fn extend<I: IntoIterator<Item = RequestOutcome>>(&mut self, iter: I) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(tokens: u64, ms: u64) -> RequestOutcome {
        RequestOutcome::Success {
            tokens,
            latency: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_aggregation() {
        let mut agg = StageAggregator::new(4);
        agg.record(success(30, 500));
        agg.record(RequestOutcome::Failure);
        agg.record(success(70, 1500));
        assert_eq!(agg.resolved(), 3);
        agg.record(RequestOutcome::Failure);

        let result = agg.finalize().unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 2);
        assert_eq!(result.total(), 4);
        assert_eq!(result.total_tokens, 100);
        assert_eq!(result.total_latency, Duration::from_secs(2));
        assert_eq!(result.failure_rate(), 0.5);
        assert_eq!(result.tokens_per_second(), 50.0);
    }

    #[test]
    fn test_order_does_not_matter() {
        let outcomes = vec![
            success(10, 100),
            RequestOutcome::Failure,
            success(20, 300),
            success(5, 50),
        ];

        let mut forward = StageAggregator::new(outcomes.len());
        forward.extend(outcomes.iter().copied());
        let mut backward = StageAggregator::new(outcomes.len());
        backward.extend(outcomes.iter().rev().copied());

        assert_eq!(forward.finalize().unwrap(), backward.finalize().unwrap());
    }

    #[test]
    fn test_zero_latency_throughput_is_zero() {
        let mut agg = StageAggregator::new(2);
        agg.record(success(40, 0));
        agg.record(success(60, 0));

        let result = agg.finalize().unwrap();
        assert_eq!(result.total_tokens, 100);
        assert_eq!(result.tokens_per_second(), 0.0);
    }

    #[test]
    fn test_all_failures() {
        let mut agg = StageAggregator::new(3);
        agg.extend(std::iter::repeat(RequestOutcome::Failure).take(3));

        let result = agg.finalize().unwrap();
        assert_eq!(result.failure_rate(), 1.0);
        assert_eq!(result.tokens_per_second(), 0.0);
        assert_eq!(result.total_tokens, 0);
    }

    #[test]
    fn test_partial_stage_is_rejected() {
        let mut agg = StageAggregator::new(3);
        agg.record(success(1, 1));
        assert!(matches!(agg.finalize(), Err(Error::Stage(_))));
    }

    #[test]
    fn test_empty_stage_is_rejected() {
        assert!(matches!(
            StageAggregator::new(0).finalize(),
            Err(Error::Stage(_))
        ));
    }

    #[test]
    fn test_failure_rate_bounds() {
        for fails in 0..=10 {
            let mut agg = StageAggregator::new(10);
            for i in 0..10 {
                if i < fails {
                    agg.record(RequestOutcome::Failure);
                } else {
                    agg.record(success(1, 10));
                }
            }
            let result = agg.finalize().unwrap();
            assert!((0.0..=1.0).contains(&result.failure_rate()));
            assert!(result.tokens_per_second() >= 0.0);
        }
    }
}
