//! Uniform launch pacing

use crate::config::ConfigError;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Converts requests-per-minute into a fixed launch interval
///
/// Pacing is strictly uniform: `interval = 60s / rpm`, no jitter and no
/// adaptation to observed latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateController {
    rpm: u32,
    interval: Duration,
}

impl RateController {
    /// Create a controller; `rpm` must be at least 1
    pub fn new(rpm: u32) -> Result<Self, ConfigError> {
        if rpm == 0 {
            return Err(ConfigError::InvalidRate(rpm));
        }

        Ok(Self {
            rpm,
            interval: Duration::from_secs(60) / rpm,
        })
    }

    /// Requests per minute
    pub fn rpm(&self) -> u32 {
        self.rpm
    }

    /// Time between successive launches
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a launch clock. The first tick is immediate.
    ///
    /// Must be called from within a tokio runtime.
    pub fn pacer(&self) -> Pacer {
        let mut ticker = interval(self.interval);
        // A late launch pushes the rest back rather than bursting to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Pacer { ticker }
    }
}

/// Paced launch signal produced by [`RateController::pacer`]
#[derive(Debug)]
pub struct Pacer {
    ticker: Interval,
}

impl Pacer {
    /// Wait until the next launch is due
    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_interval_from_rpm() {
        assert_eq!(RateController::new(1).unwrap().interval(), Duration::from_secs(60));
        assert_eq!(RateController::new(30).unwrap().interval(), Duration::from_secs(2));
        assert_eq!(RateController::new(60).unwrap().interval(), Duration::from_secs(1));
        assert_eq!(
            RateController::new(120).unwrap().interval(),
            Duration::from_millis(500)
        );
        assert_eq!(
            RateController::new(1200).unwrap().interval(),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_zero_rpm_rejected() {
        assert_eq!(RateController::new(0), Err(ConfigError::InvalidRate(0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spacing() {
        let controller = RateController::new(30).unwrap();
        let mut pacer = controller.pacer();
        let start = Instant::now();

        let mut ticks = Vec::new();
        for _ in 0..4 {
            pacer.tick().await;
            ticks.push(start.elapsed());
        }

        let expected = [0, 2, 4, 6].map(Duration::from_secs);
        for (tick, want) in ticks.iter().zip(expected) {
            assert!(
                *tick >= want && *tick <= want + Duration::from_millis(5),
                "tick at {:?}, expected {:?}",
                tick,
                want
            );
        }
    }
}
