//! Counter-rate engine.
//!
//! Turns successive readings of a monotonically increasing counter into a
//! per-second rate over the wall-clock interval between the two readings.
//! The engine keeps one baseline per metric name and is the only place where
//! counter readings survive from one poll cycle to the next.

use std::collections::HashMap;

use snmpwatch_types::MetricValue;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of feeding one reading into the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// Counter units per second since the previous reading.
    PerSecond(f64),
    /// No usable baseline yet; not the same as a rate of zero.
    Suspended,
}

impl Rate {
    /// The rate, if one could be computed.
    pub fn per_second(self) -> Option<f64> {
        match self {
            Rate::PerSecond(v) => Some(v),
            Rate::Suspended => None,
        }
    }
}

impl From<Rate> for MetricValue {
    fn from(rate: Rate) -> Self {
        match rate {
            Rate::PerSecond(v) => MetricValue::Rate(v),
            Rate::Suspended => MetricValue::Suspended,
        }
    }
}

/// Baseline for one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateState {
    pub last_timestamp: Instant,
    pub last_value: i64,
}

/// Per-metric baselines and the rate computation over them.
#[derive(Debug, Default)]
pub struct RateEngine {
    states: HashMap<String, RateState>,
}

impl RateEngine {
    /// Create an engine with no baselines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a reading of `metric` taken at `now` and get its rate.
    ///
    /// The first reading of a metric only stores a baseline. A reading at or
    /// before the stored timestamp is ignored. A reading below the stored
    /// value (wraparound or agent restart) replaces the baseline and yields
    /// `Suspended` rather than a negative rate.
    pub fn rate(&mut self, metric: &str, now: Instant, value: i64) -> Rate {
        let Some(state) = self.states.get_mut(metric) else {
            self.states.insert(
                metric.to_string(),
                RateState {
                    last_timestamp: now,
                    last_value: value,
                },
            );
            return Rate::Suspended;
        };

        if now <= state.last_timestamp {
            return Rate::Suspended;
        }

        let elapsed = now.duration_since(state.last_timestamp).as_secs_f64();
        let delta = value - state.last_value;
        *state = RateState {
            last_timestamp: now,
            last_value: value,
        };

        if delta < 0 {
            debug!(metric, delta, "counter regressed, re-baselining");
            return Rate::Suspended;
        }

        Rate::PerSecond(delta as f64 / elapsed)
    }

    /// Drop the baseline of `metric` so its next reading starts afresh.
    pub fn forget(&mut self, metric: &str) -> bool {
        self.states.remove(metric).is_some()
    }

    /// Current baseline of `metric`.
    pub fn state(&self, metric: &str) -> Option<&RateState> {
        self.states.get(metric)
    }

    /// Number of metrics with a baseline.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no metric has a baseline.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn first_reading_is_suspended() {
        let mut engine = RateEngine::new();
        assert_eq!(engine.rate("throughput", Instant::now(), 1000), Rate::Suspended);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn rate_over_elapsed_seconds() {
        let mut engine = RateEngine::new();
        let t0 = Instant::now();

        assert_eq!(engine.rate("throughput", t0, 1000), Rate::Suspended);
        assert_eq!(
            engine.rate("throughput", t0 + Duration::from_secs(5), 1500),
            Rate::PerSecond(100.0)
        );
        assert_eq!(
            engine.rate("throughput", t0 + Duration::from_secs(10), 1500),
            Rate::PerSecond(0.0)
        );
    }

    #[test]
    fn identical_timestamp_is_suspended_and_keeps_baseline() {
        let mut engine = RateEngine::new();
        let t0 = Instant::now();

        engine.rate("forwardingRate", t0, 10);
        assert_eq!(engine.rate("forwardingRate", t0, 50), Rate::Suspended);
        assert_eq!(engine.state("forwardingRate").unwrap().last_value, 10);

        assert_eq!(
            engine.rate("forwardingRate", t0 + Duration::from_secs(2), 30),
            Rate::PerSecond(10.0)
        );
    }

    #[test]
    fn regression_rebaselines() {
        let mut engine = RateEngine::new();
        let t0 = Instant::now();

        engine.rate("throughput", t0, 4_000_000_000);
        assert_eq!(
            engine.rate("throughput", t0 + Duration::from_secs(5), 100),
            Rate::Suspended
        );
        assert_eq!(engine.state("throughput").unwrap().last_value, 100);
        assert_eq!(
            engine.rate("throughput", t0 + Duration::from_secs(10), 600),
            Rate::PerSecond(100.0)
        );
    }

    #[test]
    fn rates_are_non_negative_for_increasing_counters() {
        let mut engine = RateEngine::new();
        let t0 = Instant::now();
        let readings = [0i64, 0, 7, 7, 1_000, 1_000_000];

        for (i, value) in readings.into_iter().enumerate() {
            let rate = engine.rate("c", t0 + Duration::from_millis(1500 * i as u64), value);
            if i == 0 {
                assert_eq!(rate, Rate::Suspended);
            } else {
                assert!(rate.per_second().unwrap() >= 0.0);
            }
        }
    }

    #[test]
    fn metrics_are_independent() {
        let mut engine = RateEngine::new();
        let t0 = Instant::now();

        engine.rate("a", t0, 0);
        assert_eq!(engine.rate("b", t0 + Duration::from_secs(1), 5), Rate::Suspended);
        assert!(engine.forget("a"));
        assert_eq!(engine.rate("a", t0 + Duration::from_secs(2), 5), Rate::Suspended);
    }

    #[test]
    fn converts_to_metric_value() {
        assert_eq!(MetricValue::from(Rate::Suspended), MetricValue::Suspended);
        assert_eq!(MetricValue::from(Rate::PerSecond(2.0)), MetricValue::Rate(2.0));
    }
}
