//! Bounded in-memory history for charting.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use snmpwatch_types::Snapshot;

/// Default number of points kept per metric.
pub const DEFAULT_HISTORY_LEN: usize = 20;

/// History shared between the scheduler (writer) and consumers (readers).
pub type SharedHistory = Arc<RwLock<History>>;

/// One charted point: snapshot time in milliseconds and the metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub timestamp_ms: u64,
    pub value: f64,
}

/// Tracks the most recent numeric values of every metric.
///
/// Suspended, absent and text values are not recorded, so a series may have
/// gaps where its metric could not be computed.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    series: HashMap<String, VecDeque<Point>>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl History {
    /// Create an empty history keeping at most `capacity` points per metric.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    /// Create an empty history ready to be shared.
    pub fn shared(capacity: usize) -> SharedHistory {
        Arc::new(RwLock::new(Self::new(capacity)))
    }

    /// Record the numeric values of a snapshot.
    pub fn record(&mut self, snapshot: &Snapshot) {
        for (name, value) in snapshot.iter() {
            let Some(value) = value.as_f64() else {
                continue;
            };
            let points = self.series.entry(name.clone()).or_default();
            points.push_back(Point {
                timestamp_ms: snapshot.timestamp_ms,
                value,
            });
            if points.len() > self.capacity {
                points.pop_front();
            }
        }
    }

    /// Points of `metric`, oldest first.
    pub fn series(&self, metric: &str) -> Vec<Point> {
        self.series
            .get(metric)
            .map(|points| points.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Most recent point of `metric`.
    pub fn latest(&self, metric: &str) -> Option<Point> {
        self.series.get(metric)?.back().copied()
    }

    /// Metrics with at least one point, in no particular order.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Maximum points kept per metric.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmpwatch_types::MetricValue;

    fn snapshot(ts: u64, throughput: MetricValue) -> Snapshot {
        Snapshot::builder()
            .timestamp_ms(ts)
            .value("throughput", throughput)
            .value("sysName", MetricValue::Text("edge".into()))
            .build()
    }

    #[test]
    fn keeps_only_recent_points() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(&snapshot(i * 1000, MetricValue::Rate(i as f64)));
        }

        let values: Vec<f64> = history.series("throughput").iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest("throughput").unwrap().timestamp_ms, 4000);
    }

    #[test]
    fn gaps_and_text_are_not_recorded() {
        let mut history = History::default();
        history.record(&snapshot(0, MetricValue::Suspended));
        history.record(&snapshot(1000, MetricValue::Rate(5.0)));
        history.record(&snapshot(2000, MetricValue::Absent));

        assert_eq!(
            history.series("throughput"),
            vec![Point {
                timestamp_ms: 1000,
                value: 5.0
            }]
        );
        assert!(history.series("sysName").is_empty());
        assert_eq!(history.metrics().count(), 1);
    }
}
