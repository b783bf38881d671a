//! Snapshot - a point-in-time view of the polled agent's metrics.

use std::collections::BTreeMap;

use crate::{MetricValue, SchemaVersion};

/// A point-in-time snapshot of derived and decoded metrics.
///
/// One snapshot is built per poll cycle and is immutable afterwards; it is the
/// only artifact handed from the polling core to consumers. Rates are already
/// computed, so a snapshot holds no reference to its predecessors.
///
/// # Example
///
/// ```rust
/// use snmpwatch_types::{MetricValue, Snapshot};
///
/// let snapshot = Snapshot::builder()
///     .value("ifInErrors", MetricValue::Integer(5))
///     .value("errorRatio", MetricValue::Ratio(5.0))
///     .build();
///
/// // Serialize with serde (requires "serde" feature)
/// // let json = serde_json::to_string(&snapshot)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Metric values keyed by metric name.
    pub values: BTreeMap<String, MetricValue>,

    /// Whether the agent liveness alarm was active when this snapshot was published.
    pub alarm: bool,
}

impl Snapshot {
    /// Create a new, empty snapshot with the current timestamp.
    pub fn new() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }

    /// Create a new, empty snapshot with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            version: SchemaVersion::current(),
            timestamp_ms,
            values: BTreeMap::new(),
            alarm: false,
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Check if the snapshot is empty (no metrics).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of metrics in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Get the value of a specific metric.
    pub fn get(&self, metric: &str) -> Option<&MetricValue> {
        self.values.get(metric)
    }

    /// Numeric value of a metric, if it is available and numeric.
    pub fn number(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).and_then(MetricValue::as_f64)
    }

    /// Iterate over all metrics.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.values.iter()
    }

    /// Names of metrics whose query failed in this cycle.
    pub fn absent(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_absent())
            .map(|(k, _)| k.as_str())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug)]
pub struct SnapshotBuilder {
    timestamp_ms: Option<u64>,
    values: BTreeMap<String, MetricValue>,
    alarm: bool,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            timestamp_ms: None,
            values: BTreeMap::new(),
            alarm: false,
        }
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Add a metric value. A later value for the same name replaces the earlier one.
    pub fn value(mut self, name: impl Into<String>, value: MetricValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Set the liveness alarm flag.
    pub fn alarm(mut self, alarm: bool) -> Self {
        self.alarm = alarm;
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            values: self.values,
            alarm: self.alarm,
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = Snapshot::builder()
            .timestamp_ms(1703160000000)
            .value("ifInOctets", MetricValue::Integer(1000))
            .value("throughput", MetricValue::Rate(100.0))
            .value("ipErrorRatio", MetricValue::Absent)
            .alarm(true)
            .build();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.timestamp_ms, 1703160000000);
        assert_eq!(snapshot.number("throughput"), Some(100.0));
        assert_eq!(snapshot.number("ipErrorRatio"), None);
        assert_eq!(snapshot.absent().collect::<Vec<_>>(), vec!["ipErrorRatio"]);
        assert!(snapshot.alarm);
    }

    #[test]
    fn test_snapshot_version() {
        let snapshot = Snapshot::builder().build();
        assert!(snapshot.version.is_compatible());
        assert!(snapshot.timestamp_ms > 0);
    }

    #[test]
    fn clones_compare_equal() {
        let snapshot = Snapshot::builder()
            .value("forwardingRate", MetricValue::Suspended)
            .build();
        let copy = snapshot.clone();
        assert_eq!(snapshot, copy);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let snapshot = Snapshot::builder()
            .timestamp_ms(1703160000000)
            .value("ifInOctets", MetricValue::Integer(42))
            .value("throughput", MetricValue::Suspended)
            .value("sysUpTime", MetricValue::Ticks(crate::TimeTicks(6000)))
            .build();

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, parsed);
    }
}
