//! Per-metric values published in a snapshot.

use crate::{RawValue, TimeTicks};

/// The published state of one metric in a snapshot.
///
/// Consumers always see one of three outcomes for a metric: a value,
/// `Suspended` (not yet computable, e.g. a rate without a baseline), or
/// `Absent` (the underlying query failed this cycle). A failed query is never
/// reported as zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum MetricValue {
    /// A decoded integer, e.g. a counter reading or a summed table column.
    Integer(i64),
    /// A decoded string.
    Text(String),
    /// A decoded time interval.
    Ticks(TimeTicks),
    /// A point-in-time ratio or percentage.
    Ratio(f64),
    /// A per-second rate derived over the interval since the previous cycle.
    Rate(f64),
    /// Not yet computable this cycle.
    Suspended,
    /// The query this metric depends on failed.
    Absent,
}

impl MetricValue {
    /// True if the underlying query failed.
    pub fn is_absent(&self) -> bool {
        matches!(self, MetricValue::Absent)
    }

    /// True if the value is not yet computable.
    pub fn is_suspended(&self) -> bool {
        matches!(self, MetricValue::Suspended)
    }

    /// True if the metric carries an actual value.
    pub fn is_available(&self) -> bool {
        !self.is_absent() && !self.is_suspended()
    }

    /// Numeric view for charting.
    ///
    /// Text, suspended and absent values yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(v) => Some(*v as f64),
            MetricValue::Ticks(t) => Some(t.ticks() as f64),
            MetricValue::Ratio(v) | MetricValue::Rate(v) => Some(*v),
            MetricValue::Text(_) | MetricValue::Suspended | MetricValue::Absent => None,
        }
    }

    /// Text view, if the metric is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<RawValue> for MetricValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Integer(v) => MetricValue::Integer(v),
            RawValue::Text(s) => MetricValue::Text(s),
            RawValue::TimeInterval(t) => MetricValue::Ticks(t),
            RawValue::Absent => MetricValue::Absent,
        }
    }
}

impl core::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{}", v),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Ticks(t) => write!(f, "{}", t.uptime()),
            MetricValue::Ratio(v) => write!(f, "{:.4}", v),
            MetricValue::Rate(v) => write!(f, "{:.2}/s", v),
            MetricValue::Suspended => f.write_str("suspended"),
            MetricValue::Absent => f.write_str("absent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_convert() {
        assert_eq!(MetricValue::from(RawValue::Integer(3)), MetricValue::Integer(3));
        assert_eq!(MetricValue::from(RawValue::Absent), MetricValue::Absent);
        assert_eq!(
            MetricValue::from(RawValue::TimeInterval(TimeTicks(10))),
            MetricValue::Ticks(TimeTicks(10))
        );
    }

    #[test]
    fn gaps_have_no_numeric_view() {
        assert_eq!(MetricValue::Suspended.as_f64(), None);
        assert_eq!(MetricValue::Absent.as_f64(), None);
        assert_eq!(MetricValue::Rate(100.0).as_f64(), Some(100.0));
        assert!(!MetricValue::Suspended.is_available());
        assert!(MetricValue::Integer(0).is_available());
    }

    #[test]
    fn display() {
        assert_eq!(MetricValue::Rate(100.0).to_string(), "100.00/s");
        assert_eq!(MetricValue::Absent.to_string(), "absent");
    }
}
