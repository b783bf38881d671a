//! Decoded results of a single protocol query.

use crate::TimeTicks;

/// The decoded value of one management query.
///
/// Produced by a transport for each requested identifier and consumed within
/// the poll cycle that produced it. Counters of every width decode to
/// `Integer`; octet strings, addresses and object-identifier values decode to
/// `Text`. An identifier the agent has no instance for is `Absent`, so bulk
/// results keep one entry per request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value", rename_all = "snake_case"))]
pub enum RawValue {
    Integer(i64),
    Text(String),
    TimeInterval(TimeTicks),
    Absent,
}

impl RawValue {
    /// True if the agent returned no instance.
    pub fn is_absent(&self) -> bool {
        matches!(self, RawValue::Absent)
    }

    /// Numeric view of the value.
    ///
    /// Time intervals yield their raw tick count; text and absent values
    /// yield `None`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawValue::Integer(v) => Some(*v),
            RawValue::TimeInterval(t) => Some(t.ticks() as i64),
            RawValue::Text(_) | RawValue::Absent => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Time-interval view of the value, if it is one.
    pub fn as_ticks(&self) -> Option<TimeTicks> {
        match self {
            RawValue::TimeInterval(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Integer(v)
    }
}

impl From<TimeTicks> for RawValue {
    fn from(t: TimeTicks) -> Self {
        RawValue::TimeInterval(t)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}
