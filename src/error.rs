//! Error types for the polling core.

use snmpwatch_adapters::TransportError;
use snmpwatch_types::ObjectIdentifier;
use thiserror::Error;

/// Errors raised by the polling core.
///
/// Per-metric failures never escape a poll cycle: the collector absorbs them
/// into `MetricValue::Absent`. Only [`PollError::InterfaceCount`] (and
/// configuration errors, reported through `anyhow`) stop the poller before it
/// starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollError {
    /// The agent did not answer in time.
    #[error("transport timed out")]
    TransportTimeout,

    /// The agent answered with an error status.
    #[error("agent error status {code} at {}", describe(.at))]
    AgentProtocolError {
        code: u32,
        at: Option<ObjectIdentifier>,
    },

    /// Any other transport failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A metric name that the registry does not know.
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    /// The agent now reports a different number of interfaces than the one
    /// table aggregation was set up with.
    #[error("interface count changed from {expected} to {observed}")]
    InterfaceCountStale { expected: u32, observed: u32 },

    /// The interface count could not be resolved at start-up.
    #[error("failed to resolve interface count: {0}")]
    InterfaceCount(String),
}

impl From<TransportError> for PollError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => PollError::TransportTimeout,
            TransportError::Agent { code, at, .. } => PollError::AgentProtocolError { code, at },
            other => PollError::Transport(other.to_string()),
        }
    }
}

fn describe(at: &Option<ObjectIdentifier>) -> String {
    at.as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "?".to_string())
}
