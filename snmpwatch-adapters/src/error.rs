//! Error types for transports.

use thiserror::Error;

use snmpwatch_types::ObjectIdentifier;

/// Errors that can occur when querying an agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response arrived before the transport's timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be sent or the response could not be received.
    #[error("No response: {0}")]
    NoResponse(String),

    /// The agent answered with a non-zero error status.
    ///
    /// `index` is the 1-based position of the offending variable binding
    /// (0 when the agent did not name one); `at` is its identifier when known.
    #[error("Agent error status {code} at {}", describe(.at))]
    Agent {
        code: u32,
        index: u32,
        at: Option<ObjectIdentifier>,
    },

    /// The response could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build an agent error, resolving the 1-based index against the request.
    pub fn agent(code: u32, index: u32, request: &[ObjectIdentifier]) -> Self {
        let at = (index as usize)
            .checked_sub(1)
            .and_then(|i| request.get(i))
            .cloned();
        TransportError::Agent { code, index, at }
    }
}

fn describe(at: &Option<ObjectIdentifier>) -> String {
    at.as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "?".to_string())
}
