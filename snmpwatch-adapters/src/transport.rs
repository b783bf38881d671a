//! The transport capability the polling core depends on.

use async_trait::async_trait;
use snmpwatch_types::{ObjectIdentifier, RawValue};

use crate::TransportError;

/// Query capability against one management agent.
///
/// Each call is independent: the core holds no session state and treats
/// every failure, including a timeout owned by the implementation, as an
/// ordinary per-query failure.
///
/// # Example
///
/// ```rust
/// use snmpwatch_adapters::{Transport, TransportError};
/// use snmpwatch_types::{ObjectIdentifier, RawValue};
///
/// async fn uptime(transport: &dyn Transport) -> Result<RawValue, TransportError> {
///     let oid: ObjectIdentifier = "1.3.6.1.2.1.1.3.0".parse().unwrap();
///     transport.get(&oid).await
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the value of a single instance.
    ///
    /// A missing instance is `Ok(RawValue::Absent)`, not an error.
    async fn get(&self, oid: &ObjectIdentifier) -> Result<RawValue, TransportError>;

    /// Fetch several instances in one round trip.
    ///
    /// Returns exactly one value per requested identifier, in request order;
    /// missing instances are `RawValue::Absent` rather than truncation.
    async fn bulk_get(
        &self,
        oids: &[ObjectIdentifier],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<RawValue>, TransportError>;

    /// Fetch every value under `subtree` in lexicographic order.
    ///
    /// Traversal stops when it leaves the subtree or the agent signals the
    /// end of its view. Any failing step fails the whole walk.
    async fn walk(&self, subtree: &ObjectIdentifier) -> Result<Vec<RawValue>, TransportError>;

    /// Returns a human-readable description of the agent endpoint.
    fn description(&self) -> &str;
}
