//! Bulk aggregation of interface table columns.

use snmpwatch_adapters::Transport;
use snmpwatch_types::{ObjectIdentifier, RawValue};
use tracing::debug;

use crate::error::PollError;

/// Default `max-repetitions` sent with every bulk request.
pub const DEFAULT_MAX_REPETITIONS: u32 = 25;

/// Reads a table column across every known interface in one round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkAggregator {
    index_count: u32,
    max_repetitions: u32,
}

impl BulkAggregator {
    /// Create an aggregator over interfaces `1..=index_count`.
    pub fn new(index_count: u32) -> Self {
        Self {
            index_count,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
        }
    }

    /// Set the `max-repetitions` value sent with bulk requests.
    pub fn with_max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    /// Number of interfaces aggregated over.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Aggregate over a different number of interfaces from now on.
    pub fn set_index_count(&mut self, index_count: u32) {
        self.index_count = index_count;
    }

    /// Identifiers of `column` for every interface, in index order.
    pub fn instances(&self, column: &ObjectIdentifier) -> Vec<ObjectIdentifier> {
        (1..=self.index_count).map(|i| column.child(i)).collect()
    }

    /// Values of `column` for every interface, one per index.
    ///
    /// With no interfaces this returns an empty list without querying.
    pub async fn column_values(
        &self,
        transport: &dyn Transport,
        column: &ObjectIdentifier,
    ) -> Result<Vec<RawValue>, PollError> {
        if self.index_count == 0 {
            return Ok(Vec::new());
        }
        let instances = self.instances(column);
        let values = transport
            .bulk_get(&instances, 0, self.max_repetitions)
            .await?;
        Ok(values)
    }

    /// Sum of `column` across every interface.
    ///
    /// Absent entries count as zero.
    pub async fn sum_across_indices(
        &self,
        transport: &dyn Transport,
        column: &ObjectIdentifier,
    ) -> Result<i64, PollError> {
        let values = self.column_values(transport, column).await?;
        let sum = values
            .iter()
            .filter_map(RawValue::as_integer)
            .fold(0i64, i64::saturating_add);
        debug!(column = %column, interfaces = self.index_count, sum, "column summed");
        Ok(sum)
    }
}

/// Read the number of interfaces from the agent.
///
/// Failure here leaves the poller with nothing meaningful to aggregate, so
/// callers treat it as fatal.
pub async fn resolve_interface_count(
    transport: &dyn Transport,
    if_number: &ObjectIdentifier,
) -> Result<u32, PollError> {
    let value = transport
        .get(if_number)
        .await
        .map_err(|e| PollError::InterfaceCount(e.to_string()))?;
    interface_count(&value)
        .ok_or_else(|| PollError::InterfaceCount(format!("unexpected value {:?}", value)))
}

/// Decode an interface count reading.
fn interface_count(value: &RawValue) -> Option<u32> {
    match value {
        RawValue::Integer(v) => u32::try_from(*v).ok(),
        _ => None,
    }
}
