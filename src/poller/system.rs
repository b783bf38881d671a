//! Start-up read of the agent's system description.

use snmpwatch_adapters::Transport;
use snmpwatch_types::{ObjectIdentifier, RawValue, SystemInfo, TimeTicks};
use tracing::debug;

use super::aggregator::BulkAggregator;
use crate::error::PollError;
use crate::registry::{names, MetricRegistry, SYSTEM_GROUP};

/// Walk the system group and read interface names.
///
/// System group values are taken in walk order (description, object id,
/// uptime, contact, name, location, services). An interface without a name
/// is listed as `if<index>`.
pub async fn read_system_info(
    transport: &dyn Transport,
    registry: &MetricRegistry,
    aggregator: &BulkAggregator,
) -> Result<SystemInfo, PollError> {
    let group = transport
        .walk(&ObjectIdentifier::from(SYSTEM_GROUP))
        .await?;
    debug!(values = group.len(), "system group walked");

    let text = |i: usize| -> String {
        match group.get(i) {
            Some(RawValue::Text(s)) => s.clone(),
            Some(RawValue::Integer(v)) => v.to_string(),
            _ => String::new(),
        }
    };

    let mut info = SystemInfo {
        description: text(0),
        object_id: text(1),
        uptime: group
            .get(2)
            .and_then(RawValue::as_ticks)
            .unwrap_or(TimeTicks(0)),
        contact: text(3),
        name: text(4),
        location: text(5),
        services: group.get(6).and_then(RawValue::as_integer).unwrap_or(0),
        interfaces: Vec::new(),
    };

    let if_name = &registry.resolve(names::IF_NAME)?.identifier;
    info.interfaces = aggregator
        .column_values(transport, if_name)
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            RawValue::Text(name) if !name.is_empty() => name,
            _ => format!("if{}", i + 1),
        })
        .collect();

    Ok(info)
}
