//! SNMPv2c adapter over UDP.
//!
//! This adapter queries a management agent with community-string
//! authentication, using the `snmp` crate for encoding and the UDP exchange.
//! The session is synchronous, so every query runs on tokio's blocking pool
//! and holds the session lock for one request/response exchange.
//!
//! ## Query Mapping
//!
//! - **get**: one GET request
//! - **bulk_get**: one GETBULK request whose names are the predecessors of the
//!   requested instances, all sent as non-repeaters, so the agent answers each
//!   slot with exactly the requested instance when it exists
//! - **walk**: repeated GETNEXT requests until the subtree is left
//!
//! ## Example
//!
//! ```rust,no_run
//! use snmpwatch_adapters::snmp::SnmpAdapter;
//! use snmpwatch_adapters::Transport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = SnmpAdapter::builder()
//!         .host("192.0.2.1")
//!         .community("public")
//!         .build()?;
//!
//!     let system = adapter.walk(&"1.3.6.1.2.1.1".parse()?).await?;
//!     println!("system group has {} values", system.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use snmp::{SnmpError, SnmpPdu, SyncSession, Value, Varbinds};
use tracing::debug;

use snmpwatch_types::{ObjectIdentifier, RawValue, TimeTicks};

use crate::{Transport, TransportError};

/// SNMP adapter bound to a single agent.
#[derive(Clone)]
pub struct SnmpAdapter {
    session: Arc<Mutex<SyncSession>>,
    description: String,
}

impl SnmpAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> SnmpAdapterBuilder {
        SnmpAdapterBuilder::default()
    }

    /// Run one blocking exchange on the session off the async executor.
    async fn exchange<T, F>(&self, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SyncSession) -> Result<T, TransportError> + Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || {
            let mut session = session.lock();
            f(&mut *session)
        })
        .await
        .map_err(|e| TransportError::NoResponse(format!("query task failed: {}", e)))?
    }
}

impl std::fmt::Debug for SnmpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnmpAdapter")
            .field("description", &self.description)
            .finish()
    }
}

#[async_trait]
impl Transport for SnmpAdapter {
    async fn get(&self, oid: &ObjectIdentifier) -> Result<RawValue, TransportError> {
        let oid = oid.clone();
        self.exchange(move |session| {
            let pdu = session.get(oid.arcs()).map_err(map_snmp_error)?;
            check_status(&pdu, std::slice::from_ref(&oid))?;
            let value = pdu
                .varbinds
                .map(|(_, value)| decode(value))
                .next()
                .unwrap_or(RawValue::Absent);
            Ok(value)
        })
        .await
    }

    async fn bulk_get(
        &self,
        oids: &[ObjectIdentifier],
        _non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<RawValue>, TransportError> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let requested = oids.to_vec();
        self.exchange(move |session| {
            let names: Vec<ObjectIdentifier> =
                requested.iter().map(ObjectIdentifier::predecessor).collect();
            let name_refs: Vec<&[u32]> = names.iter().map(ObjectIdentifier::arcs).collect();

            // Every name is a non-repeater: one successor per requested instance.
            let pdu = session
                .getbulk(&name_refs, name_refs.len() as u32, max_repetitions)
                .map_err(map_snmp_error)?;
            check_status(&pdu, &requested)?;
            exact_values(pdu.varbinds, &requested)
        })
        .await
    }

    async fn walk(&self, subtree: &ObjectIdentifier) -> Result<Vec<RawValue>, TransportError> {
        let subtree = subtree.clone();
        self.exchange(move |session| {
            let mut values = Vec::new();
            let mut current = subtree.clone();
            let mut buf = [0u32; 128];

            loop {
                let pdu = session.getnext(current.arcs()).map_err(map_snmp_error)?;
                check_status(&pdu, std::slice::from_ref(&current))?;

                // endOfMibView does not decode as a varbind, so the walk ends here.
                let Some((name, value)) = pdu.varbinds.into_iter().next() else {
                    break;
                };

                let next = ObjectIdentifier::from(
                    name.read_name(&mut buf)
                        .map_err(|e| TransportError::Decode(format!("{:?}", e)))?,
                );
                if !next.starts_with(&subtree) {
                    break;
                }
                if next <= current {
                    return Err(TransportError::Decode(format!(
                        "agent returned non-increasing identifier {} after {}",
                        next, current
                    )));
                }

                values.push(decode(value));
                current = next;
            }

            debug!(subtree = %subtree, count = values.len(), "walk complete");
            Ok(values)
        })
        .await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn check_status(pdu: &SnmpPdu, request: &[ObjectIdentifier]) -> Result<(), TransportError> {
    if pdu.error_status != 0 {
        return Err(TransportError::agent(
            pdu.error_status,
            pdu.error_index,
            request,
        ));
    }
    Ok(())
}

fn map_snmp_error(err: SnmpError) -> TransportError {
    match err {
        SnmpError::ReceiveError => TransportError::Timeout,
        SnmpError::SendError => TransportError::NoResponse("failed to send request".to_string()),
        other => TransportError::Decode(format!("{:?}", other)),
    }
}

/// Pair each returned varbind with the instance it was asked for.
///
/// A v2 exception (noSuchObject, noSuchInstance, endOfMibView) does not
/// decode as a varbind and ends iteration, so it and every slot after it
/// read as absent.
fn exact_values(
    varbinds: Varbinds<'_>,
    requested: &[ObjectIdentifier],
) -> Result<Vec<RawValue>, TransportError> {
    let mut values = Vec::with_capacity(requested.len());
    let mut buf = [0u32; 128];
    for ((name, value), wanted) in varbinds.zip(requested.iter()) {
        let returned = name
            .read_name(&mut buf)
            .map_err(|e| TransportError::Decode(format!("{:?}", e)))?;
        if returned == wanted.arcs() {
            values.push(decode(value));
        } else {
            values.push(RawValue::Absent);
        }
    }
    values.resize(requested.len(), RawValue::Absent);
    Ok(values)
}

fn decode(value: Value) -> RawValue {
    match value {
        Value::Integer(v) => RawValue::Integer(v),
        Value::Counter32(v) | Value::Unsigned32(v) => RawValue::Integer(v as i64),
        Value::Counter64(v) => match i64::try_from(v) {
            Ok(v) => RawValue::Integer(v),
            Err(_) => {
                debug!(value = v, "Counter64 beyond i64 range decoded as absent");
                RawValue::Absent
            }
        },
        Value::Timeticks(v) => RawValue::TimeInterval(TimeTicks(v)),
        Value::OctetString(bytes) => RawValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        Value::IpAddress([a, b, c, d]) => RawValue::Text(format!("{}.{}.{}.{}", a, b, c, d)),
        Value::ObjectIdentifier(oid) => {
            let mut buf = [0u32; 128];
            match oid.read_name(&mut buf) {
                Ok(arcs) => RawValue::Text(ObjectIdentifier::from(arcs).to_string()),
                Err(_) => RawValue::Absent,
            }
        }
        Value::Null => RawValue::Absent,
        _ => {
            debug!("unsupported value type decoded as absent");
            RawValue::Absent
        }
    }
}

/// Builder for SnmpAdapter.
#[derive(Debug, Default)]
pub struct SnmpAdapterBuilder {
    host: Option<String>,
    port: Option<u16>,
    community: Option<String>,
    timeout: Option<Duration>,
}

impl SnmpAdapterBuilder {
    /// Set the agent host name or address (default: localhost).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the agent UDP port (default: 161).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the community string (default: public).
    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.community = Some(community.into());
        self
    }

    /// Set the per-request timeout (default: 2 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bind the UDP session.
    pub fn build(self) -> Result<SnmpAdapter, TransportError> {
        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or(161);
        let community = self.community.unwrap_or_else(|| "public".to_string());
        let timeout = self.timeout.unwrap_or(Duration::from_secs(2));

        let session = SyncSession::new(
            (host.as_str(), port),
            community.as_bytes(),
            Some(timeout),
            0,
        )
        .map_err(|e| TransportError::NoResponse(format!("failed to open session: {}", e)))?;

        Ok(SnmpAdapter {
            session: Arc::new(Mutex::new(session)),
            description: format!("snmp://{}:{}", host, port),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_counters_and_strings() {
        assert_eq!(decode(Value::Counter32(7)), RawValue::Integer(7));
        assert_eq!(decode(Value::Counter64(1 << 40)), RawValue::Integer(1 << 40));
        assert_eq!(
            decode(Value::Timeticks(6000)),
            RawValue::TimeInterval(TimeTicks(6000))
        );
        assert_eq!(decode(Value::OctetString(b"eth0")), RawValue::from("eth0"));
        assert_eq!(
            decode(Value::IpAddress([192, 0, 2, 1])),
            RawValue::from("192.0.2.1")
        );
        assert_eq!(decode(Value::Null), RawValue::Absent);
        assert_eq!(decode(Value::Boolean(true)), RawValue::Absent);
    }

    #[test]
    fn oversized_counter64_is_absent() {
        assert_eq!(decode(Value::Counter64(u64::MAX)), RawValue::Absent);
        assert_eq!(
            decode(Value::Counter64(i64::MAX as u64)),
            RawValue::Integer(i64::MAX)
        );
    }

    fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag, body.len() as u8];
        out.extend_from_slice(body);
        out
    }

    fn encoded_oid(oid: &ObjectIdentifier) -> Vec<u8> {
        let arcs = oid.arcs();
        let mut body = vec![(arcs[0] * 40 + arcs[1]) as u8];
        body.extend(arcs[2..].iter().map(|&a| a as u8));
        tlv(0x06, &body)
    }

    /// A v2c response PDU whose varbinds are `(name, encoded value)` pairs.
    fn response(varbinds: &[(ObjectIdentifier, Vec<u8>)]) -> Vec<u8> {
        let list: Vec<u8> = varbinds
            .iter()
            .flat_map(|(name, value)| {
                let mut pair = encoded_oid(name);
                pair.extend_from_slice(value);
                tlv(0x30, &pair)
            })
            .collect();

        let mut pdu = vec![0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00];
        pdu.extend(tlv(0x30, &list));

        let mut message = vec![0x02, 0x01, 0x01];
        message.extend(tlv(0x04, b"public"));
        message.extend(tlv(0xA2, &pdu));
        tlv(0x30, &message)
    }

    fn column(n: u32) -> Vec<ObjectIdentifier> {
        let base: ObjectIdentifier = "1.3.6.1.2.1.2.2.1.10".parse().unwrap();
        (1..=n).map(|i| base.child(i)).collect()
    }

    #[test]
    fn exact_values_keep_request_order() {
        let requested = column(2);
        let bytes = response(&[
            (requested[0].clone(), vec![0x41, 0x02, 0x04, 0xB0]),
            (requested[1].clone(), vec![0x41, 0x02, 0x01, 0x2C]),
        ]);
        let pdu = SnmpPdu::from_bytes(&bytes).unwrap();

        assert_eq!(
            exact_values(pdu.varbinds, &requested).unwrap(),
            vec![RawValue::Integer(1200), RawValue::Integer(300)]
        );
    }

    #[test]
    fn exception_varbind_truncates_remaining_slots() {
        let requested = column(3);
        // 0x81 is noSuchInstance, which the decoder cannot read.
        let bytes = response(&[
            (requested[0].clone(), vec![0x41, 0x02, 0x04, 0xB0]),
            (requested[1].clone(), vec![0x81, 0x00]),
            (requested[2].clone(), vec![0x41, 0x02, 0x01, 0x2C]),
        ]);
        let pdu = SnmpPdu::from_bytes(&bytes).unwrap();

        assert_eq!(
            exact_values(pdu.varbinds, &requested).unwrap(),
            vec![RawValue::Integer(1200), RawValue::Absent, RawValue::Absent]
        );
    }

    #[test]
    fn successor_of_missing_instance_is_absent() {
        let requested = column(2);
        let past_column: ObjectIdentifier = "1.3.6.1.2.1.2.2.1.11.1".parse().unwrap();
        let bytes = response(&[
            (requested[0].clone(), vec![0x41, 0x01, 0x07]),
            (past_column, vec![0x41, 0x01, 0x09]),
        ]);
        let pdu = SnmpPdu::from_bytes(&bytes).unwrap();

        assert_eq!(
            exact_values(pdu.varbinds, &requested).unwrap(),
            vec![RawValue::Integer(7), RawValue::Absent]
        );
    }

    #[test]
    fn receive_failure_is_timeout() {
        assert_eq!(map_snmp_error(SnmpError::ReceiveError), TransportError::Timeout);
        assert!(matches!(
            map_snmp_error(SnmpError::AsnParseError),
            TransportError::Decode(_)
        ));
    }

    #[test]
    fn builder_defaults_describe_endpoint() {
        let adapter = SnmpAdapter::builder().host("127.0.0.1").port(1161).build().unwrap();
        assert_eq!(adapter.description(), "snmp://127.0.0.1:1161");
    }
}
