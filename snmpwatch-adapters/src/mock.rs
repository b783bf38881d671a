//! Scripted in-memory agent.
//!
//! `MockTransport` answers queries from a sorted table of instances and can be
//! told to fail individual identifiers or go offline entirely. The table is
//! behind a lock so a test can keep a clone and move counters between poll
//! cycles while the poller owns another clone.
//!
//! ```rust
//! use snmpwatch_adapters::mock::MockTransport;
//! use snmpwatch_adapters::Transport;
//! use snmpwatch_types::RawValue;
//!
//! # tokio_test::block_on(async {
//! let agent = MockTransport::new().with("1.3.6.1.2.1.4.6.0", RawValue::Integer(10));
//! let value = agent.get(&"1.3.6.1.2.1.4.6.0".parse().unwrap()).await.unwrap();
//! assert_eq!(value, RawValue::Integer(10));
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use snmpwatch_types::{ObjectIdentifier, RawValue, TimeTicks};

use crate::{Transport, TransportError};

/// Number of calls of each kind served by a [`MockTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get: usize,
    pub bulk_get: usize,
    pub walk: usize,
}

/// Arguments of the most recent bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    pub oids: Vec<ObjectIdentifier>,
    pub non_repeaters: u32,
    pub max_repetitions: u32,
}

#[derive(Debug, Default)]
struct AgentState {
    instances: BTreeMap<ObjectIdentifier, RawValue>,
    failures: HashMap<ObjectIdentifier, TransportError>,
    offline: bool,
    latency: Duration,
    in_flight: usize,
    max_in_flight: usize,
    calls: CallCounts,
    last_bulk: Option<BulkRequest>,
}

impl AgentState {
    fn check_reachable(&self) -> Result<(), TransportError> {
        if self.offline {
            Err(TransportError::Timeout)
        } else {
            Ok(())
        }
    }

    fn check_failure(&self, oid: &ObjectIdentifier) -> Result<(), TransportError> {
        match self.failures.get(oid) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn lookup(&self, oid: &ObjectIdentifier) -> RawValue {
        self.instances.get(oid).cloned().unwrap_or(RawValue::Absent)
    }
}

/// A scripted agent that answers from memory.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<AgentState>>,
}

impl MockTransport {
    /// Create an agent with no instances.
    pub fn new() -> Self {
        Self::default()
    }

    /// An agent with the system group, three interfaces and the IP, ICMP,
    /// TCP, UDP and SNMP scalars populated with plausible values.
    pub fn typical_agent() -> Self {
        let agent = Self::new()
            .with("1.3.6.1.2.1.1.1.0", "Hardware: x86_64 - Software: Linux 6.1")
            .with("1.3.6.1.2.1.1.2.0", "1.3.6.1.4.1.8072.3.2.10")
            .with("1.3.6.1.2.1.1.3.0", TimeTicks(360_000))
            .with("1.3.6.1.2.1.1.4.0", "noc@example.net")
            .with("1.3.6.1.2.1.1.5.0", "edge-router")
            .with("1.3.6.1.2.1.1.6.0", "")
            .with("1.3.6.1.2.1.1.7.0", RawValue::Integer(72))
            .with("1.3.6.1.2.1.2.1.0", RawValue::Integer(3))
            .with("1.3.6.1.2.1.4.3.0", RawValue::Integer(10_000))
            .with("1.3.6.1.2.1.4.4.0", RawValue::Integer(10))
            .with("1.3.6.1.2.1.4.5.0", RawValue::Integer(20))
            .with("1.3.6.1.2.1.4.6.0", RawValue::Integer(500))
            .with("1.3.6.1.2.1.4.7.0", RawValue::Integer(70))
            .with("1.3.6.1.2.1.5.21.0", RawValue::Integer(4))
            .with("1.3.6.1.2.1.5.22.0", RawValue::Integer(6))
            .with("1.3.6.1.2.1.6.10.0", RawValue::Integer(8_000))
            .with("1.3.6.1.2.1.6.11.0", RawValue::Integer(7_500))
            .with("1.3.6.1.2.1.7.1.0", RawValue::Integer(1_200))
            .with("1.3.6.1.2.1.7.4.0", RawValue::Integer(1_100))
            .with("1.3.6.1.2.1.11.1.0", RawValue::Integer(40))
            .with("1.3.6.1.2.1.11.2.0", RawValue::Integer(40));

        let columns: [(&str, [i64; 3]); 6] = [
            ("1.3.6.1.2.1.2.2.1.5", [10_000_000, 100_000_000, 0]),
            ("1.3.6.1.2.1.2.2.1.10", [1_000, 2_000, 0]),
            ("1.3.6.1.2.1.2.2.1.11", [400, 500, 0]),
            ("1.3.6.1.2.1.2.2.1.12", [50, 50, 0]),
            ("1.3.6.1.2.1.2.2.1.14", [3, 2, 0]),
            ("1.3.6.1.2.1.2.2.1.16", [500, 1_500, 0]),
        ];
        for (column, values) in columns {
            for (i, value) in values.into_iter().enumerate() {
                agent.set(&format!("{}.{}", column, i + 1), RawValue::Integer(value));
            }
        }
        for (i, name) in ["lo", "eth0", "eth1"].into_iter().enumerate() {
            agent.set(&format!("1.3.6.1.2.1.31.1.1.1.1.{}", i + 1), name);
        }
        agent
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(self, oid: &str, value: impl Into<RawValue>) -> Self {
        self.set(oid, value);
        self
    }

    /// Set or replace the value of an instance.
    ///
    /// # Panics
    ///
    /// Panics if `oid` is not a valid dotted identifier.
    pub fn set(&self, oid: &str, value: impl Into<RawValue>) {
        let oid = parse(oid);
        self.state.lock().instances.insert(oid, value.into());
    }

    /// Remove an instance so that it reads as absent.
    pub fn remove(&self, oid: &str) {
        self.state.lock().instances.remove(&parse(oid));
    }

    /// Make every query touching `oid` fail with `err`.
    pub fn fail(&self, oid: &str, err: TransportError) {
        self.state.lock().failures.insert(parse(oid), err);
    }

    /// Delay every answer by `latency` (tokio time, so paused clocks apply).
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Most queries ever outstanding at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    /// Make every query time out (or stop doing so).
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Calls served so far.
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// The most recent bulk request.
    pub fn last_bulk_request(&self) -> Option<BulkRequest> {
        self.state.lock().last_bulk.clone()
    }
}

impl MockTransport {
    /// Wait out the configured latency, then answer from the current state.
    async fn serve<T>(&self, answer: impl FnOnce(&mut AgentState) -> T + Send) -> T {
        let latency = {
            let mut state = self.state.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        state.in_flight -= 1;
        answer(&mut state)
    }
}

fn parse(oid: &str) -> ObjectIdentifier {
    oid.parse()
        .unwrap_or_else(|e| panic!("invalid mock identifier '{}': {}", oid, e))
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, oid: &ObjectIdentifier) -> Result<RawValue, TransportError> {
        self.serve(|state| -> Result<RawValue, TransportError> {
            state.calls.get += 1;
            state.check_reachable()?;
            state.check_failure(oid)?;
            Ok(state.lookup(oid))
        })
        .await
    }

    async fn bulk_get(
        &self,
        oids: &[ObjectIdentifier],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<RawValue>, TransportError> {
        self.serve(|state| -> Result<Vec<RawValue>, TransportError> {
            state.calls.bulk_get += 1;
            state.last_bulk = Some(BulkRequest {
                oids: oids.to_vec(),
                non_repeaters,
                max_repetitions,
            });
            state.check_reachable()?;
            for (i, oid) in oids.iter().enumerate() {
                if let Some(TransportError::Agent { code, .. }) = state.failures.get(oid) {
                    return Err(TransportError::agent(*code, i as u32 + 1, oids));
                }
                state.check_failure(oid)?;
            }
            Ok(oids.iter().map(|oid| state.lookup(oid)).collect())
        })
        .await
    }

    async fn walk(&self, subtree: &ObjectIdentifier) -> Result<Vec<RawValue>, TransportError> {
        self.serve(|state| -> Result<Vec<RawValue>, TransportError> {
            state.calls.walk += 1;
            state.check_reachable()?;

            let mut values = Vec::new();
            for (oid, value) in state.instances.range(subtree.clone()..) {
                if !oid.starts_with(subtree) {
                    break;
                }
                state.check_failure(oid)?;
                values.push(value.clone());
            }
            Ok(values)
        })
        .await
    }

    fn description(&self) -> &str {
        "mock agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> ObjectIdentifier {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn get_returns_absent_for_unknown_instance() {
        let agent = MockTransport::new();
        assert_eq!(agent.get(&oid("1.3.6.1.2.1.4.3.0")).await, Ok(RawValue::Absent));
        assert_eq!(agent.calls().get, 1);
    }

    #[tokio::test]
    async fn bulk_keeps_one_entry_per_request() {
        let agent = MockTransport::new()
            .with("1.3.6.1.2.1.2.2.1.10.1", RawValue::Integer(1200))
            .with("1.3.6.1.2.1.2.2.1.10.3", RawValue::Integer(300));

        let request: Vec<_> = (1..=3).map(|i| oid("1.3.6.1.2.1.2.2.1.10").child(i)).collect();
        let values = agent.bulk_get(&request, 0, 25).await.unwrap();

        assert_eq!(
            values,
            vec![RawValue::Integer(1200), RawValue::Absent, RawValue::Integer(300)]
        );
        let last = agent.last_bulk_request().unwrap();
        assert_eq!(last.oids, request);
        assert_eq!((last.non_repeaters, last.max_repetitions), (0, 25));
    }

    #[tokio::test]
    async fn bulk_failure_fails_whole_request() {
        let agent = MockTransport::typical_agent();
        agent.fail(
            "1.3.6.1.2.1.2.2.1.10.2",
            TransportError::Agent {
                code: 5,
                index: 0,
                at: None,
            },
        );

        let request: Vec<_> = (1..=3).map(|i| oid("1.3.6.1.2.1.2.2.1.10").child(i)).collect();
        let err = agent.bulk_get(&request, 0, 25).await.unwrap_err();
        assert_eq!(err, TransportError::agent(5, 2, &request));
    }

    #[tokio::test]
    async fn walk_stays_inside_subtree() {
        let agent = MockTransport::typical_agent();
        let system = agent.walk(&oid("1.3.6.1.2.1.1")).await.unwrap();

        assert_eq!(system.len(), 7);
        assert_eq!(system[2], RawValue::TimeInterval(TimeTicks(360_000)));
        assert_eq!(system[4], RawValue::from("edge-router"));
    }

    #[tokio::test]
    async fn walk_fails_without_partial_results() {
        let agent = MockTransport::typical_agent();
        agent.fail("1.3.6.1.2.1.1.5.0", TransportError::Timeout);
        assert_eq!(
            agent.walk(&oid("1.3.6.1.2.1.1")).await,
            Err(TransportError::Timeout)
        );
    }

    #[tokio::test]
    async fn offline_agent_times_out_everything() {
        let agent = MockTransport::typical_agent();
        agent.set_offline(true);

        assert_eq!(
            agent.get(&oid("1.3.6.1.2.1.1.3.0")).await,
            Err(TransportError::Timeout)
        );
        assert_eq!(
            agent.walk(&oid("1.3.6.1.2.1.1")).await,
            Err(TransportError::Timeout)
        );

        agent.set_offline(false);
        assert!(agent.get(&oid("1.3.6.1.2.1.1.3.0")).await.is_ok());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let agent = MockTransport::new();
        let handle = agent.clone();
        handle.set("1.3.6.1.2.1.4.6.0", RawValue::Integer(9));

        assert_eq!(
            agent.get(&oid("1.3.6.1.2.1.4.6.0")).await,
            Ok(RawValue::Integer(9))
        );
        handle.remove("1.3.6.1.2.1.4.6.0");
        assert_eq!(agent.get(&oid("1.3.6.1.2.1.4.6.0")).await, Ok(RawValue::Absent));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_each_answer() {
        let agent = MockTransport::typical_agent();
        agent.set_latency(Duration::from_millis(250));

        let started = tokio::time::Instant::now();
        agent.get(&oid("1.3.6.1.2.1.1.3.0")).await.unwrap();
        agent.walk(&oid("1.3.6.1.2.1.1")).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(500));
        assert_eq!(agent.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_queries_are_counted_in_flight() {
        let agent = MockTransport::typical_agent();
        agent.set_latency(Duration::from_secs(1));
        let uptime = oid("1.3.6.1.2.1.1.3.0");
        let forwarded = oid("1.3.6.1.2.1.4.6.0");

        let (a, b) = tokio::join!(agent.get(&uptime), agent.get(&forwarded));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(agent.max_in_flight(), 2);
    }
}
