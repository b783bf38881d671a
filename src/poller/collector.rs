//! Snapshot builder - one poll cycle from queries to an immutable snapshot.
//!
//! A cycle moves through `Idle -> Querying -> Deriving -> Published`:
//!
//! - **Querying**: every polled scalar is read with `get`, every polled table
//!   column is summed across interfaces with one bulk request. A failed query
//!   only makes its own metric `Absent`.
//! - **Deriving**: counters are turned into rates and the ratio metrics are
//!   computed from this cycle's readings.
//! - **Published**: the snapshot has been handed to the scheduler, which sets
//!   the collector back to `Idle` once consumers can see it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snmpwatch_adapters::Transport;
use snmpwatch_types::{MetricValue, Snapshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::aggregator::BulkAggregator;
use crate::data::{derived, RateEngine};
use crate::error::PollError;
use crate::registry::{names, MetricRegistry};

/// What to do when the agent's interface count changes after start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceRefresh {
    /// Keep aggregating over the start-up count.
    #[default]
    Never,
    /// Aggregate over the newly reported count from the next table read on.
    Adopt,
}

/// Where the collector is within a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePhase {
    #[default]
    Idle,
    Querying,
    Deriving,
    Published,
}

/// Runs poll cycles against one agent.
///
/// Owns the rate baselines, so exactly one cycle can be in flight: `collect`
/// takes `&mut self`.
pub struct Collector {
    transport: Arc<dyn Transport>,
    registry: MetricRegistry,
    aggregator: BulkAggregator,
    rates: RateEngine,
    refresh: InterfaceRefresh,
    expected_interfaces: u32,
    stale: Option<u32>,
    phase: CyclePhase,
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("transport", &self.transport.description())
            .field("aggregator", &self.aggregator)
            .field("refresh", &self.refresh)
            .field("stale", &self.stale)
            .field("phase", &self.phase)
            .finish()
    }
}

impl Collector {
    /// Create a collector aggregating over the interfaces known to `aggregator`.
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: MetricRegistry,
        aggregator: BulkAggregator,
    ) -> Self {
        Self {
            transport,
            registry,
            expected_interfaces: aggregator.index_count(),
            aggregator,
            rates: RateEngine::new(),
            refresh: InterfaceRefresh::default(),
            stale: None,
            phase: CyclePhase::Idle,
        }
    }

    /// Set the interface refresh policy.
    pub fn with_interface_refresh(mut self, refresh: InterfaceRefresh) -> Self {
        self.refresh = refresh;
        self
    }

    /// Run one cycle now.
    pub async fn collect(&mut self) -> Snapshot {
        self.collect_at(Instant::now()).await
    }

    /// Run one cycle, timing rates as if the readings were taken at `now`.
    pub async fn collect_at(&mut self, now: Instant) -> Snapshot {
        self.phase = CyclePhase::Querying;
        let mut readings: HashMap<String, MetricValue> = HashMap::new();

        for spec in self.registry.polled_scalars() {
            let value = match self.transport.get(&spec.identifier).await {
                Ok(raw) => MetricValue::from(raw),
                Err(e) => {
                    debug!(metric = %spec.name, error = %PollError::from(e), "query failed");
                    MetricValue::Absent
                }
            };
            readings.insert(spec.name.clone(), value);
        }

        self.check_interface_count(readings.get(names::IF_NUMBER));

        for spec in self.registry.polled_tables() {
            let value = match self
                .aggregator
                .sum_across_indices(self.transport.as_ref(), &spec.identifier)
                .await
            {
                Ok(sum) => MetricValue::Integer(sum),
                Err(e) => {
                    debug!(metric = %spec.name, error = %e, "column query failed");
                    MetricValue::Absent
                }
            };
            readings.insert(spec.name.clone(), value);
        }

        self.phase = CyclePhase::Deriving;
        let derived = self.derive(&readings, now);

        let mut builder = Snapshot::builder();
        for (name, value) in readings.into_iter().chain(derived) {
            builder = builder.value(name, value);
        }
        self.phase = CyclePhase::Published;
        builder.build()
    }

    fn derive(
        &mut self,
        readings: &HashMap<String, MetricValue>,
        now: Instant,
    ) -> Vec<(String, MetricValue)> {
        let int = |name: &str| match readings.get(name) {
            Some(MetricValue::Integer(v)) => Some(*v),
            _ => None,
        };

        let error_ratio = match (
            int(names::IF_IN_ERRORS),
            int(names::IF_IN_UCAST_PKTS),
            int(names::IF_IN_NUCAST_PKTS),
        ) {
            (Some(errors), Some(unicast), Some(non_unicast)) => {
                MetricValue::Ratio(derived::error_ratio(errors, unicast, non_unicast))
            }
            _ => MetricValue::Absent,
        };

        let throughput = match (int(names::IF_IN_OCTETS), int(names::IF_OUT_OCTETS)) {
            (Some(rx), Some(tx)) => {
                MetricValue::from(self.rates.rate(names::THROUGHPUT, now, rx.saturating_add(tx)))
            }
            _ => MetricValue::Absent,
        };

        let link_utilization = match (&throughput, int(names::IF_SPEED)) {
            (MetricValue::Rate(bytes), Some(speed)) => derived::link_utilization(*bytes, speed)
                .map(MetricValue::Ratio)
                .unwrap_or(MetricValue::Absent),
            (MetricValue::Suspended, Some(_)) => MetricValue::Suspended,
            _ => MetricValue::Absent,
        };

        let ip_error_ratio = match (
            int(names::IP_IN_HDR_ERRORS),
            int(names::IP_IN_ADDR_ERRORS),
            int(names::IP_IN_UNKNOWN_PROTOS),
            int(names::IP_IN_RECEIVES),
        ) {
            (Some(hdr), Some(addr), Some(proto), Some(received)) => {
                derived::ip_error_ratio(hdr, addr, proto, received)
                    .map(MetricValue::Ratio)
                    .unwrap_or(MetricValue::Absent)
            }
            _ => MetricValue::Absent,
        };

        let forwarding_rate = match int(names::IP_FORW_DATAGRAMS) {
            Some(forwarded) => {
                MetricValue::from(self.rates.rate(names::FORWARDING_RATE, now, forwarded))
            }
            None => MetricValue::Absent,
        };

        vec![
            (names::ERROR_RATIO.to_string(), error_ratio),
            (names::THROUGHPUT.to_string(), throughput),
            (names::LINK_UTILIZATION.to_string(), link_utilization),
            (names::IP_ERROR_RATIO.to_string(), ip_error_ratio),
            (names::FORWARDING_RATE.to_string(), forwarding_rate),
        ]
    }

    fn check_interface_count(&mut self, reading: Option<&MetricValue>) {
        let observed = match reading {
            Some(MetricValue::Integer(v)) => u32::try_from(*v).ok(),
            _ => None,
        };
        let Some(observed) = observed else {
            return;
        };

        if observed == self.expected_interfaces {
            self.stale = None;
            return;
        }

        if self.stale != Some(observed) {
            let err = PollError::InterfaceCountStale {
                expected: self.expected_interfaces,
                observed,
            };
            warn!(policy = ?self.refresh, "{}", err);
            self.stale = Some(observed);
        }

        if self.refresh == InterfaceRefresh::Adopt {
            self.aggregator.set_index_count(observed);
            self.expected_interfaces = observed;
            self.stale = None;
            // Sums over a different set of interfaces are not comparable.
            self.rates.forget(names::THROUGHPUT);
        }
    }

    /// Mark the last snapshot as visible to consumers.
    pub fn published(&mut self) {
        self.phase = CyclePhase::Idle;
    }

    /// Current phase.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Number of interfaces tables are aggregated over.
    pub fn interface_count(&self) -> Result<u32, PollError> {
        match self.stale {
            Some(observed) => Err(PollError::InterfaceCountStale {
                expected: self.expected_interfaces,
                observed,
            }),
            None => Ok(self.aggregator.index_count()),
        }
    }

    /// The registry this collector polls.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// The transport this collector queries.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The aggregator used for table columns.
    pub fn aggregator(&self) -> &BulkAggregator {
        &self.aggregator
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use snmpwatch_adapters::mock::MockTransport;
    use snmpwatch_adapters::TransportError;
    use snmpwatch_types::{RawValue, TimeTicks};

    fn collector(agent: &MockTransport) -> Collector {
        Collector::new(
            Arc::new(agent.clone()),
            MetricRegistry::standard(),
            BulkAggregator::new(3),
        )
    }

    #[tokio::test]
    async fn first_cycle_reads_and_suspends_rates() {
        let agent = MockTransport::typical_agent();
        let mut collector = collector(&agent);

        let snapshot = collector.collect().await;

        assert_eq!(snapshot.get("ifInOctets"), Some(&MetricValue::Integer(3_000)));
        assert_eq!(snapshot.get("ifSpeed"), Some(&MetricValue::Integer(110_000_000)));
        assert_eq!(
            snapshot.get("sysUpTime"),
            Some(&MetricValue::Ticks(TimeTicks(360_000)))
        );
        assert_eq!(snapshot.get("throughput"), Some(&MetricValue::Suspended));
        assert_eq!(snapshot.get("linkUtilization"), Some(&MetricValue::Suspended));
        assert_eq!(snapshot.get("forwardingRate"), Some(&MetricValue::Suspended));
        assert_eq!(snapshot.get("errorRatio"), Some(&MetricValue::Ratio(5.0 / 1000.0)));
        assert_eq!(snapshot.get("ipErrorRatio"), Some(&MetricValue::Ratio(1.0)));
        assert!(snapshot.get("sysName").is_none());
        assert!(!snapshot.alarm);
        assert_eq!(collector.phase(), CyclePhase::Published);
        assert_eq!(agent.calls().bulk_get, 6);
    }

    #[tokio::test]
    async fn second_cycle_computes_rates() {
        let agent = MockTransport::typical_agent();
        let mut collector = collector(&agent);
        let t0 = Instant::now();

        collector.collect_at(t0).await;
        collector.published();

        // +5000 bytes in, +0 out, +50 forwarded over five seconds.
        agent.set("1.3.6.1.2.1.2.2.1.10.2", RawValue::Integer(7_000));
        agent.set("1.3.6.1.2.1.4.6.0", RawValue::Integer(550));
        let snapshot = collector.collect_at(t0 + Duration::from_secs(5)).await;

        assert_eq!(snapshot.get("throughput"), Some(&MetricValue::Rate(1000.0)));
        assert_eq!(snapshot.get("forwardingRate"), Some(&MetricValue::Rate(10.0)));
        assert_eq!(
            snapshot.get("linkUtilization"),
            Some(&MetricValue::Ratio(1000.0 * 8.0 / 110_000_000.0))
        );
    }

    #[tokio::test]
    async fn failed_query_only_affects_its_metric() {
        let agent = MockTransport::typical_agent();
        agent.fail("1.3.6.1.2.1.4.6.0", TransportError::Timeout);
        let mut collector = collector(&agent);

        let snapshot = collector.collect().await;

        assert_eq!(snapshot.get("ipForwDatagrams"), Some(&MetricValue::Absent));
        assert_eq!(snapshot.get("forwardingRate"), Some(&MetricValue::Absent));
        assert_eq!(snapshot.get("ipInReceives"), Some(&MetricValue::Integer(10_000)));
        assert_eq!(snapshot.get("ifInErrors"), Some(&MetricValue::Integer(5)));
        assert_eq!(snapshot.absent().collect::<Vec<_>>(), vec!["forwardingRate", "ipForwDatagrams"]);
    }

    #[tokio::test]
    async fn failed_column_makes_dependants_absent() {
        let agent = MockTransport::typical_agent();
        agent.fail(
            "1.3.6.1.2.1.2.2.1.16.1",
            TransportError::Agent {
                code: 5,
                index: 0,
                at: None,
            },
        );
        let mut collector = collector(&agent);

        let snapshot = collector.collect().await;

        assert_eq!(snapshot.get("ifOutOctets"), Some(&MetricValue::Absent));
        assert_eq!(snapshot.get("throughput"), Some(&MetricValue::Absent));
        assert_eq!(snapshot.get("linkUtilization"), Some(&MetricValue::Absent));
        assert_eq!(snapshot.get("ifInOctets"), Some(&MetricValue::Integer(3_000)));
    }

    #[tokio::test]
    async fn zero_denominators() {
        let agent = MockTransport::typical_agent();
        for i in 1..=3 {
            agent.set(&format!("1.3.6.1.2.1.2.2.1.11.{}", i), RawValue::Integer(0));
            agent.set(&format!("1.3.6.1.2.1.2.2.1.12.{}", i), RawValue::Integer(0));
        }
        agent.set("1.3.6.1.2.1.4.3.0", RawValue::Integer(0));
        let mut collector = collector(&agent);

        let snapshot = collector.collect().await;

        assert_eq!(snapshot.get("errorRatio"), Some(&MetricValue::Ratio(5.0)));
        assert_eq!(snapshot.get("ipErrorRatio"), Some(&MetricValue::Absent));
    }

    #[tokio::test]
    async fn interface_count_change_is_reported_but_not_adopted() {
        let agent = MockTransport::typical_agent();
        let mut collector = collector(&agent);

        agent.set("1.3.6.1.2.1.2.1.0", RawValue::Integer(4));
        collector.collect().await;

        assert_eq!(
            collector.interface_count(),
            Err(PollError::InterfaceCountStale {
                expected: 3,
                observed: 4
            })
        );
        assert_eq!(agent.last_bulk_request().unwrap().oids.len(), 3);

        agent.set("1.3.6.1.2.1.2.1.0", RawValue::Integer(3));
        collector.collect().await;
        assert_eq!(collector.interface_count(), Ok(3));
    }

    #[tokio::test]
    async fn interface_count_change_is_adopted() {
        let agent = MockTransport::typical_agent();
        let mut collector = collector(&agent).with_interface_refresh(InterfaceRefresh::Adopt);
        let t0 = Instant::now();
        collector.collect_at(t0).await;

        agent.set("1.3.6.1.2.1.2.1.0", RawValue::Integer(4));
        agent.set("1.3.6.1.2.1.2.2.1.10.4", RawValue::Integer(9_000));
        let snapshot = collector.collect_at(t0 + Duration::from_secs(5)).await;

        assert_eq!(collector.interface_count(), Ok(4));
        assert_eq!(agent.last_bulk_request().unwrap().oids.len(), 4);
        assert_eq!(snapshot.get("ifInOctets"), Some(&MetricValue::Integer(12_000)));
        assert_eq!(snapshot.get("throughput"), Some(&MetricValue::Suspended));
    }
}
