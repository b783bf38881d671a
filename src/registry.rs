//! Metric registry - the fixed mapping from metric names to identifiers.
//!
//! The registry is populated once at start-up and only read afterwards. Each
//! entry says where a metric lives on the agent and how its raw value should be
//! treated: as a monotonically increasing counter, a gauge that is correct on
//! its own, or a descriptive string.

use std::collections::BTreeMap;

use snmpwatch_types::ObjectIdentifier;

use crate::error::PollError;

/// Names of the standard metrics and of the metrics derived from them.
pub mod names {
    pub const SYS_DESCR: &str = "sysDescr";
    pub const SYS_OBJECT_ID: &str = "sysObjectID";
    pub const SYS_UP_TIME: &str = "sysUpTime";
    pub const SYS_CONTACT: &str = "sysContact";
    pub const SYS_NAME: &str = "sysName";
    pub const SYS_LOCATION: &str = "sysLocation";
    pub const SYS_SERVICES: &str = "sysServices";
    pub const IF_NUMBER: &str = "ifNumber";
    pub const IF_SPEED: &str = "ifSpeed";
    pub const IF_IN_OCTETS: &str = "ifInOctets";
    pub const IF_IN_UCAST_PKTS: &str = "ifInUcastPkts";
    pub const IF_IN_NUCAST_PKTS: &str = "ifInNUcastPkts";
    pub const IF_IN_ERRORS: &str = "ifInErrors";
    pub const IF_OUT_OCTETS: &str = "ifOutOctets";
    pub const IF_NAME: &str = "ifName";
    pub const IP_IN_RECEIVES: &str = "ipInReceives";
    pub const IP_IN_HDR_ERRORS: &str = "ipInHdrErrors";
    pub const IP_IN_ADDR_ERRORS: &str = "ipInAddrErrors";
    pub const IP_FORW_DATAGRAMS: &str = "ipForwDatagrams";
    pub const IP_IN_UNKNOWN_PROTOS: &str = "ipInUnknownProtos";
    pub const ICMP_IN_ECHO_REPS: &str = "icmpInEchoReps";
    pub const ICMP_OUT_ECHO_REPS: &str = "icmpOutEchoReps";
    pub const TCP_IN_SEGS: &str = "tcpInSegs";
    pub const TCP_OUT_SEGS: &str = "tcpOutSegs";
    pub const UDP_IN_DATAGRAMS: &str = "udpInDatagrams";
    pub const UDP_OUT_DATAGRAMS: &str = "udpOutDatagrams";
    pub const SNMP_IN_PKTS: &str = "snmpInPkts";
    pub const SNMP_OUT_PKTS: &str = "snmpOutPkts";

    pub const ERROR_RATIO: &str = "errorRatio";
    pub const THROUGHPUT: &str = "throughput";
    pub const LINK_UTILIZATION: &str = "linkUtilization";
    pub const IP_ERROR_RATIO: &str = "ipErrorRatio";
    pub const FORWARDING_RATE: &str = "forwardingRate";
}

/// Root of the system group, read with a single walk.
pub const SYSTEM_GROUP: &[u32] = &[1, 3, 6, 1, 2, 1, 1];

/// Whether a metric is a single instance or a column replicated per interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Scalar,
    IndexedTable,
}

/// How a metric's raw value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Monotonically increasing (modulo wraparound); useful through its rate.
    Counter,
    /// Correct in its own right.
    Gauge,
    /// Descriptive string.
    Text,
}

/// Where a metric lives and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: String,
    pub identifier: ObjectIdentifier,
    pub kind: MetricKind,
    pub value_type: ValueType,
    /// Re-read on every poll cycle rather than only at start-up.
    pub per_cycle: bool,
}

impl MetricSpec {
    /// True for metrics re-read on every poll cycle.
    pub fn is_polled(&self) -> bool {
        self.per_cycle
    }
}

use names::*;
use MetricKind::{IndexedTable, Scalar};
use ValueType::{Counter, Gauge, Text};

const EVERY_CYCLE: bool = true;
const STARTUP: bool = false;

const STANDARD: &[(&str, &[u32], MetricKind, ValueType, bool)] = &[
    (SYS_DESCR, &[1, 3, 6, 1, 2, 1, 1, 1, 0], Scalar, Text, STARTUP),
    (SYS_OBJECT_ID, &[1, 3, 6, 1, 2, 1, 1, 2, 0], Scalar, Text, STARTUP),
    (SYS_UP_TIME, &[1, 3, 6, 1, 2, 1, 1, 3, 0], Scalar, Gauge, EVERY_CYCLE),
    (SYS_CONTACT, &[1, 3, 6, 1, 2, 1, 1, 4, 0], Scalar, Text, STARTUP),
    (SYS_NAME, &[1, 3, 6, 1, 2, 1, 1, 5, 0], Scalar, Text, STARTUP),
    (SYS_LOCATION, &[1, 3, 6, 1, 2, 1, 1, 6, 0], Scalar, Text, STARTUP),
    (SYS_SERVICES, &[1, 3, 6, 1, 2, 1, 1, 7, 0], Scalar, Gauge, STARTUP),
    (IF_NUMBER, &[1, 3, 6, 1, 2, 1, 2, 1, 0], Scalar, Gauge, EVERY_CYCLE),
    (IF_SPEED, &[1, 3, 6, 1, 2, 1, 2, 2, 1, 5], IndexedTable, Gauge, EVERY_CYCLE),
    (IF_IN_OCTETS, &[1, 3, 6, 1, 2, 1, 2, 2, 1, 10], IndexedTable, Counter, EVERY_CYCLE),
    (IF_IN_UCAST_PKTS, &[1, 3, 6, 1, 2, 1, 2, 2, 1, 11], IndexedTable, Counter, EVERY_CYCLE),
    (IF_IN_NUCAST_PKTS, &[1, 3, 6, 1, 2, 1, 2, 2, 1, 12], IndexedTable, Counter, EVERY_CYCLE),
    (IF_IN_ERRORS, &[1, 3, 6, 1, 2, 1, 2, 2, 1, 14], IndexedTable, Counter, EVERY_CYCLE),
    (IF_OUT_OCTETS, &[1, 3, 6, 1, 2, 1, 2, 2, 1, 16], IndexedTable, Counter, EVERY_CYCLE),
    (IF_NAME, &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1], IndexedTable, Text, STARTUP),
    (IP_IN_RECEIVES, &[1, 3, 6, 1, 2, 1, 4, 3, 0], Scalar, Counter, EVERY_CYCLE),
    (IP_IN_HDR_ERRORS, &[1, 3, 6, 1, 2, 1, 4, 4, 0], Scalar, Counter, EVERY_CYCLE),
    (IP_IN_ADDR_ERRORS, &[1, 3, 6, 1, 2, 1, 4, 5, 0], Scalar, Counter, EVERY_CYCLE),
    (IP_FORW_DATAGRAMS, &[1, 3, 6, 1, 2, 1, 4, 6, 0], Scalar, Counter, EVERY_CYCLE),
    (IP_IN_UNKNOWN_PROTOS, &[1, 3, 6, 1, 2, 1, 4, 7, 0], Scalar, Counter, EVERY_CYCLE),
    (ICMP_IN_ECHO_REPS, &[1, 3, 6, 1, 2, 1, 5, 21, 0], Scalar, Counter, EVERY_CYCLE),
    (ICMP_OUT_ECHO_REPS, &[1, 3, 6, 1, 2, 1, 5, 22, 0], Scalar, Counter, EVERY_CYCLE),
    (TCP_IN_SEGS, &[1, 3, 6, 1, 2, 1, 6, 10, 0], Scalar, Counter, EVERY_CYCLE),
    (TCP_OUT_SEGS, &[1, 3, 6, 1, 2, 1, 6, 11, 0], Scalar, Counter, EVERY_CYCLE),
    (UDP_IN_DATAGRAMS, &[1, 3, 6, 1, 2, 1, 7, 1, 0], Scalar, Counter, EVERY_CYCLE),
    (UDP_OUT_DATAGRAMS, &[1, 3, 6, 1, 2, 1, 7, 4, 0], Scalar, Counter, EVERY_CYCLE),
    (SNMP_IN_PKTS, &[1, 3, 6, 1, 2, 1, 11, 1, 0], Scalar, Counter, EVERY_CYCLE),
    (SNMP_OUT_PKTS, &[1, 3, 6, 1, 2, 1, 11, 2, 0], Scalar, Counter, EVERY_CYCLE),
];

/// Static lookup from metric name to [`MetricSpec`].
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    specs: BTreeMap<String, MetricSpec>,
}

impl MetricRegistry {
    /// Build a registry from explicit specs. Later duplicates replace earlier ones.
    pub fn new(specs: impl IntoIterator<Item = MetricSpec>) -> Self {
        Self {
            specs: specs.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    /// The standard interface, IP and system metrics.
    pub fn standard() -> Self {
        Self::new(
            STANDARD
                .iter()
                .map(|&(name, arcs, kind, value_type, per_cycle)| MetricSpec {
                    name: name.to_string(),
                    identifier: ObjectIdentifier::from(arcs),
                    kind,
                    value_type,
                    per_cycle,
                }),
        )
    }

    /// Look up a metric by name.
    pub fn resolve(&self, name: &str) -> Result<&MetricSpec, PollError> {
        self.specs
            .get(name)
            .ok_or_else(|| PollError::UnknownMetric(name.to_string()))
    }

    /// Iterate over all specs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.values()
    }

    /// Scalars re-read every cycle.
    pub fn polled_scalars(&self) -> impl Iterator<Item = &MetricSpec> {
        self.iter()
            .filter(|s| s.kind == MetricKind::Scalar && s.is_polled())
    }

    /// Table columns summed across interfaces every cycle.
    pub fn polled_tables(&self) -> impl Iterator<Item = &MetricSpec> {
        self.iter()
            .filter(|s| s.kind == MetricKind::IndexedTable && s.is_polled())
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True if no metrics are registered.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
