//! # snmpwatch
//!
//! Polls a network device over SNMP and derives windowed performance metrics.
//!
//! The crate periodically queries one management agent for interface, IP and
//! system counters, turns them into rates and ratios (throughput, link
//! utilization, error ratios, forwarding rate) and publishes one immutable
//! [`Snapshot`] per cycle. Presentation layers pull the latest snapshot at
//! their own cadence; the polling loop never waits for them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  poller                                                      │
//! │  ┌───────────┐   ┌───────────┐   ┌──────────────────────┐    │
//! │  │ scheduler │──▶│ collector │──▶│ snmpwatch_adapters   │    │
//! │  │ (tick)    │   │ (cycle)   │   │ Transport (get/bulk/ │    │
//! │  └─────┬─────┘   └─────┬─────┘   │ walk)                │    │
//! │        │               │         └──────────────────────┘    │
//! │        │               ▼                                     │
//! │        │         ┌───────────┐                               │
//! │        │         │   data    │ rate engine, ratios, history  │
//! │        ▼         └───────────┘                               │
//! │  watch<Arc<Snapshot>> ──▶ PollerHandle / WatchSource / Output│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`registry`]**: the fixed metric table ([`MetricRegistry`])
//! - **[`poller`]**: scheduler, collector, bulk aggregator and liveness monitor
//! - **[`data`]**: counter-rate engine, derived ratios, bounded history
//! - **[`source`]**: non-blocking pull access to published snapshots
//! - **[`output`]**: JSON file and log outputs
//! - **[`config`]**: layered settings (defaults, TOML, environment, CLI)
//!
//! ## Usage
//!
//! ```bash
//! # Poll a router every 5 seconds
//! snmpwatch --host 192.0.2.1 --community public
//!
//! # Keep the latest snapshot on disk for another process
//! snmpwatch --config snmpwatch.toml --snapshot-file latest.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use snmpwatch::{Poller, SnapshotSource};
//! use snmpwatch_adapters::mock::MockTransport;
//!
//! # tokio_test::block_on(async {
//! let poller = Poller::builder(Arc::new(MockTransport::typical_agent()))
//!     .build()
//!     .await
//!     .unwrap();
//! println!("polling {} interfaces", poller.interface_count());
//!
//! let handle = poller.start();
//! let mut source = handle.source();
//! handle.subscribe().changed().await.unwrap();
//! if let Some(snapshot) = source.poll() {
//!     println!("throughput: {:?}", snapshot.get("throughput"));
//! }
//! handle.stop().await;
//! # });
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod poller;
pub mod registry;
pub mod source;

pub use config::{Overrides, Settings};
pub use data::{History, Rate, RateEngine};
pub use error::PollError;
pub use output::Output;
pub use poller::{Collector, InterfaceRefresh, LivenessMonitor, Poller, PollerBuilder, PollerHandle};
pub use registry::{MetricKind, MetricRegistry, MetricSpec, ValueType};
pub use source::{SnapshotSource, WatchSource};

pub use snmpwatch_types::{MetricValue, Snapshot, SystemInfo};
