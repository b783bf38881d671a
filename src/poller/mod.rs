//! The polling core: one agent, one driver loop, one snapshot per cycle.
//!
//! ```text
//! Poller (scheduler) ──tick──▶ Collector ──get/bulk-get──▶ Transport
//!        │                        │
//!        │                        ├──▶ BulkAggregator (table columns)
//!        │                        └──▶ RateEngine / derived ratios
//!        │
//!        ├──▶ LivenessMonitor (alarm flag)
//!        └──▶ watch::Sender<Arc<Snapshot>> ──▶ PollerHandle / WatchSource
//! ```

mod aggregator;
mod collector;
mod liveness;
mod scheduler;
mod system;

pub use aggregator::{resolve_interface_count, BulkAggregator, DEFAULT_MAX_REPETITIONS};
pub use collector::{Collector, CyclePhase, InterfaceRefresh};
pub use liveness::{LivenessMonitor, LivenessState, DEFAULT_CHECK_EVERY, DEFAULT_UPTIME_FLOOR};
pub use scheduler::{Poller, PollerBuilder, PollerHandle, DEFAULT_INTERVAL};
pub use system::read_system_info;
