//! The periodic driver loop and its consumer-facing handle.

use std::sync::Arc;
use std::time::Duration;

use snmpwatch_adapters::Transport;
use snmpwatch_types::{MetricValue, Snapshot, SystemInfo, TimeTicks};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::aggregator::{resolve_interface_count, BulkAggregator, DEFAULT_MAX_REPETITIONS};
use super::collector::{Collector, InterfaceRefresh};
use super::liveness::{LivenessMonitor, DEFAULT_CHECK_EVERY, DEFAULT_UPTIME_FLOOR};
use super::system::read_system_info;
use crate::data::history::{History, SharedHistory, DEFAULT_HISTORY_LEN};
use crate::error::PollError;
use crate::registry::{names, MetricRegistry};
use crate::source::WatchSource;

/// Default poll interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// A poller for one agent, ready to start.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use snmpwatch::Poller;
/// use snmpwatch_adapters::mock::MockTransport;
///
/// # tokio_test::block_on(async {
/// let poller = Poller::builder(Arc::new(MockTransport::typical_agent()))
///     .interval(Duration::from_secs(5))
///     .build()
///     .await
///     .unwrap();
///
/// let handle = poller.start();
/// let mut updates = handle.subscribe();
/// updates.changed().await.unwrap();
/// assert!(handle.latest_snapshot().get("ifInOctets").is_some());
/// handle.stop().await;
/// # });
/// ```
#[derive(Debug)]
pub struct Poller {
    collector: Collector,
    liveness: LivenessMonitor,
    interval: Duration,
    history: SharedHistory,
    system_info: Option<Arc<SystemInfo>>,
}

impl Poller {
    /// Create a builder polling through `transport`.
    pub fn builder(transport: Arc<dyn Transport>) -> PollerBuilder {
        PollerBuilder::new(transport)
    }

    /// Agent description read at start-up, if the read succeeded.
    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system_info.as_deref()
    }

    /// Number of interfaces table columns are summed over.
    pub fn interface_count(&self) -> u32 {
        self.collector.aggregator().index_count()
    }

    /// Start polling in a background task.
    ///
    /// The first cycle runs immediately, then one every interval. A slow cycle
    /// delays the next tick rather than overlapping with it.
    pub fn start(self) -> PollerHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::default()));
        let (stop_tx, stop_rx) = watch::channel(false);
        let history = self.history.clone();
        let system_info = self.system_info.clone();
        let description = self.collector.transport().description().to_string();

        let task = tokio::spawn(self.run(snapshot_tx, stop_rx));

        PollerHandle {
            snapshot_rx,
            stop_tx,
            history,
            system_info,
            description,
            task,
        }
    }

    async fn run(
        mut self,
        snapshot_tx: watch::Sender<Arc<Snapshot>>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            agent = %self.collector.transport().description(),
            interval = ?self.interval,
            interfaces = self.interface_count(),
            "poller started"
        );

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            // The cycle runs outside the select so a stop request never
            // interrupts it halfway.
            let snapshot = self.cycle().await;
            snapshot_tx.send_replace(snapshot);
            self.collector.published();
        }

        info!("poller stopped");
    }

    async fn cycle(&mut self) -> Arc<Snapshot> {
        let mut snapshot = self.collector.collect().await;

        let uptime = match snapshot.get(names::SYS_UP_TIME) {
            Some(MetricValue::Ticks(ticks)) => Some(*ticks),
            Some(MetricValue::Integer(v)) => u32::try_from(*v).ok().map(TimeTicks),
            _ => None,
        };
        snapshot.alarm = self.liveness.observe(uptime);

        self.history.write().record(&snapshot);
        debug!(
            values = snapshot.len(),
            absent = snapshot.absent().count(),
            alarm = snapshot.alarm,
            "cycle complete"
        );
        Arc::new(snapshot)
    }
}

/// Builder for [`Poller`].
pub struct PollerBuilder {
    transport: Arc<dyn Transport>,
    registry: MetricRegistry,
    interval: Duration,
    check_every: u32,
    uptime_floor: TimeTicks,
    max_repetitions: u32,
    history_len: usize,
    interface_refresh: InterfaceRefresh,
}

impl PollerBuilder {
    /// Create a builder with default settings.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: MetricRegistry::standard(),
            interval: DEFAULT_INTERVAL,
            check_every: DEFAULT_CHECK_EVERY,
            uptime_floor: DEFAULT_UPTIME_FLOOR,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            history_len: DEFAULT_HISTORY_LEN,
            interface_refresh: InterfaceRefresh::default(),
        }
    }

    /// Set the metric registry (default: the standard table).
    pub fn registry(mut self, registry: MetricRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the poll interval (default: 5 seconds).
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set how many cycles pass between uptime checks (default: 6).
    pub fn liveness_check_every(mut self, cycles: u32) -> Self {
        self.check_every = cycles;
        self
    }

    /// Set the uptime below which the agent counts as restarted (default: 60 ticks).
    pub fn uptime_floor(mut self, floor: TimeTicks) -> Self {
        self.uptime_floor = floor;
        self
    }

    /// Set `max-repetitions` for bulk requests (default: 25).
    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    /// Set how many points of history are kept per metric (default: 20).
    pub fn history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }

    /// Set the interface refresh policy (default: never).
    pub fn interface_refresh(mut self, refresh: InterfaceRefresh) -> Self {
        self.interface_refresh = refresh;
        self
    }

    /// Resolve the interface count and read the agent description.
    ///
    /// Fails only if the interface count cannot be resolved; without it no
    /// table can be aggregated.
    pub async fn build(self) -> Result<Poller, PollError> {
        let if_number = self.registry.resolve(names::IF_NUMBER)?.identifier.clone();
        let interfaces = resolve_interface_count(self.transport.as_ref(), &if_number).await?;
        let aggregator = BulkAggregator::new(interfaces).with_max_repetitions(self.max_repetitions);

        let system_info =
            match read_system_info(self.transport.as_ref(), &self.registry, &aggregator).await {
                Ok(info) => Some(Arc::new(info)),
                Err(e) => {
                    warn!(error = %e, "failed to read system information");
                    None
                }
            };

        let collector = Collector::new(self.transport, self.registry, aggregator)
            .with_interface_refresh(self.interface_refresh);

        Ok(Poller {
            collector,
            liveness: LivenessMonitor::new(self.check_every, self.uptime_floor),
            interval: self.interval,
            history: History::shared(self.history_len),
            system_info,
        })
    }
}

/// Consumer-side handle to a running poller.
///
/// Dropping the handle stops the poller after its current cycle.
#[derive(Debug)]
pub struct PollerHandle {
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    stop_tx: watch::Sender<bool>,
    history: SharedHistory,
    system_info: Option<Arc<SystemInfo>>,
    description: String,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// The most recently published snapshot.
    ///
    /// Before the first cycle completes this is an empty snapshot.
    pub fn latest_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Whether the liveness alarm was active in the latest snapshot.
    pub fn alarm_active(&self) -> bool {
        self.snapshot_rx.borrow().alarm
    }

    /// Agent description read at start-up, if the read succeeded.
    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system_info.as_deref()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_rx.clone()
    }

    /// Non-blocking pull source over published snapshots.
    pub fn source(&self) -> WatchSource {
        WatchSource::new(self.subscribe(), &self.description)
    }

    /// Bounded per-metric history.
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    /// Stop polling and wait for the in-flight cycle, if any, to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "poller task failed");
        }
    }
}
