//! Pull-side access to published snapshots.
//!
//! A presentation layer polls a [`SnapshotSource`] at its own cadence and only
//! gets a snapshot back when a newer one has been published since its last
//! poll.

use std::fmt::Debug;
use std::sync::Arc;

use snmpwatch_types::Snapshot;
use tokio::sync::watch;

/// Trait for receiving published snapshots without blocking.
pub trait SnapshotSource: Send + Debug {
    /// Poll for a snapshot newer than the last one returned.
    ///
    /// Returns `Some(snapshot)` if new data is available, `None` otherwise.
    fn poll(&mut self) -> Option<Arc<Snapshot>>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// Check if the source can no longer produce snapshots.
    fn error(&self) -> Option<&str>;
}

/// A source reading the latest snapshot from a watch channel.
///
/// Every poller publishes through one of these channels; the snapshot is
/// swapped in whole, so a consumer never sees a partially built one.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use snmpwatch::{SnapshotSource, WatchSource};
/// use snmpwatch_types::Snapshot;
///
/// let (tx, mut source) = WatchSource::create("snmp://192.0.2.1:161");
/// assert!(source.poll().is_some());
/// assert!(source.poll().is_none());
///
/// tx.send_replace(Arc::new(Snapshot::default()));
/// assert!(source.poll().is_some());
/// ```
#[derive(Debug)]
pub struct WatchSource {
    receiver: watch::Receiver<Arc<Snapshot>>,
    description: String,
    /// Track if we've returned the initial value yet
    initial_returned: bool,
    closed: bool,
}

impl WatchSource {
    /// Create a source over the receiving end of a snapshot channel.
    pub fn new(receiver: watch::Receiver<Arc<Snapshot>>, agent: &str) -> Self {
        Self {
            receiver,
            description: format!("poller: {}", agent),
            initial_returned: false,
            closed: false,
        }
    }

    /// Create a channel pair for publishing snapshots to a `WatchSource`.
    pub fn create(agent: &str) -> (watch::Sender<Arc<Snapshot>>, Self) {
        let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
        (tx, Self::new(rx, agent))
    }
}

impl SnapshotSource for WatchSource {
    fn poll(&mut self) -> Option<Arc<Snapshot>> {
        // Return the initial value on first poll
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        match self.receiver.has_changed() {
            Ok(true) => Some(self.receiver.borrow_and_update().clone()),
            Ok(false) => None,
            Err(_) => {
                // The last snapshot published before the sender went away is
                // still owed to this consumer.
                self.closed = true;
                let latest = self.receiver.borrow_and_update();
                latest.has_changed().then(|| Arc::clone(&latest))
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        if self.closed {
            Some("poller stopped")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmpwatch_types::MetricValue;

    #[test]
    fn test_watch_source_poll() {
        let (tx, mut source) = WatchSource::create("test");

        // Initially returns the default (empty) snapshot
        let snapshot = source.poll();
        assert!(snapshot.unwrap().is_empty());

        // No change, so poll returns None
        assert!(source.poll().is_none());

        let published = Arc::new(
            Snapshot::builder()
                .value("ifInOctets", MetricValue::Integer(3_000))
                .build(),
        );
        tx.send_replace(published.clone());

        // Consumers share the published snapshot rather than copies of it
        let snapshot = source.poll().unwrap();
        assert!(Arc::ptr_eq(&snapshot, &published));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_closed_source_reports_error() {
        let (tx, mut source) = WatchSource::create("test");
        source.poll();
        drop(tx);

        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("poller stopped"));
        assert_eq!(source.description(), "poller: test");
    }

    #[test]
    fn test_last_snapshot_survives_close() {
        let (tx, mut source) = WatchSource::create("test");
        source.poll();

        let last = Arc::new(
            Snapshot::builder()
                .value("ipForwDatagrams", MetricValue::Integer(500))
                .build(),
        );
        tx.send_replace(last.clone());
        drop(tx);

        let snapshot = source.poll().unwrap();
        assert!(Arc::ptr_eq(&snapshot, &last));
        assert_eq!(source.error(), Some("poller stopped"));
        assert!(source.poll().is_none());
    }
}
