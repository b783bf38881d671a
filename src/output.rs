//! Output backends for published snapshots.

use std::path::PathBuf;

use snmpwatch_types::Snapshot;
use tracing::info;

use crate::registry::names;

/// Destination for published snapshots.
#[derive(Debug, Clone)]
pub enum Output {
    /// Write snapshots to a JSON file.
    ///
    /// The file is overwritten with each snapshot.
    File(PathBuf),

    /// Log a one-line summary of each snapshot.
    Log,
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use snmpwatch::Output;
    ///
    /// let output = Output::file("snapshot.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Emit a snapshot to this output.
    pub async fn emit(&self, snapshot: &Snapshot) -> std::io::Result<()> {
        match self {
            Output::File(path) => {
                let json = serde_json::to_string_pretty(snapshot)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Log => {
                info!(alarm = snapshot.alarm, "{}", summary(snapshot));
            }
        }
        Ok(())
    }
}

const SUMMARY_METRICS: &[&str] = &[
    names::THROUGHPUT,
    names::LINK_UTILIZATION,
    names::ERROR_RATIO,
    names::IP_ERROR_RATIO,
    names::FORWARDING_RATE,
];

/// One-line rendering of the derived metrics in a snapshot.
pub fn summary(snapshot: &Snapshot) -> String {
    SUMMARY_METRICS
        .iter()
        .map(|name| match snapshot.get(name) {
            Some(value) => format!("{}={}", name, value),
            None => format!("{}=-", name),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmpwatch_types::MetricValue;

    fn sample() -> Snapshot {
        Snapshot::builder()
            .timestamp_ms(1_700_000_000_000)
            .value(names::THROUGHPUT, MetricValue::Rate(1000.0))
            .value(names::LINK_UTILIZATION, MetricValue::Suspended)
            .value(names::ERROR_RATIO, MetricValue::Ratio(0.005))
            .value(names::FORWARDING_RATE, MetricValue::Absent)
            .build()
    }

    #[test]
    fn summary_lists_derived_metrics() {
        assert_eq!(
            summary(&sample()),
            "throughput=1000.00/s linkUtilization=suspended errorRatio=0.0050 \
             ipErrorRatio=- forwardingRate=absent"
        );
    }

    #[tokio::test]
    async fn file_output_overwrites_with_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "stale").unwrap();

        Output::file(&path).emit(&sample()).await.unwrap();

        let written: Snapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample());
    }

    #[tokio::test]
    async fn log_output_never_fails() {
        assert!(Output::Log.emit(&Snapshot::default()).await.is_ok());
    }
}
