//! Layered configuration.
//!
//! Settings are resolved from, in increasing priority: built-in defaults, an
//! optional TOML file, `SNMPWATCH_*` environment variables (nested keys
//! separated by `__`, e.g. `SNMPWATCH_AGENT__HOST`) and command-line overrides.
//!
//! ```toml
//! [agent]
//! host = "192.0.2.1"
//! community = "monitoring"
//! timeout = "1500ms"
//!
//! [poll]
//! interval = "10s"
//! interface_refresh = "adopt"
//!
//! [output]
//! snapshot_file = "/var/lib/snmpwatch/latest.json"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use snmpwatch_adapters::Transport;
use snmpwatch_types::TimeTicks;

use crate::data::duration::parse_duration;
use crate::poller::{InterfaceRefresh, PollerBuilder};

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "SNMPWATCH";

/// Fully resolved configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub agent: AgentSettings,
    pub poll: PollSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Where the agent is and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub host: String,
    pub port: u16,
    pub community: String,
    /// Per-request timeout, e.g. "2s".
    pub timeout: String,
}

/// Poll loop tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    /// Time between cycles, e.g. "5s".
    pub interval: String,
    pub liveness_check_every: u32,
    /// Uptime, in hundredths of a second, below which the agent counts as restarted.
    pub uptime_floor: u32,
    pub max_repetitions: u32,
    pub history_len: usize,
    pub interface_refresh: InterfaceRefresh,
}

/// Where snapshots go besides the log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSettings {
    pub snapshot_file: Option<PathBuf>,
}

/// Values given on the command line, applied over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub community: Option<String>,
    pub interval: Option<String>,
    pub snapshot_file: Option<PathBuf>,
}

impl Settings {
    /// Load and validate settings.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_prefix(path, overrides, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, overrides: &Overrides, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("agent.host", "localhost")?
            .set_default("agent.port", 161)?
            .set_default("agent.community", "public")?
            .set_default("agent.timeout", "2s")?
            .set_default("poll.interval", "5s")?
            .set_default("poll.liveness_check_every", 6)?
            .set_default("poll.uptime_floor", 60)?
            .set_default("poll.max_repetitions", 25)?
            .set_default("poll.history_len", 20)?
            .set_default("poll.interface_refresh", "never")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("agent.host", overrides.host.clone())?
            .set_override_option("agent.port", overrides.port.map(i64::from))?
            .set_override_option("agent.community", overrides.community.clone())?
            .set_override_option("poll.interval", overrides.interval.clone())?
            .set_override_option(
                "output.snapshot_file",
                overrides
                    .snapshot_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.agent.host.trim().is_empty() {
            bail!("agent.host must not be empty");
        }
        if self.interval()?.is_zero() {
            bail!("poll.interval must be greater than zero");
        }
        if self.timeout()?.is_zero() {
            bail!("agent.timeout must be greater than zero");
        }
        if self.poll.liveness_check_every == 0 {
            bail!("poll.liveness_check_every must be at least 1");
        }
        if self.poll.max_repetitions == 0 {
            bail!("poll.max_repetitions must be at least 1");
        }
        if self.poll.history_len == 0 {
            bail!("poll.history_len must be at least 1");
        }
        Ok(())
    }

    /// Poll interval.
    pub fn interval(&self) -> Result<Duration> {
        parse_duration(&self.poll.interval).context("poll.interval")
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.agent.timeout).context("agent.timeout")
    }

    /// A poller builder configured from these settings.
    pub fn poller(&self, transport: Arc<dyn Transport>) -> Result<PollerBuilder> {
        Ok(PollerBuilder::new(transport)
            .interval(self.interval()?)
            .liveness_check_every(self.poll.liveness_check_every)
            .uptime_floor(TimeTicks(self.poll.uptime_floor))
            .max_repetitions(self.poll.max_repetitions)
            .history_len(self.poll.history_len)
            .interface_refresh(self.poll.interface_refresh))
    }
}
