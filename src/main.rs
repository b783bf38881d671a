use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snmpwatch::data::duration::format_duration;
use snmpwatch::{Output, Overrides, Settings};
use snmpwatch_adapters::Transport;

#[derive(Parser, Debug)]
#[command(name = "snmpwatch")]
#[command(about = "Polls a network device over SNMP and derives windowed performance metrics")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agent host name or address
    #[arg(long)]
    host: Option<String>,

    /// Agent UDP port
    #[arg(short, long)]
    port: Option<u16>,

    /// SNMPv2c community string
    #[arg(long)]
    community: Option<String>,

    /// Poll interval (e.g., "5s", "500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Overwrite this file with the latest snapshot as JSON after every cycle
    #[arg(long)]
    snapshot_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            community: self.community.clone(),
            interval: self.interval.clone(),
            snapshot_file: self.snapshot_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snmpwatch=info")),
        )
        .init();

    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;
    let transport = connect(&settings)?;

    let poller = settings
        .poller(transport)?
        .build()
        .await
        .context("Cannot poll agent")?;

    match poller.system_info() {
        Some(system) => info!(
            name = %system.name,
            location = %system.location_or_default(),
            contact = %system.contact_or_default(),
            hardware = %system.hardware(),
            software = %system.software().unwrap_or("-"),
            uptime = %system.uptime.uptime(),
            interfaces = %system.interfaces.join(","),
            "agent"
        ),
        None => warn!("agent system information unavailable"),
    }
    info!(interval = %format_duration(settings.interval()?), "polling");

    let handle = poller.start();
    let mut outputs = vec![Output::Log];
    if let Some(path) = &settings.output.snapshot_file {
        outputs.push(Output::file(path));
    }

    let mut updates = handle.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                for output in &outputs {
                    if let Err(e) = output.emit(&snapshot).await {
                        warn!(output = ?output, error = %e, "failed to write snapshot");
                    }
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}

#[cfg(feature = "snmp")]
fn connect(settings: &Settings) -> Result<Arc<dyn Transport>> {
    use snmpwatch_adapters::snmp::SnmpAdapter;

    let adapter = SnmpAdapter::builder()
        .host(&settings.agent.host)
        .port(settings.agent.port)
        .community(&settings.agent.community)
        .timeout(settings.timeout()?)
        .build()
        .with_context(|| format!("Cannot reach {}:{}", settings.agent.host, settings.agent.port))?;
    Ok(Arc::new(adapter))
}

#[cfg(not(feature = "snmp"))]
fn connect(_settings: &Settings) -> Result<Arc<dyn Transport>> {
    anyhow::bail!("built without SNMP support; rebuild with the `snmp` feature")
}
