//! # snmpwatch-adapters
//!
//! Transport adapters for querying management agents.
//!
//! The polling core never speaks the wire protocol itself. It talks to a
//! [`Transport`]: an opaque capability that performs single-value get,
//! multi-identifier bulk get and subtree walk, and may fail with a typed
//! [`TransportError`].
//!
//! ## Supported Transports
//!
//! - **SNMPv2c over UDP** (`snmp` feature) - community-authenticated queries
//!   against a real agent, backed by the `snmp` crate
//! - **Mock agent** (`mock` feature) - a scripted in-memory agent for tests
//!   and offline demos
//!
//! ## Quick Start (SNMP)
//!
//! ```rust,no_run
//! # #[cfg(feature = "snmp")]
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use snmpwatch_adapters::snmp::SnmpAdapter;
//! use snmpwatch_adapters::Transport;
//! use std::time::Duration;
//!
//! let adapter = SnmpAdapter::builder()
//!     .host("localhost")
//!     .port(161)
//!     .community("public")
//!     .timeout(Duration::from_secs(2))
//!     .build()?;
//!
//! let uptime = adapter.get(&"1.3.6.1.2.1.1.3.0".parse()?).await?;
//! println!("uptime: {:?}", uptime);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod transport;

#[cfg(feature = "snmp")]
pub mod snmp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::TransportError;
pub use transport::Transport;

// Re-export types for convenience
pub use snmpwatch_types::{ObjectIdentifier, RawValue, TimeTicks};
