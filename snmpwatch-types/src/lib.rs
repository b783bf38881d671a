//! # snmpwatch-types
//!
//! Core types shared by every layer of snmpwatch. This crate defines the
//! vocabulary used between the transport adapters, the polling core and any
//! presentation layer that consumes metric snapshots.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to ship snapshots as JSON
//! - **Immutable snapshots**: A [`Snapshot`] is built once per poll cycle and never mutated
//! - **Explicit gaps**: Failed queries and not-yet-computable rates are distinct
//!   [`MetricValue`] states, never a silent zero
//! - **Versioned schema**: Snapshots include version info for forward compatibility
//!
//! ## Features
//!
//! - `serde`: JSON/MessagePack/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use snmpwatch_types::{MetricValue, ObjectIdentifier, Snapshot};
//!
//! let oid: ObjectIdentifier = "1.3.6.1.2.1.2.2.1.10".parse().unwrap();
//! assert_eq!(oid.child(3).to_string(), "1.3.6.1.2.1.2.2.1.10.3");
//!
//! let snapshot = Snapshot::builder()
//!     .timestamp_ms(1703160000000)
//!     .value("ifInOctets", MetricValue::Integer(1500))
//!     .value("throughput", MetricValue::Suspended)
//!     .alarm(false)
//!     .build();
//!
//! assert_eq!(snapshot.len(), 2);
//! assert!(snapshot.get("throughput").unwrap().is_suspended());
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. The version is included in serialized
//! snapshots to allow consumers to handle format evolution gracefully.

mod metric;
mod oid;
mod snapshot;
mod system;
mod ticks;
mod value;
mod version;

pub use metric::*;
pub use oid::*;
pub use snapshot::*;
pub use system::*;
pub use ticks::*;
pub use value::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the snapshot format.
/// Consumers should check this version and handle older formats appropriately.
pub const SCHEMA_VERSION: u32 = 1;
