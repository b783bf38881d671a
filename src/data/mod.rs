//! Cross-cycle state and the arithmetic applied to raw readings.
//!
//! ## Submodules
//!
//! - [`rate`]: Counter-rate engine ([`RateEngine`]) keeping one baseline per counter
//! - [`derived`]: Point-in-time ratios (error ratio, link utilization, IP error ratio)
//! - [`history`]: Bounded per-metric series for charting ([`History`])
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! raw readings (one cycle)
//!        │
//!        ├──▶ RateEngine::rate()        (throughput, forwardingRate)
//!        ├──▶ derived::*                (errorRatio, ipErrorRatio, linkUtilization)
//!        ▼
//!     Snapshot ──▶ History::record()    (charts)
//! ```

pub mod derived;
pub mod duration;
pub mod history;
pub mod rate;

pub use history::{History, Point, SharedHistory};
pub use rate::{Rate, RateEngine, RateState};
