//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: uri, pattern, controller, action)
//!     → metrics.rs (cache counters and gauges, reload outcomes)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → whatever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Per-match events are `trace`, index construction is `debug`
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
