//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Build holder → MappingsRegistry
//!
//! Reload (reload.rs):
//!     ConfigWatcher (compiled holder) → mpsc → run_reload_loop → registry.install → ArcSwap
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown_signal resolves → reload loop exits
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then holder, then watcher
//! - The registry outlives every holder it publishes

pub mod reload;
pub mod signals;

pub use reload::{run_reload_loop, MappingsRegistry};
