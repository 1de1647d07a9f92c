//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Line format (`full`, `compact`, `pretty`) chosen by config
//! - Library code only emits events; installing a subscriber is the binary's job

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("url_mappings={}", config.log_level.to_ascii_lowercase()).into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        "pretty" => registry.with(fmt::layer().pretty()).try_init(),
        _ => registry.with(fmt::layer()).try_init(),
    }
}
