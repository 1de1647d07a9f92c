//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! mappings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every mapping compiled once)
//!     → MappingsConfig (validated, immutable)
//!     → UrlMappingsHolder::from_config
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → sent to lifecycle::reload
//!     → atomic swap of Arc<UrlMappingsHolder>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::CacheConfig;
pub use schema::MappingConfig;
pub use schema::MappingsConfig;
pub use schema::ObservabilityConfig;
