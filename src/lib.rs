//! URL mapping engine.
//!
//! Bidirectional routing table: request paths resolve to controller/action/view
//! targets, and controller/action/parameter combinations resolve back to paths.

// Core subsystems
pub mod cache;
pub mod config;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::MappingsConfig;
pub use lifecycle::MappingsRegistry;
pub use routing::holder::UrlMappingsHolder;
