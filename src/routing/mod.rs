//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound:
//!     request path
//!     → holder.rs (match cache)
//!     → matcher.rs (bind tokens to decoded segments)
//!     → entry.rs (constraints, static parameters)
//!     → info.rs (MappingInfo → configure(ctx))
//!
//! Outbound:
//!     controller + action + params
//!     → holder.rs (creator cache)
//!     → reverse.rs (named / exact / subset lookup)
//!     → creator.rs (path, query string, fragment)
//!
//! Table Compilation (at load):
//!     MappingEntry[] + StatusCodeMapping[]
//!     → partition
//!     → sort path mappings by specificity.rs
//!     → build ReverseIndex
//!     → freeze as immutable UrlMappingsHolder
//! ```
//!
//! # Design Decisions
//! - Mappings compiled at load, immutable at runtime
//! - Deterministic: same input always matches the same mapping
//! - First match wins (ordered by specificity, ties to later declarations)
//! - Request state is passed explicitly as [`RequestContext`]

pub mod constraint;
pub mod context;
pub mod creator;
pub mod encoding;
pub mod entry;
pub mod error;
pub mod exclude;
pub mod holder;
pub mod info;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod reverse;
pub mod specificity;
pub mod status;
pub mod target;

pub use constraint::{ConstrainedProperty, Rule};
pub use context::RequestContext;
pub use creator::{DefaultUrlCreator, UrlCreator};
pub use entry::{MappingEntry, MappingEntryBuilder};
pub use error::{UrlMappingError, UrlMappingResult};
pub use holder::UrlMappingsHolder;
pub use info::{MappingInfo, ResolvedMapping};
pub use params::{ParamMap, ParamValue};
pub use pattern::UrlPattern;
pub use status::{StatusCodeMapping, ThrownError};
pub use target::{MappingTarget, MappingValue};
