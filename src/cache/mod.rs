//! Lookup caches.
//!
//! # Data Flow
//! ```text
//! match_path(uri)          → BoundedCache<String, MappingInfo>
//! match_all(uri, method)   → BoundedCache<(String, Option<Method>), Vec<Arc<MappingInfo>>>
//! reverse_mapping(c, a, …) → UrlCreatorCache
//! ```
//!
//! # Design Decisions
//! - All caches belong to one holder and die with it on reload
//! - A forward hit costs 1; a list costs its length plus one

pub mod bounded;
pub mod url_creator;

use std::sync::Arc;

pub use bounded::{BoundedCache, Weighted};
pub use url_creator::{CachingUrlCreator, ReverseMappingKey, UrlCreatorCache};

use crate::routing::info::MappingInfo;

impl Weighted for MappingInfo {
    fn weight(&self) -> usize {
        1
    }
}

impl Weighted for Vec<Arc<MappingInfo>> {
    fn weight(&self) -> usize {
        self.len() + 1
    }
}
