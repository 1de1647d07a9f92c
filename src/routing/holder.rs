//! The composed, immutable mapping table.
//!
//! # Responsibilities
//! - Partition and order declared mappings once, at construction
//! - Answer forward (`match_path`, `match_all`), status and reverse queries
//! - Front each query kind with its own bounded cache
//!
//! # Data Flow
//! ```text
//! construction:
//!     path entries   → assign declaration index → reject duplicate names
//!                    → sort by specificity → Arc → ReverseIndex
//!     status entries → declaration order reversed
//!
//! match_path(uri):   cache → scan entries → first match → cache
//! match_all(uri, m): excluded? → cache → scan entries (method filter) → cache
//! reverse_mapping:   creator cache → ReverseIndex → DefaultUrlCreator
//! ```
//!
//! # Design Decisions
//! - Never mutated after construction; a reload builds a new holder
//! - Path mappings and status mappings are separate sequences
//! - Misses are not cached by `match_path`; empty lists are cached by `match_all`

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::cache::{BoundedCache, ReverseMappingKey, UrlCreatorCache};
use crate::config::schema::{CacheConfig, MappingsConfig};
use crate::routing::creator::{DefaultUrlCreator, UrlCreator};
use crate::routing::entry::MappingEntry;
use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::exclude::ExcludeSet;
use crate::routing::info::MappingInfo;
use crate::routing::matcher::split_path;
use crate::routing::params::ParamMap;
use crate::routing::reverse::{ReverseIndex, MAPPING_NAME};
use crate::routing::specificity::sort_by_specificity;
use crate::routing::status::{match_status, match_status_for, StatusCodeMapping, ThrownError};

/// Methods reported for a path served by an unrestricted mapping.
pub const STANDARD_METHODS: [Method; 8] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
];

type ListKey = (String, Option<Method>);

/// Forward, status and reverse lookups over one mapping table.
pub struct UrlMappingsHolder {
    mappings: Vec<Arc<MappingEntry>>,
    status_mappings: Vec<StatusCodeMapping>,
    excludes: ExcludeSet,
    reverse: ReverseIndex,
    match_cache: BoundedCache<String, MappingInfo>,
    match_all_cache: BoundedCache<ListKey, Vec<Arc<MappingInfo>>>,
    creator_cache: UrlCreatorCache,
}

impl UrlMappingsHolder {
    pub fn new<S: AsRef<str>>(
        mut entries: Vec<MappingEntry>,
        mut status_mappings: Vec<StatusCodeMapping>,
        exclude_patterns: &[S],
        cache: &CacheConfig,
    ) -> UrlMappingResult<Self> {
        let mut names = HashSet::new();
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.index = index;
            if let Some(name) = entry.name() {
                if !names.insert(name.to_string()) {
                    return Err(UrlMappingError::DuplicateName(name.to_string()));
                }
            }
        }
        sort_by_specificity(&mut entries);

        for (index, mapping) in status_mappings.iter_mut().enumerate() {
            mapping.index = index;
        }
        status_mappings.reverse();

        let mappings: Vec<Arc<MappingEntry>> = entries.into_iter().map(Arc::new).collect();
        let reverse = ReverseIndex::build(&mappings);
        let excludes = ExcludeSet::new(exclude_patterns)?;

        tracing::info!(
            mappings = mappings.len(),
            status_mappings = status_mappings.len(),
            reverse_keys = reverse.len(),
            excludes = exclude_patterns.len(),
            "URL mappings built"
        );

        Ok(Self {
            mappings,
            status_mappings,
            excludes,
            reverse,
            match_cache: BoundedCache::new("match", cache.max_weighted_capacity),
            match_all_cache: BoundedCache::new("match_all", cache.max_weighted_capacity),
            creator_cache: UrlCreatorCache::new(cache.url_creator_max_weighted_capacity),
        })
    }

    /// Compiles every declared mapping in `config` and builds the holder.
    pub fn from_config(config: &MappingsConfig) -> UrlMappingResult<Self> {
        let (entries, status) = config.compile()?;
        Self::new(entries, status, &config.exclude_patterns, &config.cache)
    }

    /// First mapping matching `uri`, ignoring method restrictions.
    pub fn match_path(&self, uri: &str) -> Option<Arc<MappingInfo>> {
        if let Some(hit) = self.match_cache.get(uri) {
            return Some(hit);
        }
        let segments = split_path(uri);
        let info = self.mappings.iter().find_map(|entry| {
            tracing::trace!(uri, pattern = %entry.pattern(), "Attempting to match");
            entry.match_segments(&segments)
        })?;
        tracing::debug!(uri, pattern = info.pattern(), "Matched URI");
        Some(self.match_cache.insert(uri.to_string(), info))
    }

    /// Every mapping matching `uri` that accepts `method`, most specific first.
    pub fn match_all(&self, uri: &str, method: Option<&Method>) -> Arc<Vec<Arc<MappingInfo>>> {
        if self.excludes.is_excluded(uri) {
            tracing::debug!(uri, "URI excluded from mapping");
            return Arc::new(Vec::new());
        }
        let key = (uri.to_string(), method.cloned());
        if let Some(hit) = self.match_all_cache.get(&key) {
            return hit;
        }
        let segments = split_path(uri);
        let matches: Vec<Arc<MappingInfo>> = self
            .mappings
            .iter()
            .filter(|entry| entry.accepts_method(method))
            .filter_map(|entry| entry.match_segments(&segments))
            .map(Arc::new)
            .collect();
        tracing::debug!(uri, method = ?method, matches = matches.len(), "Matched all");
        self.match_all_cache.insert(key, matches)
    }

    /// Status mapping for `code` with no exception type declared.
    pub fn match_status_code(&self, code: u16) -> Option<MappingInfo> {
        match_status(&self.status_mappings, code)
    }

    /// Status mapping for `code`, preferring the closest declared error type.
    pub fn match_status_code_for(&self, code: u16, error: &ThrownError) -> Option<MappingInfo> {
        match_status_for(&self.status_mappings, code, error)
    }

    /// Methods accepted by some mapping for `uri`.
    pub fn allowed_methods(&self, uri: &str) -> BTreeSet<String> {
        let any = Method::from_bytes(b"*").ok();
        let mut methods = BTreeSet::new();
        for info in self.match_all(uri, any.as_ref()).iter() {
            match info.http_method() {
                Some(method) if method.as_str() != "*" => {
                    methods.insert(method.as_str().to_ascii_uppercase());
                }
                _ => {
                    methods.extend(STANDARD_METHODS.iter().map(|m| m.to_string()));
                    break;
                }
            }
        }
        methods
    }

    /// Creator for an outbound link; falls back to `/controller/action`.
    ///
    /// Removes `mappingName` from `params`.
    pub fn reverse_mapping(
        &self,
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        params: &mut ParamMap,
    ) -> Arc<dyn UrlCreator> {
        let key = ReverseMappingKey::new(controller, action, method, params);
        if let Some(hit) = self.creator_cache.lookup(&key) {
            params.remove(MAPPING_NAME);
            return hit;
        }
        let creator: Arc<dyn UrlCreator> = match self.reverse.resolve(controller, action, method, params) {
            Some(entry) => entry as Arc<dyn UrlCreator>,
            None => {
                tracing::debug!(?controller, ?action, "No reverse mapping, using default creator");
                Arc::new(DefaultUrlCreator::new(controller, action)) as Arc<dyn UrlCreator>
            }
        };
        self.creator_cache.put_and_decorate(key, creator)
    }

    /// Like [`UrlMappingsHolder::reverse_mapping`] without the default fallback.
    pub fn reverse_mapping_no_default(
        &self,
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        params: &mut ParamMap,
    ) -> Option<Arc<dyn UrlCreator>> {
        self.reverse
            .resolve(controller, action, method, params)
            .map(|entry| entry as Arc<dyn UrlCreator>)
    }

    /// Path mappings in precedence order.
    pub fn mappings(&self) -> &[Arc<MappingEntry>] {
        &self.mappings
    }

    /// Status mappings in lookup order.
    pub fn status_mappings(&self) -> &[StatusCodeMapping] {
        &self.status_mappings
    }

    pub fn exclude_patterns(&self) -> Vec<&str> {
        self.excludes.patterns().collect()
    }

    pub fn clear_caches(&self) {
        self.match_cache.clear();
        self.match_all_cache.clear();
        self.creator_cache.clear();
    }

    pub fn cache_sizes(&self) -> (usize, usize, usize) {
        (
            self.match_cache.weighted_size(),
            self.match_all_cache.weighted_size(),
            self.creator_cache.weighted_size(),
        )
    }
}

impl fmt::Debug for UrlMappingsHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlMappingsHolder")
            .field("mappings", &self.mappings.len())
            .field("status_mappings", &self.status_mappings.len())
            .field("excludes", &self.excludes)
            .finish()
    }
}

impl fmt::Display for UrlMappingsHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URL Mappings")?;
        writeln!(f, "------------")?;
        for entry in &self.mappings {
            writeln!(f, "{}", entry)?;
        }
        for mapping in &self.status_mappings {
            writeln!(f, "{}", mapping)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::routing::context::RequestContext;
    use crate::routing::target::{MappingTarget, MappingValue};

    fn holder(entries: Vec<MappingEntry>) -> UrlMappingsHolder {
        UrlMappingsHolder::new(entries, Vec::new(), &["/static/**"], &CacheConfig::default()).unwrap()
    }

    fn entry(pattern: &str, controller: &str, action: &str) -> MappingEntry {
        MappingEntry::builder(pattern)
            .controller(controller)
            .action(action)
            .build()
            .unwrap()
    }

    #[test]
    fn test_more_specific_wins_regardless_of_order() {
        let h = holder(vec![
            MappingEntry::builder("/$controller/$action?/$id?").build().unwrap(),
            entry("/books/list", "book", "list"),
        ]);
        let info = h.match_path("/books/list").unwrap();
        assert_eq!(info.pattern(), "/books/list");
    }

    #[test]
    fn test_match_is_cached_instance() {
        let h = holder(vec![entry("/books/$id", "book", "show")]);
        let first = h.match_path("/books/1").unwrap();
        let second = h.match_path("/books/1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(h.match_path("/authors/1").is_none());
    }

    #[test]
    fn test_match_all_filters_method_and_excludes() {
        let h = holder(vec![
            entry("/books/$id", "book", "show"),
            MappingEntry::builder("/books/$id")
                .controller("book")
                .action("update")
                .method(Method::PUT)
                .build()
                .unwrap(),
        ]);
        assert_eq!(h.match_all("/books/1", Some(&Method::GET)).len(), 1);
        assert_eq!(h.match_all("/books/1", Some(&Method::PUT)).len(), 2);
        assert_eq!(h.match_all("/books/1", None).len(), 1);
        assert!(h.match_all("/static/app.js", Some(&Method::GET)).is_empty());
    }

    #[test]
    fn test_allowed_methods() {
        let h = holder(vec![MappingEntry::builder("/books/$id")
            .controller("book")
            .action("update")
            .method(Method::PUT)
            .build()
            .unwrap()]);
        let methods = h.allowed_methods("/books/1");
        assert_eq!(methods.into_iter().collect::<Vec<_>>(), vec!["PUT".to_string()]);

        let h = holder(vec![entry("/books/$id", "book", "show")]);
        assert_eq!(h.allowed_methods("/books/1").len(), STANDARD_METHODS.len());
        assert!(h.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let a = MappingEntry::builder("/a").controller("a").name("same").build().unwrap();
        let b = MappingEntry::builder("/b").controller("b").name("same").build().unwrap();
        let result = UrlMappingsHolder::new(vec![a, b], Vec::new(), &[] as &[&str], &CacheConfig::default());
        assert!(matches!(result, Err(UrlMappingError::DuplicateName(_))));
    }

    #[test]
    fn test_reverse_mapping_and_fallback() {
        let h = holder(vec![entry("/books/$id", "book", "show")]);
        let ctx = RequestContext::default();

        let mut p = params! { "id" => 7 };
        let creator = h.reverse_mapping(Some("book"), Some("show"), None, &mut p);
        assert_eq!(creator.create_url_for(&ctx, Some("book"), Some("show"), &p, None, None).unwrap(), "/books/7");

        let mut p = ParamMap::new();
        assert!(h.reverse_mapping_no_default(Some("foo"), Some("bar"), None, &mut p).is_none());
        let creator = h.reverse_mapping(Some("foo"), Some("bar"), None, &mut p);
        assert_eq!(creator.create_url_for(&ctx, Some("foo"), Some("bar"), &p, None, None).unwrap(), "/foo/bar");
    }

    #[test]
    fn test_mapping_name_removed_even_on_cache_hit() {
        let h = holder(vec![MappingEntry::builder("/shelf/$id")
            .controller("shelf")
            .action("show")
            .name("shelfPage")
            .build()
            .unwrap()]);
        for _ in 0..2 {
            let mut p = params! { "mappingName" => "shelfPage", "id" => 3 };
            let creator = h.reverse_mapping(None, None, None, &mut p);
            assert!(!p.contains_key("mappingName"));
            let url = creator.create_url(&RequestContext::default(), &p, None, None).unwrap();
            assert_eq!(url, "/shelf/3");
        }
    }

    #[test]
    fn test_status_later_declaration_wins() {
        let status = vec![
            StatusCodeMapping::new(404, MappingTarget::View(MappingValue::literal("first"))),
            StatusCodeMapping::new(404, MappingTarget::View(MappingValue::literal("second"))),
        ];
        let h = UrlMappingsHolder::new(Vec::new(), status, &[] as &[&str], &CacheConfig::default()).unwrap();
        let info = h.match_status_code(404).unwrap();
        assert_eq!(info.target().view().and_then(|v| v.as_literal()), Some("second"));
    }

    #[test]
    fn test_clear_caches() {
        let h = holder(vec![entry("/books/$id", "book", "show")]);
        let first = h.match_path("/books/1").unwrap();
        h.clear_caches();
        assert_eq!(h.cache_sizes(), (0, 0, 0));
        let second = h.match_path("/books/1").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.parameters(), second.parameters());
    }

    #[test]
    fn test_display_lists_mappings() {
        let h = holder(vec![entry("/books/$id", "book", "show")]);
        assert!(h.to_string().contains("/books/$id"));
    }
}
