//! Reverse-lookup cache.
//!
//! # Responsibilities
//! - Key resolved [`UrlCreator`]s by controller, action, method and parameters
//! - Decorate each creator with a memo of the URLs it has produced
//!
//! # Data Flow
//! ```text
//! reverse_mapping(c, a, m, params)
//!     → ReverseMappingKey (before mappingName is stripped)
//!     → hit:  CachingUrlCreator
//!     → miss: ReverseIndex → CachingUrlCreator::new(creator) → insert
//! ```
//!
//! # Design Decisions
//! - The parameterless `create_url` shape is never memoized
//! - Errors are never memoized
//! - The memo is capped per creator; once full, new URLs are computed but not kept

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use http::Method;

use crate::cache::bounded::{BoundedCache, Weighted};
use crate::routing::context::RequestContext;
use crate::routing::creator::UrlCreator;
use crate::routing::error::UrlMappingResult;
use crate::routing::params::ParamMap;

const MEMO_LIMIT: usize = 256;

/// Identity of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReverseMappingKey {
    controller: Option<String>,
    action: Option<String>,
    method: Option<Method>,
    params: Vec<(String, String)>,
}

impl ReverseMappingKey {
    pub fn new(
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        params: &ParamMap,
    ) -> Self {
        Self {
            controller: controller.map(str::to_string),
            action: action.map(str::to_string),
            method: method.cloned(),
            params: params.iter().map(|(k, v)| (k.clone(), v.joined())).collect(),
        }
    }

    /// Sum of the lengths of every string in the key.
    pub fn weight(&self) -> usize {
        self.controller.as_ref().map_or(0, String::len)
            + self.action.as_ref().map_or(0, String::len)
            + self.params.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shape {
    Relative,
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    controller: Option<String>,
    action: Option<String>,
    params: Vec<(String, String)>,
    encoding: Option<String>,
    fragment: Option<String>,
    context_path: String,
    request_encoding: Option<String>,
    request_controller: Option<String>,
    shape: Shape,
}

impl MemoKey {
    fn new(
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
        shape: Shape,
    ) -> Self {
        Self {
            controller: controller.map(str::to_string),
            action: action.map(str::to_string),
            params: params
                .iter()
                .map(|(k, v)| (k.clone(), format!("{:?}", v)))
                .collect(),
            encoding: encoding.map(str::to_lowercase),
            fragment: fragment.map(str::to_string),
            context_path: ctx.context_path.clone(),
            request_encoding: ctx.character_encoding.as_deref().map(str::to_lowercase),
            request_controller: ctx.controller_name.clone(),
            shape,
        }
    }
}

/// A [`UrlCreator`] that remembers the URLs it has produced.
pub struct CachingUrlCreator {
    inner: Arc<dyn UrlCreator>,
    memo: DashMap<MemoKey, String>,
    weight: usize,
}

impl CachingUrlCreator {
    pub fn new(inner: Arc<dyn UrlCreator>, key: &ReverseMappingKey) -> Self {
        Self {
            inner,
            memo: DashMap::new(),
            weight: key.weight() * 2,
        }
    }

    /// Number of memoized URLs.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    fn memoize(
        &self,
        key: MemoKey,
        build: impl FnOnce() -> UrlMappingResult<String>,
    ) -> UrlMappingResult<String> {
        if let Some(url) = self.memo.get(&key) {
            return Ok(url.clone());
        }
        let url = build()?;
        if self.memo.len() < MEMO_LIMIT {
            self.memo.insert(key, url.clone());
        }
        Ok(url)
    }
}

impl Weighted for CachingUrlCreator {
    fn weight(&self) -> usize {
        self.weight + 1
    }
}

impl fmt::Debug for CachingUrlCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingUrlCreator")
            .field("inner", &self.inner)
            .field("memoized", &self.memo.len())
            .field("weight", &self.weight)
            .finish()
    }
}

impl UrlCreator for CachingUrlCreator {
    fn create_url(
        &self,
        ctx: &RequestContext,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        self.inner.create_url(ctx, params, encoding, fragment)
    }

    fn create_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        let key = MemoKey::new(ctx, controller, action, params, encoding, fragment, Shape::Absolute);
        self.memoize(key, || {
            self.inner
                .create_url_for(ctx, controller, action, params, encoding, fragment)
        })
    }

    fn create_relative_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        let key = MemoKey::new(ctx, controller, action, params, encoding, fragment, Shape::Relative);
        self.memoize(key, || {
            self.inner
                .create_relative_url_for(ctx, controller, action, params, encoding, fragment)
        })
    }
}

/// Weight-bounded cache of decorated creators.
#[derive(Debug)]
pub struct UrlCreatorCache {
    inner: BoundedCache<ReverseMappingKey, CachingUrlCreator>,
}

impl UrlCreatorCache {
    pub fn new(max_weight: usize) -> Self {
        Self {
            inner: BoundedCache::new("url_creator", max_weight),
        }
    }

    pub fn lookup(&self, key: &ReverseMappingKey) -> Option<Arc<CachingUrlCreator>> {
        self.inner.get(key)
    }

    /// Wraps `creator` and stores it under `key`.
    pub fn put_and_decorate(
        &self,
        key: ReverseMappingKey,
        creator: Arc<dyn UrlCreator>,
    ) -> Arc<CachingUrlCreator> {
        let decorated = CachingUrlCreator::new(creator, &key);
        self.inner.insert(key, decorated)
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn weighted_size(&self) -> usize {
        self.inner.weighted_size()
    }
}
