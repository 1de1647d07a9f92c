//! Reverse index: (controller, action, method, parameter names) → mapping.
//!
//! # Data Flow
//! ```text
//! Build (once, sorted path mappings):
//!     for each entry
//!         → key with required params (up to the first nullable slot)
//!         → one more key per following slot, accumulating names
//!         → list key (controller, action, method) → keys by param count
//!
//! Resolve:
//!     mappingName → named mapping
//!     → list lookup (most params first, subset of supplied names)
//!     → exact keys with default controller/action names
//!     → None (caller falls back to a default creator)
//! ```
//!
//! # Design Decisions
//! - Controller and action only enter a key when they are literals;
//!   runtime `$controller`/`$action` appear as parameter names instead
//! - For identical keys the later-indexed (less specific) entry wins
//! - Key expansion stops at the first nullable slot: a required slot after
//!   it is indexed as if it were optional

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use http::Method;

use crate::routing::entry::{MappingEntry, ACTION, CONTROLLER};
use crate::routing::params::ParamMap;

/// Parameter naming a mapping directly.
pub const MAPPING_NAME: &str = "mappingName";

const INDEX_ACTION: &str = "index";

/// Exact lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReverseKey {
    pub controller: Option<String>,
    pub action: Option<String>,
    pub method: Option<Method>,
    pub params: BTreeSet<String>,
}

impl ReverseKey {
    fn new(
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        params: BTreeSet<String>,
    ) -> Self {
        Self {
            controller: controller.map(str::to_string),
            action: action.map(str::to_string),
            method: method.cloned(),
            params,
        }
    }

    fn list_key(&self) -> ListKey {
        ListKey {
            controller: self.controller.clone(),
            action: self.action.clone(),
            method: self.method.clone(),
        }
    }
}

/// Groups every key sharing a controller, action and method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub controller: Option<String>,
    pub action: Option<String>,
    pub method: Option<Method>,
}

/// Treats `*` as "any method".
pub fn normalize_method(method: Option<&Method>) -> Option<Method> {
    method.filter(|m| m.as_str() != "*").cloned()
}

/// Immutable reverse lookup tables.
#[derive(Debug, Default)]
pub struct ReverseIndex {
    lookup: HashMap<ReverseKey, Arc<MappingEntry>>,
    lists: HashMap<ListKey, Vec<ReverseKey>>,
    named: HashMap<String, Arc<MappingEntry>>,
}

impl ReverseIndex {
    /// Indexes path mappings, which must already be in precedence order.
    pub fn build(entries: &[Arc<MappingEntry>]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            if let Some(name) = entry.name() {
                index.named.insert(name.to_string(), Arc::clone(entry));
            }

            let controller = entry.controller_literal();
            let action = entry.action_literal();
            let method = normalize_method(entry.http_method());

            let constraints = entry.constraints();
            let optional_from = constraints.iter().position(|c| c.nullable);
            let mut names: BTreeSet<String> = constraints[..optional_from.unwrap_or(constraints.len())]
                .iter()
                .map(|c| c.name.clone())
                .collect();
            index.put(ReverseKey::new(controller, action, method.as_ref(), names.clone()), entry);

            if let Some(start) = optional_from {
                for constraint in &constraints[start..] {
                    names.insert(constraint.name.clone());
                    index.put(ReverseKey::new(controller, action, method.as_ref(), names.clone()), entry);
                }
            }
        }

        for keys in index.lists.values_mut() {
            keys.sort_by_key(|k| k.params.len());
        }
        index
    }

    fn put(&mut self, key: ReverseKey, entry: &Arc<MappingEntry>) {
        tracing::debug!(
            controller = ?key.controller,
            action = ?key.action,
            method = ?key.method,
            params = ?key.params,
            mapping = %entry,
            "Reverse mapping"
        );
        let keys = self.lists.entry(key.list_key()).or_default();
        if !keys.contains(&key) {
            keys.push(key.clone());
        }
        self.lookup.insert(key, Arc::clone(entry));
    }

    /// Number of distinct exact keys.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn named(&self, name: &str) -> Option<&Arc<MappingEntry>> {
        self.named.get(name)
    }

    /// Finds the mapping that reproduces the given names.
    ///
    /// Removes `mappingName` from `params` whatever the outcome.
    pub fn resolve(
        &self,
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        params: &mut ParamMap,
    ) -> Option<Arc<MappingEntry>> {
        let method = normalize_method(method);
        let named = params
            .remove(MAPPING_NAME)
            .and_then(|v| v.first().map(str::to_string))
            .and_then(|name| self.named.get(&name).cloned());
        if named.is_some() {
            return named;
        }

        let names: BTreeSet<String> = params.keys().cloned().collect();
        let method = method.as_ref();

        self.lookup_mapping(controller, action, method, &names)
            .or_else(|| self.probe(controller, action, method, BTreeSet::new()))
            .or_else(|| self.probe_with_defaults(controller, None, method, &[ACTION], &names))
            .or_else(|| self.probe_with_defaults(None, action, method, &[CONTROLLER], &names))
            .or_else(|| {
                self.probe_with_defaults(None, None, method, &[CONTROLLER, ACTION], &names)
            })
            .or_else(|| self.probe(controller, None, method, BTreeSet::new()))
    }

    /// Scans the key list for (controller, action, method), most parameters
    /// first, returning the first key whose names are all supplied.
    fn lookup_mapping(
        &self,
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        names: &BTreeSet<String>,
    ) -> Option<Arc<MappingEntry>> {
        let mut list_key = ListKey {
            controller: controller.map(str::to_string),
            action: action.map(str::to_string),
            method: method.cloned(),
        };
        let mut keys = self.lists.get(&list_key);
        if keys.is_none() && list_key.method.is_some() {
            list_key.method = None;
            keys = self.lists.get(&list_key);
        }
        let mut second_attempt = false;
        if keys.is_none() && action.is_some() {
            list_key.action = None;
            keys = self.lists.get(&list_key);
            second_attempt = true;
        }
        let keys = keys?;

        let mut lookup: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if second_attempt {
            lookup.insert(ACTION);
        }
        let index_action = action == Some(INDEX_ACTION);

        for key in keys.iter().rev() {
            if !key.params.iter().all(|p| lookup.contains(p.as_str())) {
                continue;
            }
            let Some(entry) = self.lookup.get(key) else {
                continue;
            };
            if !second_attempt || index_action || entry.has_runtime_variable(ACTION) {
                return Some(Arc::clone(entry));
            }
        }
        None
    }

    /// Exact lookup, retried with "any method".
    fn probe(
        &self,
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        params: BTreeSet<String>,
    ) -> Option<Arc<MappingEntry>> {
        let mut key = ReverseKey::new(controller, action, method, params);
        if let Some(found) = self.lookup.get(&key) {
            return Some(Arc::clone(found));
        }
        if key.method.is_some() {
            key.method = None;
            return self.lookup.get(&key).cloned();
        }
        None
    }

    /// Tries `defaults ∪ names`, then `defaults` alone.
    fn probe_with_defaults(
        &self,
        controller: Option<&str>,
        action: Option<&str>,
        method: Option<&Method>,
        defaults: &[&str],
        names: &BTreeSet<String>,
    ) -> Option<Arc<MappingEntry>> {
        let defaults: BTreeSet<String> = defaults.iter().map(|d| d.to_string()).collect();
        let with_names: BTreeSet<String> = defaults.union(names).cloned().collect();
        self.probe(controller, action, method, with_names)
            .or_else(|| self.probe(controller, action, method, defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::routing::constraint::ConstrainedProperty;

    fn index(entries: Vec<MappingEntry>) -> ReverseIndex {
        let entries: Vec<Arc<MappingEntry>> = entries
            .into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                e.index = i;
                Arc::new(e)
            })
            .collect();
        ReverseIndex::build(&entries)
    }

    fn pattern_of(found: Option<Arc<MappingEntry>>) -> Option<String> {
        found.map(|e| e.pattern().to_string())
    }

    #[test]
    fn test_optional_keys_accumulate() {
        let idx = index(vec![MappingEntry::builder("/books/$a/$b?/$c?")
            .controller("book")
            .action("show")
            .build()
            .unwrap()]);
        // {a}, {a,b}, {a,b,c}
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn test_required_and_optional_subsets() {
        let idx = index(vec![MappingEntry::builder("/books/$a/$b?")
            .controller("book")
            .action("show")
            .build()
            .unwrap()]);
        let mut with_a = params! { "a" => "1" };
        let mut with_ab = params! { "a" => "1", "b" => "2" };
        let mut with_b = params! { "b" => "2" };
        assert!(idx.resolve(Some("book"), Some("show"), None, &mut with_a).is_some());
        assert!(idx.resolve(Some("book"), Some("show"), None, &mut with_ab).is_some());
        assert!(idx.resolve(Some("book"), Some("show"), None, &mut with_b).is_none());
    }

    #[test]
    fn test_named_lookup_removes_name() {
        let idx = index(vec![
            MappingEntry::builder("/special").controller("book").action("list").name("special").build().unwrap(),
            MappingEntry::builder("/books").controller("book").action("list").build().unwrap(),
        ]);
        let mut p = params! { "mappingName" => "special" };
        assert_eq!(pattern_of(idx.resolve(None, None, None, &mut p)).as_deref(), Some("/special"));
        assert!(p.is_empty());

        let mut p = params! { "mappingName" => "missing" };
        assert_eq!(pattern_of(idx.resolve(Some("book"), Some("list"), None, &mut p)).as_deref(), Some("/books"));
        assert!(p.is_empty());
    }

    #[test]
    fn test_runtime_controller_and_action_fallback() {
        let idx = index(vec![MappingEntry::builder("/$controller/$action?/$id?").build().unwrap()]);
        let mut p = ParamMap::new();
        assert_eq!(
            pattern_of(idx.resolve(Some("book"), Some("list"), None, &mut p)).as_deref(),
            Some("/$controller/$action?/$id?")
        );
    }

    #[test]
    fn test_second_attempt_requires_action_variable() {
        let idx = index(vec![MappingEntry::builder("/books/$id")
            .controller("book")
            .build()
            .unwrap()]);
        let mut p = params! { "id" => "1" };
        // no (book, edit) list; (book, -) list has no $action variable
        assert!(idx.lookup_mapping(Some("book"), Some("edit"), None, &names(&p)).is_none());
        // an index action can be inferred
        assert!(idx.lookup_mapping(Some("book"), Some("index"), None, &names(&p)).is_some());
        // no exact key covers (book, edit) either
        assert!(idx.resolve(Some("book"), Some("edit"), None, &mut p).is_none());
    }

    fn names(p: &ParamMap) -> BTreeSet<String> {
        p.keys().cloned().collect()
    }

    #[test]
    fn test_method_specific_then_any() {
        let idx = index(vec![
            MappingEntry::builder("/books").controller("book").action("save").method(Method::POST).build().unwrap(),
            MappingEntry::builder("/books/save").controller("book").action("save").build().unwrap(),
        ]);
        let mut p = ParamMap::new();
        assert_eq!(
            pattern_of(idx.resolve(Some("book"), Some("save"), Some(&Method::POST), &mut p)).as_deref(),
            Some("/books")
        );
        assert_eq!(
            pattern_of(idx.resolve(Some("book"), Some("save"), Some(&Method::GET), &mut p)).as_deref(),
            Some("/books/save")
        );
        assert_eq!(
            pattern_of(idx.resolve(Some("book"), Some("save"), None, &mut p)).as_deref(),
            Some("/books/save")
        );
    }

    #[test]
    fn test_explicit_nullable_stops_expansion() {
        let idx = index(vec![MappingEntry::builder("/x/$a/$b")
            .controller("c")
            .action("a")
            .constraint(ConstrainedProperty::new("a", true))
            .build()
            .unwrap()]);
        // {}, {a}, {a,b}
        assert_eq!(idx.len(), 3);
        let mut p = ParamMap::new();
        assert!(idx.resolve(Some("c"), Some("a"), None, &mut p).is_some());
    }

    #[test]
    fn test_most_parameters_first() {
        let idx = index(vec![
            MappingEntry::builder("/books/$id/$slug").controller("book").action("show").build().unwrap(),
            MappingEntry::builder("/books/$id").controller("book").action("show").build().unwrap(),
        ]);
        let mut p = params! { "id" => 1, "slug" => "dune" };
        assert_eq!(pattern_of(idx.resolve(Some("book"), Some("show"), None, &mut p)).as_deref(), Some("/books/$id/$slug"));
        let mut p = params! { "id" => 1 };
        assert_eq!(pattern_of(idx.resolve(Some("book"), Some("show"), None, &mut p)).as_deref(), Some("/books/$id"));
    }
}
