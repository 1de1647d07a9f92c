//! Precedence ordering of path mappings.
//!
//! # Ordering (most specific first)
//! 1. The root mapping `/`
//! 2. Mappings with at least one literal token
//! 3. Position by position, a literal beats a variable or wildcard
//!    (a missing position counts as a wildcard)
//! 4. Fewer `**` tokens
//! 5. Fewer wildcard tokens overall (`*`, `**`, variables)
//! 6. More constraint rules
//! 7. More tokens
//! 8. Later declaration
//!
//! The comparison is a total order, so sorting is deterministic for any
//! mapping list.

use std::cmp::Ordering;

use crate::routing::entry::MappingEntry;

/// Comparable precedence key for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specificity {
    root: bool,
    has_literal: bool,
    concrete: Vec<bool>,
    double_wildcards: usize,
    wildcards: usize,
    rules: usize,
    tokens: usize,
    index: usize,
}

impl Specificity {
    pub fn of(entry: &MappingEntry) -> Self {
        let pattern = entry.pattern();
        let concrete: Vec<bool> = pattern.tokens().iter().map(|t| t.is_literal()).collect();
        let literals = concrete.iter().filter(|c| **c).count();
        Self {
            root: pattern.is_root(),
            has_literal: literals > 0,
            wildcards: concrete.len() - literals,
            concrete,
            double_wildcards: pattern.double_wildcard_count(),
            rules: entry.rule_count(),
            tokens: pattern.tokens().len(),
            index: entry.index(),
        }
    }

    fn compare_positions(&self, other: &Self) -> Ordering {
        let len = self.concrete.len().max(other.concrete.len());
        (0..len)
            .map(|i| {
                let mine = self.concrete.get(i).copied().unwrap_or(false);
                let theirs = other.concrete.get(i).copied().unwrap_or(false);
                mine.cmp(&theirs)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl Ord for Specificity {
    /// `Greater` means higher precedence.
    fn cmp(&self, other: &Self) -> Ordering {
        self.root
            .cmp(&other.root)
            .then(self.has_literal.cmp(&other.has_literal))
            .then_with(|| self.compare_positions(other))
            .then(other.double_wildcards.cmp(&self.double_wildcards))
            .then(other.wildcards.cmp(&self.wildcards))
            .then(self.rules.cmp(&other.rules))
            .then(self.tokens.cmp(&other.tokens))
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorts entries most specific first.
pub fn sort_by_specificity(entries: &mut [MappingEntry]) {
    entries.sort_by_cached_key(|e| std::cmp::Reverse(Specificity::of(e)));
}
