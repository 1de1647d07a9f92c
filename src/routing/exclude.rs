//! Ant-style exclusion patterns.
//!
//! `?` matches one character, `*` matches within a segment and `**` matches
//! across segments. A trailing `/**` also matches the bare prefix, so
//! `/static/**` excludes `/static` itself.

use regex::Regex;

use crate::routing::error::{UrlMappingError, UrlMappingResult};

/// A compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct ExcludePattern {
    raw: String,
    regex: Regex,
}

impl ExcludePattern {
    pub fn new(raw: &str) -> UrlMappingResult<Self> {
        let regex = Regex::new(&to_regex(raw)).map_err(|e| UrlMappingError::InvalidPattern {
            pattern: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

fn to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'*')
                && chars.get(i + 2) == Some(&'*')
                && i + 3 == chars.len() =>
            {
                out.push_str("(?:/.*)?");
                i += 3;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                i += 1;
            }
        }
    }
    out.push('$');
    out
}

/// The holder's exclusion list.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<ExcludePattern>,
}

impl ExcludeSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> UrlMappingResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| ExcludePattern::new(p.as_ref()))
            .collect::<UrlMappingResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(ExcludePattern::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
