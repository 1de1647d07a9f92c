//! Structural path matching.
//!
//! # Responsibilities
//! - Split a request path into decoded segments
//! - Bind pattern tokens to segments, backtracking over optional tokens
//! - Peel an optional `.ext` suffix off the final segment
//!
//! # Design Decisions
//! - Trailing slashes are ignored; `/books/` matches `/books`
//! - An empty segment never satisfies a variable or `*`
//! - Optional tokens prefer consuming a segment; `**` prefers the longest span
//! - Constraint checks happen after binding, in the entry

use std::fmt;

use crate::routing::encoding::decode_segment;
use crate::routing::params::{ParamMap, ParamValue};
use crate::routing::pattern::{Token, UrlPattern};

/// Trait for binding path segments against a compiled pattern.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns the bound variables if the segments match.
    fn bind(&self, segments: &[String]) -> Option<ParamMap>;
}

/// Splits a request path into percent-decoded segments.
///
/// `/` and the empty string yield no segments.
pub fn split_path(path: &str) -> Vec<String> {
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(decode_segment).collect()
}

impl Matcher for UrlPattern {
    fn bind(&self, segments: &[String]) -> Option<ParamMap> {
        if let Some(ext_name) = self.extension() {
            if let Some((base, ext)) = segments.last().and_then(|s| split_extension(s)) {
                let mut with_base = segments.to_vec();
                if let Some(last) = with_base.last_mut() {
                    *last = base;
                }
                let mut bound = ParamMap::new();
                if bind_tokens(self.tokens(), &with_base, &mut bound) {
                    bound.insert(ext_name.to_string(), ParamValue::Single(ext));
                    return Some(bound);
                }
            }
        }

        let mut bound = ParamMap::new();
        bind_tokens(self.tokens(), segments, &mut bound).then_some(bound)
    }
}

/// Splits `name.ext` at the last dot; both sides must be non-empty.
fn split_extension(segment: &str) -> Option<(String, String)> {
    let dot = segment.rfind('.')?;
    let (base, ext) = (&segment[..dot], &segment[dot + 1..]);
    if base.is_empty() || ext.is_empty() {
        return None;
    }
    Some((base.to_string(), ext.to_string()))
}

fn bind_tokens(tokens: &[Token], segments: &[String], out: &mut ParamMap) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return segments.is_empty();
    };

    match token {
        Token::Literal(literal) => {
            segments.first().is_some_and(|s| s == literal) && bind_tokens(rest, &segments[1..], out)
        }
        Token::Wildcard => {
            segments.first().is_some_and(|s| !s.is_empty()) && bind_tokens(rest, &segments[1..], out)
        }
        Token::Variable { name, optional } => {
            if let Some(segment) = segments.first().filter(|s| !s.is_empty()) {
                out.insert(name.clone(), ParamValue::Single(segment.clone()));
                if bind_tokens(rest, &segments[1..], out) {
                    return true;
                }
                out.remove(name);
            }
            *optional && bind_tokens(rest, segments, out)
        }
        Token::DoubleWildcard { name } => {
            for take in (0..=segments.len()).rev() {
                if let Some(name) = name {
                    out.insert(name.clone(), ParamValue::Many(segments[..take].to_vec()));
                }
                if bind_tokens(rest, &segments[take..], out) {
                    return true;
                }
                if let Some(name) = name {
                    out.remove(name);
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(pattern: &str, path: &str) -> Option<ParamMap> {
        UrlPattern::parse(pattern).unwrap().bind(&split_path(path))
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
        assert_eq!(split_path("/a/b/"), vec!["a", "b"]);
        assert_eq!(split_path("/a%20b"), vec!["a b"]);
    }

    #[test]
    fn test_literal_match() {
        assert!(bind("/books", "/books").is_some());
        assert!(bind("/books", "/books/").is_some());
        assert!(bind("/books", "/book").is_none());
        assert!(bind("/books", "/books/1").is_none());
        assert!(bind("/", "/").is_some());
        assert!(bind("/", "/x").is_none());
    }

    #[test]
    fn test_variable_binding() {
        let bound = bind("/books/$id", "/books/42").unwrap();
        assert_eq!(bound["id"], ParamValue::from("42"));
        assert!(bind("/books/$id", "/books").is_none());
    }

    #[test]
    fn test_optional_variables() {
        let bound = bind("/$controller/$action?/$id?", "/book").unwrap();
        assert_eq!(bound.len(), 1);
        let bound = bind("/$controller/$action?/$id?", "/book/show/3").unwrap();
        assert_eq!(bound["action"], ParamValue::from("show"));
        assert_eq!(bound["id"], ParamValue::from("3"));
    }

    #[test]
    fn test_double_wildcard() {
        let bound = bind("/files/$path**", "/files/a/b/c").unwrap();
        assert_eq!(bound["path"], ParamValue::from(vec!["a", "b", "c"]));
        let bound = bind("/files/$path**", "/files").unwrap();
        assert_eq!(bound["path"], ParamValue::Many(vec![]));
    }

    #[test]
    fn test_double_wildcard_is_greedy_before_optional() {
        let bound = bind("/files/$path**/$name?", "/files/a/b").unwrap();
        assert_eq!(bound["path"], ParamValue::from(vec!["a", "b"]));
        assert!(!bound.contains_key("name"));
    }

    #[test]
    fn test_double_wildcard_only_trails() {
        assert!(UrlPattern::parse("/files/**/edit").is_err());
        assert!(UrlPattern::parse("/files/$path**/edit").is_err());
    }

    #[test]
    fn test_single_wildcard_not_bound() {
        let bound = bind("/*/edit", "/book/edit").unwrap();
        assert!(bound.is_empty());
        assert!(bind("/*/edit", "/edit").is_none());
    }

    #[test]
    fn test_extension() {
        let bound = bind("/$controller/$action?(.$format)?", "/book/list.json").unwrap();
        assert_eq!(bound["action"], ParamValue::from("list"));
        assert_eq!(bound["format"], ParamValue::from("json"));

        let bound = bind("/$controller/$action?(.$format)?", "/book/list").unwrap();
        assert!(!bound.contains_key("format"));

        // a trailing dot is not an extension
        let bound = bind("/$controller(.$format)?", "/book.").unwrap();
        assert_eq!(bound["controller"], ParamValue::from("book."));
    }

    #[test]
    fn test_empty_segment_never_binds() {
        assert!(bind("/a/$id", "/a//").is_none());
        assert!(bind("/a/$b/c", "/a//c").is_none());
    }
}
