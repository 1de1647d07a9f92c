//! URL pattern parsing.
//!
//! # Syntax
//! ```text
//! /books/$id            literal + required variable
//! /books/$id?           optional variable
//! /files/$path**        named rest (zero or more segments)
//! /assets/**            anonymous rest
//! /*/edit               anonymous single segment
//! /$controller/$action?/$id?(.$format)?
//!                       optional extension on the last token
//! ```
//!
//! # Design Decisions
//! - A token is either wholly literal or wholly a variable/wildcard;
//!   mixed tokens such as `book-$id` are rejected
//! - Once an optional token appears, every following token must be optional
//!   (optional variable, rest wildcard); otherwise the pattern is rejected

use std::fmt;

use crate::routing::error::{UrlMappingError, UrlMappingResult};

/// One `/`-delimited element of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Matches the segment verbatim.
    Literal(String),
    /// `$name` or `$name?`: binds one segment.
    Variable { name: String, optional: bool },
    /// `*`: any single segment, not bound.
    Wildcard,
    /// `**` or `$name**`: zero or more segments.
    DoubleWildcard { name: Option<String> },
}

impl Token {
    pub fn is_literal(&self) -> bool {
        matches!(self, Token::Literal(_))
    }

    /// True when the token may match no segment at all.
    pub fn is_optional(&self) -> bool {
        match self {
            Token::Variable { optional, .. } => *optional,
            Token::DoubleWildcard { .. } => true,
            _ => false,
        }
    }

    /// Name bound by this token, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Variable { name, .. } => Some(name),
            Token::DoubleWildcard { name: Some(name) } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(s) => f.write_str(s),
            Token::Variable { name, optional: false } => write!(f, "${}", name),
            Token::Variable { name, optional: true } => write!(f, "${}?", name),
            Token::Wildcard => f.write_str("*"),
            Token::DoubleWildcard { name: None } => f.write_str("**"),
            Token::DoubleWildcard { name: Some(name) } => write!(f, "${}**", name),
        }
    }
}

/// A positional variable slot; one per named token plus the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub nullable: bool,
}

/// A parsed URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPattern {
    raw: String,
    tokens: Vec<Token>,
    extension: Option<String>,
}

impl UrlPattern {
    /// Parses a pattern string.
    pub fn parse(raw: &str) -> UrlMappingResult<Self> {
        let invalid = |reason: &str| UrlMappingError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let body = raw
            .trim()
            .strip_prefix('/')
            .ok_or_else(|| invalid("pattern must start with '/'"))?;
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut tokens = Vec::new();
        let mut extension = None;
        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                let mut part = *part;
                if let Some(start) = part.find("(.$") {
                    if i != last {
                        return Err(invalid("an extension is only allowed on the last token"));
                    }
                    let name = part[start + 3..]
                        .strip_suffix(")?")
                        .ok_or_else(|| invalid("extension must have the form (.$name)?"))?;
                    if !is_identifier(name) {
                        return Err(invalid("invalid extension variable name"));
                    }
                    extension = Some(name.to_string());
                    part = &part[..start];
                }
                tokens.push(parse_token(part).map_err(|reason| invalid(&reason))?);
            }
        }

        if let Some(Token::DoubleWildcard { .. }) = tokens.last() {
            if extension.is_some() {
                return Err(invalid("an extension cannot follow a '**' token"));
            }
        }
        if let Some(first_optional) = tokens.iter().position(Token::is_optional) {
            if tokens[first_optional..].iter().any(|t| !t.is_optional()) {
                return Err(invalid("required tokens cannot follow optional ones"));
            }
        }

        let mut seen = Vec::new();
        for name in tokens.iter().filter_map(Token::name).chain(extension.as_deref()) {
            if seen.contains(&name) {
                return Err(invalid(&format!("variable '{}' declared twice", name)));
            }
            seen.push(name);
        }

        Ok(Self {
            raw: raw.trim().to_string(),
            tokens,
            extension,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Name of the optional `(.$name)?` extension variable.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// The `/` pattern.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty() && self.extension.is_none()
    }

    /// Variable slots in declaration order, extension last.
    pub fn slots(&self) -> Vec<Slot> {
        self.tokens
            .iter()
            .filter_map(|t| {
                t.name().map(|name| Slot {
                    name: name.to_string(),
                    nullable: t.is_optional(),
                })
            })
            .chain(self.extension.iter().map(|name| Slot {
                name: name.clone(),
                nullable: true,
            }))
            .collect()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| t.name() == Some(name)) || self.extension() == Some(name)
    }

    pub fn literal_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_literal()).count()
    }

    /// Count of `**` tokens, named or not.
    pub fn double_wildcard_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::DoubleWildcard { .. }))
            .count()
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_token(part: &str) -> Result<Token, String> {
    if part.is_empty() {
        return Err("empty path segment".to_string());
    }
    match part {
        "*" => return Ok(Token::Wildcard),
        "**" => return Ok(Token::DoubleWildcard { name: None }),
        _ => {}
    }
    if let Some(var) = part.strip_prefix('$') {
        if let Some(name) = var.strip_suffix("**") {
            return identifier(name).map(|name| Token::DoubleWildcard { name: Some(name) });
        }
        if let Some(name) = var.strip_suffix('?') {
            return identifier(name).map(|name| Token::Variable { name, optional: true });
        }
        return identifier(var).map(|name| Token::Variable { name, optional: false });
    }
    if part.contains(['$', '*', '?', '(', ')']) {
        return Err(format!("unsupported token '{}'", part));
    }
    Ok(Token::Literal(part.to_string()))
}

fn identifier(name: &str) -> Result<String, String> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(format!("invalid variable name '{}'", name))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals_and_variables() {
        let p = UrlPattern::parse("/books/$id").unwrap();
        assert_eq!(
            p.tokens(),
            &[
                Token::Literal("books".into()),
                Token::Variable { name: "id".into(), optional: false },
            ]
        );
        assert_eq!(p.literal_count(), 1);
        assert!(!p.is_root());
    }

    #[test]
    fn test_parse_root_and_trailing_slash() {
        assert!(UrlPattern::parse("/").unwrap().is_root());
        let p = UrlPattern::parse("/books/").unwrap();
        assert_eq!(p.tokens().len(), 1);
    }

    #[test]
    fn test_parse_extension() {
        let p = UrlPattern::parse("/$controller/$action?/$id?(.$format)?").unwrap();
        assert_eq!(p.extension(), Some("format"));
        assert_eq!(p.tokens().len(), 3);
        let slots = p.slots();
        let names: Vec<_> = slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["controller", "action", "id", "format"]);
        let nullable: Vec<_> = slots.iter().map(|s| s.nullable).collect();
        assert_eq!(nullable, vec![false, true, true, true]);
    }

    #[test]
    fn test_parse_wildcards() {
        let p = UrlPattern::parse("/files/*/$path**").unwrap();
        assert_eq!(p.tokens()[1], Token::Wildcard);
        assert_eq!(p.tokens()[2], Token::DoubleWildcard { name: Some("path".into()) });
        assert_eq!(p.double_wildcard_count(), 1);
        assert!(p.slots()[0].nullable);
    }

    #[test]
    fn test_reject_invalid_patterns() {
        assert!(UrlPattern::parse("books").is_err());
        assert!(UrlPattern::parse("/books//x").is_err());
        assert!(UrlPattern::parse("/book-$id").is_err());
        assert!(UrlPattern::parse("/$").is_err());
        assert!(UrlPattern::parse("/$a(.$f)?/b").is_err());
        assert!(UrlPattern::parse("/$id?/edit").is_err());
        assert!(UrlPattern::parse("/$id/$id").is_err());
        assert!(UrlPattern::parse("/**(.$format)?").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let p = UrlPattern::parse("/a/$b?/**").unwrap();
        let rendered: Vec<String> = p.tokens().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a", "$b?", "**"]);
        assert_eq!(p.to_string(), "/a/$b?/**");
    }
}
