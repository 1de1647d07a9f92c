//! Constraints on bound path variables.
//!
//! # Responsibilities
//! - Hold one [`ConstrainedProperty`] per pattern slot, in slot order
//! - Reject bound values that violate a rule (regex, value list, size, blank)
//! - Decide whether an absent value is acceptable (nullable)
//!
//! A failed constraint is not an error: the entry simply does not match.

use regex::Regex;

use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::params::ParamValue;

/// One validation rule applied to a bound value.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The whole value must match the expression.
    Matches(Regex),
    /// The value must be one of the listed strings.
    InList(Vec<String>),
    /// Character count bounds, inclusive.
    Size { min: Option<usize>, max: Option<usize> },
    /// The value must contain a non-whitespace character.
    NotBlank,
}

impl Rule {
    /// Compiles a `matches` rule, anchoring it to the whole value.
    pub fn matches(property: &str, expr: &str) -> UrlMappingResult<Self> {
        Regex::new(&format!("^(?:{})$", expr))
            .map(Rule::Matches)
            .map_err(|e| UrlMappingError::InvalidConstraint {
                property: property.to_string(),
                reason: e.to_string(),
            })
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            Rule::Matches(re) => re.is_match(value),
            Rule::InList(values) => values.iter().any(|v| v == value),
            Rule::Size { min, max } => {
                let len = value.chars().count();
                min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
            }
            Rule::NotBlank => !value.trim().is_empty(),
        }
    }
}

/// Constraints attached to one pattern variable.
#[derive(Debug, Clone)]
pub struct ConstrainedProperty {
    pub name: String,
    pub nullable: bool,
    pub rules: Vec<Rule>,
}

impl ConstrainedProperty {
    pub fn new(name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validates a bound value. `None` and `Null` count as absent.
    pub fn is_valid(&self, value: Option<&ParamValue>) -> bool {
        let values = match value {
            None | Some(ParamValue::Null) => return self.nullable,
            Some(v) => v.values(),
        };
        if values.is_empty() {
            return self.nullable;
        }
        values
            .iter()
            .all(|v| self.rules.iter().all(|rule| rule.accepts(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable() {
        let required = ConstrainedProperty::new("id", false);
        assert!(!required.is_valid(None));
        assert!(!required.is_valid(Some(&ParamValue::Null)));
        assert!(required.is_valid(Some(&ParamValue::from("1"))));

        let optional = ConstrainedProperty::new("id", true);
        assert!(optional.is_valid(None));
    }

    #[test]
    fn test_matches_is_anchored() {
        let prop = ConstrainedProperty::new("id", false)
            .with_rule(Rule::matches("id", r"\d+").unwrap());
        assert!(prop.is_valid(Some(&ParamValue::from("123"))));
        assert!(!prop.is_valid(Some(&ParamValue::from("12a"))));
        assert!(!prop.is_valid(Some(&ParamValue::from("a12"))));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            Rule::matches("id", "("),
            Err(UrlMappingError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_in_list_and_size() {
        let prop = ConstrainedProperty::new("lang", false)
            .with_rule(Rule::InList(vec!["en".into(), "fr".into()]))
            .with_rule(Rule::Size { min: Some(2), max: Some(2) });
        assert!(prop.is_valid(Some(&ParamValue::from("fr"))));
        assert!(!prop.is_valid(Some(&ParamValue::from("de"))));
    }

    #[test]
    fn test_rules_apply_to_every_value() {
        let prop = ConstrainedProperty::new("path", true).with_rule(Rule::NotBlank);
        assert!(prop.is_valid(Some(&ParamValue::from(vec!["a", "b"]))));
        assert!(!prop.is_valid(Some(&ParamValue::from(vec!["a", " "]))));
        assert!(prop.is_valid(Some(&ParamValue::Many(vec![]))));
    }
}
