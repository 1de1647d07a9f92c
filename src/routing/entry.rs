//! A single declared path mapping.
//!
//! # Responsibilities
//! - Own the parsed pattern, target, constraints and method restriction
//! - Match decoded path segments and produce a [`MappingInfo`]
//! - Expose what the reverse index needs (literal names, slot order)
//!
//! Entries are built once through [`MappingEntryBuilder`] and never mutated.

use std::fmt;

use http::Method;

use crate::routing::constraint::ConstrainedProperty;
use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::info::MappingInfo;
use crate::routing::matcher::Matcher;
use crate::routing::params::{ParamMap, ParamValue};
use crate::routing::pattern::UrlPattern;
use crate::routing::target::{MappingTarget, MappingValue};

pub const CONTROLLER: &str = "controller";
pub const ACTION: &str = "action";
pub const VIEW: &str = "view";
pub const ID: &str = "id";

/// A compiled path mapping.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pattern: UrlPattern,
    target: MappingTarget,
    constraints: Vec<ConstrainedProperty>,
    method: Option<Method>,
    name: Option<String>,
    parameters: ParamMap,
    pub(crate) index: usize,
}

impl MappingEntry {
    pub fn builder(pattern: impl Into<String>) -> MappingEntryBuilder {
        MappingEntryBuilder::new(pattern)
    }

    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }

    pub fn target(&self) -> &MappingTarget {
        &self.target
    }

    /// Constraints in slot order.
    pub fn constraints(&self) -> &[ConstrainedProperty] {
        &self.constraints
    }

    /// Method restriction; `None` accepts any method.
    pub fn http_method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Static parameters merged into every match.
    pub fn parameters(&self) -> &ParamMap {
        &self.parameters
    }

    /// Position in the declared mapping list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True when a path variable of that name exists.
    pub fn has_runtime_variable(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c.name == name)
    }

    /// Controller name when it is a fixed literal.
    pub fn controller_literal(&self) -> Option<&str> {
        self.target.controller().and_then(MappingValue::as_literal)
    }

    /// Action name when it is a fixed literal.
    pub fn action_literal(&self) -> Option<&str> {
        self.target.action().and_then(MappingValue::as_literal)
    }

    /// Total number of constraint rules; more rules rank more specific.
    pub fn rule_count(&self) -> usize {
        self.constraints.iter().map(|c| c.rules.len()).sum()
    }

    /// Accepts a request method. A `*` on either side, or no restriction, accepts all.
    pub fn accepts_method(&self, method: Option<&Method>) -> bool {
        match (&self.method, method) {
            (None, _) => true,
            (Some(own), _) if own.as_str() == "*" => true,
            (Some(_), None) => false,
            (Some(own), Some(requested)) => {
                requested.as_str() == "*" || own.as_str().eq_ignore_ascii_case(requested.as_str())
            }
        }
    }

    /// Matches decoded path segments and validates constraints.
    pub fn match_segments(&self, segments: &[String]) -> Option<MappingInfo> {
        let mut bound = self.pattern.bind(segments)?;
        for constraint in &self.constraints {
            if !constraint.is_valid(bound.get(&constraint.name)) {
                tracing::trace!(
                    pattern = %self.pattern,
                    property = %constraint.name,
                    "Constraint rejected bound value"
                );
                return None;
            }
        }
        for (name, value) in &self.parameters {
            bound.insert(name.clone(), value.clone());
        }
        Some(MappingInfo::new(self, bound))
    }

    /// Matches a raw request path.
    pub fn match_path(&self, path: &str) -> Option<MappingInfo> {
        self.match_segments(&crate::routing::matcher::split_path(path))
    }
}

impl fmt::Display for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(method) = &self.method {
            write!(f, "{} ", method)?;
        }
        write!(f, "{} => {}", self.pattern, self.target)?;
        if let Some(name) = &self.name {
            write!(f, " (name: {})", name)?;
        }
        Ok(())
    }
}

/// Builder for [`MappingEntry`].
#[derive(Debug, Default)]
pub struct MappingEntryBuilder {
    pattern: String,
    controller: Option<MappingValue>,
    action: Option<MappingValue>,
    view: Option<MappingValue>,
    uri: Option<String>,
    method: Option<Method>,
    name: Option<String>,
    parameters: ParamMap,
    constraints: Vec<ConstrainedProperty>,
}

impl MappingEntryBuilder {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn controller(mut self, value: impl Into<MappingValue>) -> Self {
        self.controller = Some(value.into());
        self
    }

    pub fn action(mut self, value: impl Into<MappingValue>) -> Self {
        self.action = Some(value.into());
        self
    }

    pub fn view(mut self, value: impl Into<MappingValue>) -> Self {
        self.view = Some(value.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Adds rules (and optionally relaxes nullability) for a path variable.
    pub fn constraint(mut self, constraint: ConstrainedProperty) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn build(self) -> UrlMappingResult<MappingEntry> {
        let pattern = UrlPattern::parse(&self.pattern)?;

        let mut constraints: Vec<ConstrainedProperty> = pattern
            .slots()
            .into_iter()
            .map(|slot| ConstrainedProperty::new(slot.name, slot.nullable))
            .collect();
        for declared in self.constraints {
            let slot = constraints
                .iter_mut()
                .find(|c| c.name == declared.name)
                .ok_or_else(|| UrlMappingError::UnknownConstraint {
                    property: declared.name.clone(),
                    pattern: self.pattern.clone(),
                })?;
            slot.nullable |= declared.nullable;
            slot.rules.extend(declared.rules);
        }

        let has_target = self.controller.is_some() || self.view.is_some() || self.uri.is_some();
        let controller = self.controller.or_else(|| {
            (!has_target && pattern.has_variable(CONTROLLER))
                .then(|| MappingValue::FromParam(CONTROLLER.to_string()))
        });
        let view = self.view.or_else(|| {
            (!has_target && controller.is_none() && pattern.has_variable(VIEW))
                .then(|| MappingValue::FromParam(VIEW.to_string()))
        });
        let action = self.action.or_else(|| {
            (controller.is_some() && pattern.has_variable(ACTION))
                .then(|| MappingValue::FromParam(ACTION.to_string()))
        });

        let target = MappingTarget::from_parts(&self.pattern, controller, action, view, self.uri)?;

        Ok(MappingEntry {
            pattern,
            target,
            constraints,
            method: self.method,
            name: self.name,
            parameters: self.parameters,
            index: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::constraint::Rule;

    #[test]
    fn test_build_requires_target() {
        let result = MappingEntry::builder("/books").build();
        assert!(matches!(result, Err(UrlMappingError::MissingTarget(_))));
    }

    #[test]
    fn test_runtime_controller_and_action() {
        let entry = MappingEntry::builder("/$controller/$action?/$id?").build().unwrap();
        assert_eq!(entry.target().controller(), Some(&MappingValue::FromParam("controller".into())));
        assert_eq!(entry.target().action(), Some(&MappingValue::FromParam("action".into())));
        assert!(entry.has_runtime_variable("id"));
        assert_eq!(entry.controller_literal(), None);
    }

    #[test]
    fn test_unknown_constraint_rejected() {
        let result = MappingEntry::builder("/books/$id")
            .controller("book")
            .constraint(ConstrainedProperty::new("slug", false))
            .build();
        assert!(matches!(result, Err(UrlMappingError::UnknownConstraint { .. })));
    }

    #[test]
    fn test_constraint_rejects_match() {
        let entry = MappingEntry::builder("/books/$id")
            .controller("book")
            .action("show")
            .constraint(ConstrainedProperty::new("id", false).with_rule(Rule::matches("id", r"\d+").unwrap()))
            .build()
            .unwrap();
        assert!(entry.match_path("/books/12").is_some());
        assert!(entry.match_path("/books/abc").is_none());
    }

    #[test]
    fn test_static_parameters_override_bound() {
        let entry = MappingEntry::builder("/books/$id")
            .controller("book")
            .parameter("id", "fixed")
            .parameter("format", "json")
            .build()
            .unwrap();
        let info = entry.match_path("/books/7").unwrap();
        assert_eq!(info.parameters()["id"], ParamValue::from("fixed"));
        assert_eq!(info.parameters()["format"], ParamValue::from("json"));
    }

    #[test]
    fn test_accepts_method() {
        let entry = MappingEntry::builder("/books").controller("book").method(Method::POST).build().unwrap();
        assert!(entry.accepts_method(Some(&Method::POST)));
        assert!(!entry.accepts_method(Some(&Method::GET)));
        assert!(!entry.accepts_method(None));
        assert!(entry.accepts_method(Some(&Method::from_bytes(b"*").unwrap())));

        let any = MappingEntry::builder("/books").controller("book").build().unwrap();
        assert!(any.accepts_method(None));
        assert!(any.accepts_method(Some(&Method::DELETE)));
    }

    #[test]
    fn test_view_and_uri_targets() {
        let entry = MappingEntry::builder("/about").view("about").build().unwrap();
        assert!(entry.target().view().is_some());
        let entry = MappingEntry::builder("/old").uri("/new").build().unwrap();
        assert_eq!(entry.target().forward_uri(), Some("/new"));
    }
}
