//! Mapping targets and the values that name them.

use std::collections::HashMap;
use std::fmt;

use http::Method;

use crate::routing::context::RequestContext;
use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::params::ParamMap;

/// A target name that may depend on the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingValue {
    /// Fixed name.
    Literal(String),
    /// Name chosen by the request's HTTP method.
    ByMethod(HashMap<Method, String>),
    /// Name read from a matched or request parameter.
    FromParam(String),
}

impl MappingValue {
    pub fn literal(value: impl Into<String>) -> Self {
        MappingValue::Literal(value.into())
    }

    /// The fixed name, when the value does not depend on the request.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            MappingValue::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Resolves the value. Matched params are consulted before request params.
    /// Blank results resolve to `None`.
    pub fn evaluate(&self, ctx: &RequestContext, matched: &ParamMap) -> Option<String> {
        let value = match self {
            MappingValue::Literal(s) => Some(s.clone()),
            MappingValue::ByMethod(table) => table.get(&ctx.method).cloned(),
            MappingValue::FromParam(name) => matched
                .get(name)
                .or_else(|| ctx.params.get(name))
                .and_then(|v| v.first().map(str::to_string)),
        };
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl From<&str> for MappingValue {
    fn from(value: &str) -> Self {
        MappingValue::Literal(value.to_string())
    }
}

impl From<String> for MappingValue {
    fn from(value: String) -> Self {
        MappingValue::Literal(value)
    }
}

impl fmt::Display for MappingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingValue::Literal(s) => f.write_str(s),
            MappingValue::FromParam(name) => write!(f, "${{{}}}", name),
            MappingValue::ByMethod(table) => {
                let mut entries: Vec<_> = table.iter().map(|(m, v)| format!("{}:{}", m, v)).collect();
                entries.sort();
                write!(f, "[{}]", entries.join(", "))
            }
        }
    }
}

/// What a mapping dispatches to. Exactly one kind per mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    Controller {
        controller: MappingValue,
        action: Option<MappingValue>,
    },
    View(MappingValue),
    Forward(String),
}

impl MappingTarget {
    /// Builds a target from the declared parts, rejecting zero or several kinds.
    pub fn from_parts(
        label: &str,
        controller: Option<MappingValue>,
        action: Option<MappingValue>,
        view: Option<MappingValue>,
        uri: Option<String>,
    ) -> UrlMappingResult<Self> {
        let kinds = [controller.is_some(), view.is_some(), uri.is_some()]
            .iter()
            .filter(|k| **k)
            .count();
        if kinds > 1 {
            return Err(UrlMappingError::AmbiguousTarget(label.to_string()));
        }
        match (controller, view, uri) {
            (Some(controller), None, None) => Ok(MappingTarget::Controller { controller, action }),
            (None, Some(view), None) => Ok(MappingTarget::View(view)),
            (None, None, Some(uri)) => Ok(MappingTarget::Forward(uri)),
            _ => Err(UrlMappingError::MissingTarget(label.to_string())),
        }
    }

    pub fn controller(&self) -> Option<&MappingValue> {
        match self {
            MappingTarget::Controller { controller, .. } => Some(controller),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&MappingValue> {
        match self {
            MappingTarget::Controller { action, .. } => action.as_ref(),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&MappingValue> {
        match self {
            MappingTarget::View(view) => Some(view),
            _ => None,
        }
    }

    pub fn forward_uri(&self) -> Option<&str> {
        match self {
            MappingTarget::Forward(uri) => Some(uri),
            _ => None,
        }
    }
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingTarget::Controller { controller, action: Some(action) } => {
                write!(f, "controller={}, action={}", controller, action)
            }
            MappingTarget::Controller { controller, action: None } => {
                write!(f, "controller={}", controller)
            }
            MappingTarget::View(view) => write!(f, "view={}", view),
            MappingTarget::Forward(uri) => write!(f, "uri={}", uri),
        }
    }
}
