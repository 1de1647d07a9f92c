//! HTTP status-code mappings.
//!
//! These never take part in path matching or reverse lookup. They are
//! consulted only when an error response is rendered, optionally narrowed by
//! the type of the error being handled.

use std::fmt;

use crate::routing::info::MappingInfo;
use crate::routing::params::ParamMap;
use crate::routing::target::MappingTarget;

/// Describes the error being rendered.
///
/// `ancestors` lists the error's supertypes, closest first, so a mapping
/// declared for a more general type can still apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrownError {
    pub type_name: String,
    pub ancestors: Vec<String>,
}

impl ThrownError {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ancestors: Vec::new(),
        }
    }

    pub fn with_ancestor(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    /// Distance from the thrown type to `type_name`, if it is in the chain.
    pub fn distance_to(&self, type_name: &str) -> Option<usize> {
        std::iter::once(&self.type_name)
            .chain(self.ancestors.iter())
            .position(|t| t == type_name)
    }
}

/// A mapping from a response status (and optional error type) to a target.
#[derive(Debug, Clone)]
pub struct StatusCodeMapping {
    code: u16,
    exception: Option<String>,
    target: MappingTarget,
    parameters: ParamMap,
    pub(crate) index: usize,
}

impl StatusCodeMapping {
    pub fn new(code: u16, target: MappingTarget) -> Self {
        Self {
            code,
            exception: None,
            target,
            parameters: ParamMap::new(),
            index: 0,
        }
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn with_parameters(mut self, parameters: ParamMap) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    pub fn target(&self) -> &MappingTarget {
        &self.target
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Matches the status code alone, ignoring the exception type.
    pub fn match_code(&self, code: u16) -> Option<MappingInfo> {
        (self.code == code).then(|| MappingInfo::for_status(&self.target, self.parameters.clone(), code))
    }
}

impl fmt::Display for StatusCodeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(exception) = &self.exception {
            write!(f, " [{}]", exception)?;
        }
        write!(f, " => {}", self.target)
    }
}

/// First mapping for `code` with no exception type.
pub fn match_status(mappings: &[StatusCodeMapping], code: u16) -> Option<MappingInfo> {
    mappings
        .iter()
        .filter(|m| m.exception.is_none())
        .find_map(|m| m.match_code(code))
}

/// Mapping for `code` whose exception type is closest to `error`, falling
/// back to the plain status mapping.
pub fn match_status_for(
    mappings: &[StatusCodeMapping],
    code: u16,
    error: &ThrownError,
) -> Option<MappingInfo> {
    let mut best: Option<(usize, &StatusCodeMapping)> = None;
    for mapping in mappings.iter().filter(|m| m.code == code) {
        let Some(distance) = mapping.exception().and_then(|e| error.distance_to(e)) else {
            continue;
        };
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, mapping));
        }
    }
    match best {
        Some((_, mapping)) => mapping.match_code(code),
        None => match_status(mappings, code),
    }
}
