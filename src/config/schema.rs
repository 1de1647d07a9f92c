//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mapping
//! table. All types derive Serde traits for deserialization from config files.
//!
//! ```toml
//! exclude_patterns = ["/static/**"]
//!
//! [cache]
//! max_weighted_capacity = 5000
//!
//! [[mappings]]
//! pattern = "/books/$id"
//! controller = "book"
//! action = { GET = "show", PUT = "update" }
//! constraints = { id = { matches = "\\d+" } }
//!
//! [[mappings]]
//! status = 500
//! exception = "DataError"
//! view = "/error"
//! ```

use std::collections::{BTreeMap, HashMap};

use http::Method;
use serde::{Deserialize, Serialize};

use crate::routing::constraint::{ConstrainedProperty, Rule};
use crate::routing::entry::MappingEntry;
use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::params::ParamMap;
use crate::routing::status::StatusCodeMapping;
use crate::routing::target::{MappingTarget, MappingValue};

/// Root configuration for the mapping table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MappingsConfig {
    /// Ant-style patterns never handed to `match_all`.
    pub exclude_patterns: Vec<String>,

    /// Cache budgets.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Path and status mappings, in declaration order.
    pub mappings: Vec<MappingConfig>,
}

impl MappingsConfig {
    /// Compiles declared mappings into path entries and status entries.
    pub fn compile(&self) -> UrlMappingResult<(Vec<MappingEntry>, Vec<StatusCodeMapping>)> {
        let mut entries = Vec::new();
        let mut status = Vec::new();
        for mapping in &self.mappings {
            match (&mapping.pattern, mapping.status) {
                (Some(pattern), None) => entries.push(mapping.to_entry(pattern)?),
                (None, Some(code)) => status.push(mapping.to_status(code)?),
                _ => {
                    return Err(UrlMappingError::InvalidPattern {
                        pattern: mapping.label(),
                        reason: "exactly one of 'pattern' or 'status' is required".to_string(),
                    })
                }
            }
        }
        Ok((entries, status))
    }
}

/// Cache budgets, in weight units.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Budget of each forward cache (`match_path`, `match_all`).
    pub max_weighted_capacity: usize,

    /// Budget of the reverse-lookup creator cache. Zero disables it.
    pub url_creator_max_weighted_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_weighted_capacity: 5000,
            url_creator_max_weighted_capacity: 160_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format (full, compact, pretty).
    pub format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

/// A target name: literal, per-method table, or read from a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ValueConfig {
    /// `controller = "book"`
    Literal(String),
    /// `action = { param = "op" }`
    Computed { param: String },
    /// `action = { GET = "show", DELETE = "delete" }`
    ByMethod(BTreeMap<String, String>),
}

impl ValueConfig {
    pub fn to_value(&self) -> UrlMappingResult<MappingValue> {
        match self {
            ValueConfig::Literal(s) => Ok(MappingValue::Literal(s.clone())),
            ValueConfig::Computed { param } => Ok(MappingValue::FromParam(param.clone())),
            ValueConfig::ByMethod(table) => table
                .iter()
                .map(|(method, name)| Ok((parse_method(method)?, name.clone())))
                .collect::<UrlMappingResult<HashMap<Method, String>>>()
                .map(MappingValue::ByMethod),
        }
    }
}

/// Rules for one pattern variable.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConstraintConfig {
    /// Allow the variable to be absent.
    pub nullable: bool,

    /// `false` rejects whitespace-only values.
    pub blank: Option<bool>,

    /// Regular expression the whole value must match.
    pub matches: Option<String>,

    /// Accepted values.
    pub in_list: Option<Vec<String>>,

    pub min_size: Option<usize>,

    pub max_size: Option<usize>,
}

impl ConstraintConfig {
    pub fn to_property(&self, name: &str) -> UrlMappingResult<ConstrainedProperty> {
        let mut property = ConstrainedProperty::new(name, self.nullable);
        if self.blank == Some(false) {
            property = property.with_rule(Rule::NotBlank);
        }
        if let Some(expr) = &self.matches {
            property = property.with_rule(Rule::matches(name, expr)?);
        }
        if let Some(values) = &self.in_list {
            property = property.with_rule(Rule::InList(values.clone()));
        }
        if self.min_size.is_some() || self.max_size.is_some() {
            property = property.with_rule(Rule::Size {
                min: self.min_size,
                max: self.max_size,
            });
        }
        Ok(property)
    }
}

/// One declared mapping. Exactly one of `pattern` or `status` is set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MappingConfig {
    /// URL pattern (path mappings).
    pub pattern: Option<String>,

    /// HTTP status code (status mappings).
    pub status: Option<u16>,

    /// Unique name for `mappingName` lookups.
    pub name: Option<String>,

    pub controller: Option<ValueConfig>,

    pub action: Option<ValueConfig>,

    pub view: Option<ValueConfig>,

    /// Forward URI target.
    pub uri: Option<String>,

    /// HTTP method restriction (path mappings only).
    pub method: Option<String>,

    /// Error type name (status mappings only).
    pub exception: Option<String>,

    /// Constraints keyed by variable name.
    pub constraints: BTreeMap<String, ConstraintConfig>,

    /// Static parameters merged into every match.
    pub parameters: ParamMap,
}

impl MappingConfig {
    /// Human-readable identity for error messages.
    pub fn label(&self) -> String {
        match (&self.pattern, self.status, &self.name) {
            (Some(pattern), _, _) => pattern.clone(),
            (None, Some(code), _) => code.to_string(),
            (None, None, Some(name)) => name.clone(),
            (None, None, None) => "<unnamed>".to_string(),
        }
    }

    pub fn to_entry(&self, pattern: &str) -> UrlMappingResult<MappingEntry> {
        let mut builder = MappingEntry::builder(pattern);
        if let Some(controller) = &self.controller {
            builder = builder.controller(controller.to_value()?);
        }
        if let Some(action) = &self.action {
            builder = builder.action(action.to_value()?);
        }
        if let Some(view) = &self.view {
            builder = builder.view(view.to_value()?);
        }
        if let Some(uri) = &self.uri {
            builder = builder.uri(uri.clone());
        }
        if let Some(method) = &self.method {
            builder = builder.method(parse_method(method)?);
        }
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        for (name, value) in &self.parameters {
            builder = builder.parameter(name.clone(), value.clone());
        }
        for (name, constraint) in &self.constraints {
            builder = builder.constraint(constraint.to_property(name)?);
        }
        builder.build()
    }

    pub fn to_status(&self, code: u16) -> UrlMappingResult<StatusCodeMapping> {
        let label = self.label();
        let target = MappingTarget::from_parts(
            &label,
            self.controller.as_ref().map(ValueConfig::to_value).transpose()?,
            self.action.as_ref().map(ValueConfig::to_value).transpose()?,
            self.view.as_ref().map(ValueConfig::to_value).transpose()?,
            self.uri.clone(),
        )?;
        let mut mapping = StatusCodeMapping::new(code, target).with_parameters(self.parameters.clone());
        if let Some(exception) = &self.exception {
            mapping = mapping.with_exception(exception.clone());
        }
        Ok(mapping)
    }
}

/// Parses a method name case-insensitively; `*` is accepted.
pub fn parse_method(name: &str) -> UrlMappingResult<Method> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| UrlMappingError::InvalidMethod(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
exclude_patterns = ["/static/**"]

[cache]
max_weighted_capacity = 100

[[mappings]]
pattern = "/books/$id"
controller = "book"
action = { GET = "show", put = "update" }
name = "bookPage"
constraints = { id = { matches = "\\d+" } }

[[mappings]]
pattern = "/$controller/$action?/$id?"

[[mappings]]
pattern = "/search"
controller = "search"
action = { param = "mode" }
parameters = { source = "nav" }

[[mappings]]
status = 500
exception = "DataError"
view = "/error/data"
"#;

    #[test]
    fn test_parse_sample() {
        let config: MappingsConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.exclude_patterns, vec!["/static/**"]);
        assert_eq!(config.cache.max_weighted_capacity, 100);
        assert_eq!(config.cache.url_creator_max_weighted_capacity, 160_000);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.mappings.len(), 4);
        assert_eq!(config.mappings[2].action, Some(ValueConfig::Computed { param: "mode".into() }));
    }

    #[test]
    fn test_compile_partitions() {
        let config: MappingsConfig = toml::from_str(SAMPLE).unwrap();
        let (entries, status) = config.compile().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].exception(), Some("DataError"));

        let action = entries[0].target().action().unwrap();
        assert!(matches!(action, MappingValue::ByMethod(table) if table.get(&Method::PUT).map(String::as_str) == Some("update")));
        assert!(entries[0].match_path("/books/abc").is_none());
        assert!(entries[0].match_path("/books/12").is_some());
    }

    #[test]
    fn test_compile_rejects_pattern_and_status() {
        let config: MappingsConfig = toml::from_str(
            r#"
[[mappings]]
pattern = "/x"
status = 404
view = "/x"
"#,
        )
        .unwrap();
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("*").unwrap().as_str(), "*");
        assert!(parse_method("no good").is_err());
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: MappingsConfig = toml::from_str("").unwrap();
        assert!(config.mappings.is_empty());
        assert_eq!(config.cache.max_weighted_capacity, 5000);
    }
}
