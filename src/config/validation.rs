//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every mapping compiles (pattern, target, constraints, method)
//! - Validate value ranges (status codes, log level, log format)
//! - Detect duplicate mapping names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MappingsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{MappingConfig, MappingsConfig};
use crate::routing::exclude::ExcludePattern;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["full", "compact", "pretty"];

/// A semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct ValidationError {
    pub location: String,
    pub message: String,
}

impl ValidationError {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &MappingsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if !LOG_FORMATS.contains(&config.observability.format.as_str()) {
        errors.push(ValidationError::new(
            "observability.format",
            format!("unknown format '{}'", config.observability.format),
        ));
    }

    for (i, pattern) in config.exclude_patterns.iter().enumerate() {
        if let Err(e) = ExcludePattern::new(pattern) {
            errors.push(ValidationError::new(format!("exclude_patterns[{}]", i), e.to_string()));
        }
    }

    let mut names = HashSet::new();
    for (i, mapping) in config.mappings.iter().enumerate() {
        let location = format!("mappings[{}]", i);
        validate_mapping(&location, mapping, &mut errors);
        if let Some(name) = &mapping.name {
            if !names.insert(name.as_str()) {
                errors.push(ValidationError::new(&location, format!("duplicate name '{}'", name)));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mapping(location: &str, mapping: &MappingConfig, errors: &mut Vec<ValidationError>) {
    match (&mapping.pattern, mapping.status) {
        (Some(pattern), None) => {
            if mapping.exception.is_some() {
                errors.push(ValidationError::new(location, "'exception' requires 'status'"));
            }
            if let Err(e) = mapping.to_entry(pattern) {
                errors.push(ValidationError::new(location, e.to_string()));
            }
        }
        (None, Some(code)) => {
            if !(100..=599).contains(&code) {
                errors.push(ValidationError::new(location, format!("status {} out of range", code)));
            }
            if mapping.method.is_some() || !mapping.constraints.is_empty() || mapping.name.is_some() {
                errors.push(ValidationError::new(
                    location,
                    "status mappings take no 'method', 'name' or 'constraints'",
                ));
            }
            if let Err(e) = mapping.to_status(code) {
                errors.push(ValidationError::new(location, e.to_string()));
            }
        }
        (Some(_), Some(_)) => {
            errors.push(ValidationError::new(location, "'pattern' and 'status' are exclusive"));
        }
        (None, None) => {
            errors.push(ValidationError::new(location, "one of 'pattern' or 'status' is required"));
        }
    }
}
