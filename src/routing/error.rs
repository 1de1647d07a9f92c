//! Error definitions for mapping construction and URL generation.

use thiserror::Error;

/// Errors raised while building mappings or rendering URLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlMappingError {
    /// A mapping declares no controller, view or forward URI.
    #[error("mapping '{0}' has no controller, view or forward uri target")]
    MissingTarget(String),

    /// A mapping declares more than one target kind.
    #[error("mapping '{0}' declares more than one target kind")]
    AmbiguousTarget(String),

    /// The pattern string could not be parsed.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A constraint rule could not be compiled.
    #[error("invalid constraint on '{property}': {reason}")]
    InvalidConstraint { property: String, reason: String },

    /// A constraint names a variable the pattern does not declare.
    #[error("constraint '{property}' does not match any variable in '{pattern}'")]
    UnknownConstraint { property: String, pattern: String },

    /// The requested character encoding is not supported.
    #[error("unsupported character encoding '{0}'")]
    UnsupportedEncoding(String),

    /// A required path variable had no value when building a URL.
    #[error("unable to create URL for mapping [{pattern}]: parameter [{name}] is required")]
    MissingParameter { pattern: String, name: String },

    /// A matched mapping produced no controller name and no view.
    #[error("unable to establish controller name to dispatch for [{0}]")]
    UnresolvedController(String),

    /// An HTTP method string could not be parsed.
    #[error("invalid http method '{0}'")]
    InvalidMethod(String),

    /// Two mappings share the same name.
    #[error("duplicate mapping name '{0}'")]
    DuplicateName(String),
}

/// Result alias for mapping operations.
pub type UrlMappingResult<T> = Result<T, UrlMappingError>;
