//! Explicit per-request state.
//!
//! Everything a mapping needs to know about the request in flight is passed
//! in a [`RequestContext`]; nothing is looked up from ambient state.

use http::Method;

use crate::routing::params::{ParamMap, ParamValue};

/// Request state consulted by value providers, URL creators and `configure`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method of the request.
    pub method: Method,
    /// Dispatch parameters. `configure` writes matched values here.
    pub params: ParamMap,
    /// Application context path prefixed to absolute URLs (e.g. `/app`).
    pub context_path: String,
    /// Request character encoding, used when a caller supplies none.
    pub character_encoding: Option<String>,
    /// Controller currently handling the request.
    pub controller_name: Option<String>,
    /// Action currently handling the request.
    pub action_name: Option<String>,
    /// Set while an error page is being dispatched.
    pub error_dispatch: bool,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            method: Method::GET,
            params: ParamMap::new(),
            context_path: String::new(),
            character_encoding: None,
            controller_name: None,
            action_name: None,
            error_dispatch: false,
        }
    }
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_context_path(mut self, path: impl Into<String>) -> Self {
        self.context_path = path.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.character_encoding = Some(encoding.into());
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller_name = Some(controller.into());
        self
    }

    /// Names of the request parameters, in map order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}
