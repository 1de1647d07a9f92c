//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use url_mappings::config::parse_config;
use url_mappings::routing::{ParamMap, RequestContext, UrlMappingsHolder};

/// A small but complete mapping table.
pub const BOOKSTORE: &str = r#"
exclude_patterns = ["/static/**", "/favicon.ico"]

[[mappings]]
pattern = "/$controller/$action?/$id?(.$format)?"

[[mappings]]
pattern = "/"
view = "/index"

[[mappings]]
pattern = "/books/$id"
controller = "book"
action = "show"
constraints = { id = { matches = "\\d+" } }

[[mappings]]
pattern = "/books/$id"
controller = "book"
action = "update"
method = "PUT"
constraints = { id = { matches = "\\d+" } }

[[mappings]]
pattern = "/archive/$year/$month?/$day?"
controller = "archive"
action = "list"

[[mappings]]
pattern = "/files/$path**"
controller = "file"
action = "download"

[[mappings]]
pattern = "/shelves/$shelf"
controller = "shelf"
action = "show"
name = "shelfPage"

[[mappings]]
pattern = "/legacy/**"
uri = "/old.html"

[[mappings]]
status = 404
view = "/notFound"

[[mappings]]
status = 500
view = "/error"

[[mappings]]
status = 500
exception = "DataError"
controller = "errors"
action = "data"
"#;

/// Builds a holder from TOML text, panicking on invalid input.
pub fn holder(toml: &str) -> UrlMappingsHolder {
    let config = parse_config(toml).expect("valid mappings config");
    UrlMappingsHolder::from_config(&config).expect("mappings compile")
}

pub fn bookstore() -> Arc<UrlMappingsHolder> {
    Arc::new(holder(BOOKSTORE))
}

/// Reverse-maps and renders an absolute URL with a default request.
pub fn url_for(holder: &UrlMappingsHolder, controller: &str, action: &str, params: ParamMap) -> String {
    let mut params = params;
    let creator = holder.reverse_mapping(Some(controller), Some(action), None, &mut params);
    creator
        .create_url_for(&RequestContext::default(), Some(controller), Some(action), &params, None, None)
        .expect("url renders")
}
