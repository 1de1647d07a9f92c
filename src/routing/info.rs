//! The result of a successful forward match.
//!
//! # Responsibilities
//! - Carry the matched target and bound parameters
//! - Resolve controller/action/view names against an explicit request
//! - Push matched values into the request (`configure`)
//!
//! # Design Decisions
//! - Immutable once built; cached and shared as `Arc<MappingInfo>`
//! - Request-dependent names are resolved on demand, never stored

use http::Method;
use serde::Serialize;

use crate::routing::context::RequestContext;
use crate::routing::entry::{MappingEntry, ID};
use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::params::{ParamMap, ParamValue};
use crate::routing::target::MappingTarget;

/// Prefix of submit-button parameters that override the action.
pub const DISPATCH_ACTION_PARAMETER: &str = "_action_";

/// A matched mapping with its bound parameters.
#[derive(Debug, Clone)]
pub struct MappingInfo {
    target: MappingTarget,
    params: ParamMap,
    method: Option<Method>,
    pattern: String,
    mapping_name: Option<String>,
}

/// Serializable snapshot of a [`MappingInfo`] resolved against a request.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMapping {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub params: ParamMap,
}

impl MappingInfo {
    pub(crate) fn new(entry: &MappingEntry, params: ParamMap) -> Self {
        Self {
            target: entry.target().clone(),
            params,
            method: entry.http_method().cloned(),
            pattern: entry.pattern().to_string(),
            mapping_name: entry.name().map(str::to_string),
        }
    }

    /// Builds an info for a status-code mapping.
    pub(crate) fn for_status(target: &MappingTarget, params: ParamMap, code: u16) -> Self {
        Self {
            target: target.clone(),
            params,
            method: None,
            pattern: code.to_string(),
            mapping_name: None,
        }
    }

    pub fn target(&self) -> &MappingTarget {
        &self.target
    }

    /// Bound path variables plus the mapping's static parameters.
    pub fn parameters(&self) -> &ParamMap {
        &self.params
    }

    pub fn http_method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Pattern (or status code) of the matched mapping.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mapping_name(&self) -> Option<&str> {
        self.mapping_name.as_deref()
    }

    pub fn forward_uri(&self) -> Option<&str> {
        self.target.forward_uri()
    }

    pub fn controller_name(&self, ctx: &RequestContext) -> Option<String> {
        self.target.controller().and_then(|v| v.evaluate(ctx, &self.params))
    }

    /// Action name, honouring `_action_<name>` submit parameters.
    pub fn action_name(&self, ctx: &RequestContext) -> Option<String> {
        if let Some(dispatched) = dispatch_action(ctx) {
            return Some(dispatched);
        }
        self.target.action().and_then(|v| v.evaluate(ctx, &self.params))
    }

    pub fn view_name(&self, ctx: &RequestContext) -> Option<String> {
        self.target.view().and_then(|v| v.evaluate(ctx, &self.params))
    }

    /// The `id` parameter, if present and not blank.
    pub fn id(&self) -> Option<String> {
        self.params
            .get(ID)
            .and_then(ParamValue::first)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Copies matched values into the request.
    ///
    /// Fails when a controller mapping resolves no controller name.
    pub fn configure(&self, ctx: &mut RequestContext) -> UrlMappingResult<()> {
        let controller = self.controller_name(ctx);
        let action = self.action_name(ctx);
        let has_view = self.target.view().is_some();

        if controller.is_none() && !has_view && self.forward_uri().is_none() {
            return Err(UrlMappingError::UnresolvedController(self.pattern.clone()));
        }

        for (name, value) in &self.params {
            ctx.params.insert(name.clone(), value.clone());
        }
        if !has_view {
            if controller.is_some() {
                ctx.controller_name = controller;
            }
            if action.is_some() {
                ctx.action_name = action;
            }
        }
        if let Some(id) = self.id() {
            ctx.params.insert(ID.to_string(), ParamValue::Single(id));
        }
        Ok(())
    }

    /// Internal URL the request is dispatched to.
    pub fn dispatch_url(&self, ctx: &RequestContext) -> UrlMappingResult<String> {
        if let Some(uri) = self.forward_uri() {
            return Ok(uri.to_string());
        }
        if let Some(view) = self.view_name(ctx) {
            return Ok(if view.starts_with('/') { view } else { format!("/{}", view) });
        }
        let controller = self
            .controller_name(ctx)
            .ok_or_else(|| UrlMappingError::UnresolvedController(self.pattern.clone()))?;
        let mut url = format!("/{}", controller);
        if let Some(action) = self.action_name(ctx) {
            url.push('/');
            url.push_str(&action);
        }
        Ok(url)
    }

    pub fn resolve(&self, ctx: &RequestContext) -> ResolvedMapping {
        ResolvedMapping {
            pattern: self.pattern.clone(),
            name: self.mapping_name.clone(),
            method: self.method.as_ref().map(ToString::to_string),
            controller: self.controller_name(ctx),
            action: self.action_name(ctx),
            view: self.view_name(ctx),
            uri: self.forward_uri().map(str::to_string),
            params: self.params.clone(),
        }
    }
}

/// Reads an `_action_<Name>` parameter, unless an error page is dispatching.
fn dispatch_action(ctx: &RequestContext) -> Option<String> {
    if ctx.error_dispatch {
        return None;
    }
    ctx.parameter_names()
        .find_map(|name| name.strip_prefix(DISPATCH_ACTION_PARAMETER))
        .map(|name| {
            let name = name
                .strip_suffix(".x")
                .or_else(|| name.strip_suffix(".y"))
                .unwrap_or(name);
            property_name(name)
        })
        .filter(|name| !name.is_empty())
}

/// `Update` → `update`, `URLs` → `URLs`, whitespace removed.
fn property_name(name: &str) -> String {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars = compact.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_uppercase() && b.is_uppercase() => compact,
        (Some(a), _) => a.to_lowercase().chain(compact.chars().skip(1)).collect(),
        (None, _) => compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::entry::MappingEntry;

    fn info(pattern: &str, path: &str) -> MappingInfo {
        MappingEntry::builder(pattern).build().unwrap().match_path(path).unwrap()
    }

    #[test]
    fn test_property_name() {
        assert_eq!(property_name("Update"), "update");
        assert_eq!(property_name("URLs"), "URLs");
        assert_eq!(property_name("Save Draft"), "saveDraft");
        assert_eq!(property_name("x"), "x");
    }

    #[test]
    fn test_runtime_names() {
        let info = info("/$controller/$action?/$id?", "/book/show/5");
        let ctx = RequestContext::default();
        assert_eq!(info.controller_name(&ctx).as_deref(), Some("book"));
        assert_eq!(info.action_name(&ctx).as_deref(), Some("show"));
        assert_eq!(info.id().as_deref(), Some("5"));
    }

    #[test]
    fn test_dispatch_action_override() {
        let info = info("/$controller/$action?", "/book/edit");
        let ctx = RequestContext::default().with_param("_action_Update.x", "1");
        assert_eq!(info.action_name(&ctx).as_deref(), Some("update"));

        let mut error_ctx = ctx.clone();
        error_ctx.error_dispatch = true;
        assert_eq!(info.action_name(&error_ctx).as_deref(), Some("edit"));
    }

    #[test]
    fn test_configure_pushes_params() {
        let info = info("/$controller/$action?/$id?", "/book/show/5");
        let mut ctx = RequestContext::default().with_param("q", "x");
        info.configure(&mut ctx).unwrap();
        assert_eq!(ctx.controller_name.as_deref(), Some("book"));
        assert_eq!(ctx.action_name.as_deref(), Some("show"));
        assert_eq!(ctx.params["id"], ParamValue::from("5"));
        assert_eq!(ctx.params["q"], ParamValue::from("x"));
    }

    #[test]
    fn test_configure_without_controller_fails() {
        let entry = MappingEntry::builder("/$controller?").build().unwrap();
        let info = entry.match_path("/").unwrap();
        let mut ctx = RequestContext::default();
        assert!(matches!(
            info.configure(&mut ctx),
            Err(UrlMappingError::UnresolvedController(_))
        ));
    }

    #[test]
    fn test_dispatch_url() {
        let ctx = RequestContext::default();
        assert_eq!(info("/$controller/$action?", "/book/list").dispatch_url(&ctx).unwrap(), "/book/list");
        let about = MappingEntry::builder("/about").view("about").build().unwrap();
        assert_eq!(about.match_path("/about").unwrap().dispatch_url(&ctx).unwrap(), "/about");
        let fwd = MappingEntry::builder("/old").uri("/new").build().unwrap();
        assert_eq!(fwd.match_path("/old").unwrap().dispatch_url(&ctx).unwrap(), "/new");
    }
}
