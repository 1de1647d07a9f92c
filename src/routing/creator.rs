//! Outbound URL generation.
//!
//! # Responsibilities
//! - Define the [`UrlCreator`] contract used by link rendering
//! - Render declared mappings: token substitution, percent-encoding,
//!   query string for unconsumed parameters, optional fragment
//! - Provide [`DefaultUrlCreator`] for `/controller/action/id` links when no
//!   declared mapping applies
//!
//! # Design Decisions
//! - Literal tokens are written verbatim; bound values are encoded per segment
//! - A missing optional value or an empty value ends path emission; later
//!   tokens are dropped
//! - The extension is kept when only the final token was left empty
//! - Query parameters are emitted in name order, lists repeat their key
//! - `Null` values render as `name=`

use std::collections::BTreeSet;
use std::fmt;

use crate::routing::context::RequestContext;
use crate::routing::encoding::Charset;
use crate::routing::entry::{MappingEntry, ACTION, CONTROLLER, ID};
use crate::routing::error::{UrlMappingError, UrlMappingResult};
use crate::routing::params::{ParamMap, ParamValue};
use crate::routing::pattern::Token;

/// Builds request paths for outbound links.
///
/// `encoding` falls back to the request encoding, then UTF-8. An
/// unsupported encoding is an error, not a retryable condition.
pub trait UrlCreator: Send + Sync + fmt::Debug {
    /// Absolute URL (with context path) from the parameters alone.
    fn create_url(
        &self,
        ctx: &RequestContext,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String>;

    /// Absolute URL (with context path) for a controller and action.
    fn create_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String>;

    /// Like [`UrlCreator::create_url_for`] without the context path.
    fn create_relative_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String>;
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Copies params and adds non-blank controller/action names.
fn with_target(params: &ParamMap, controller: Option<&str>, action: Option<&str>) -> ParamMap {
    let mut params = params.clone();
    if let Some(controller) = non_blank(controller) {
        params.insert(CONTROLLER.to_string(), ParamValue::from(controller));
    }
    if let Some(action) = non_blank(action) {
        params.insert(ACTION.to_string(), ParamValue::from(action));
    }
    params
}

fn append_query(uri: &mut String, params: &ParamMap, used: &BTreeSet<&str>, charset: Charset) {
    let mut first = true;
    for (name, value) in params {
        if used.contains(name.as_str()) {
            continue;
        }
        let values = match value {
            ParamValue::Null => vec![""],
            other => other.values(),
        };
        for v in values {
            uri.push(if first { '?' } else { '&' });
            first = false;
            uri.push_str(&charset.encode_form(name));
            uri.push('=');
            uri.push_str(&charset.encode_form(v));
        }
    }
}

fn append_fragment(uri: &mut String, fragment: Option<&str>, charset: Charset) {
    if let Some(fragment) = fragment {
        uri.push('#');
        uri.push_str(&charset.encode_form(fragment));
    }
}

impl MappingEntry {
    fn render(
        &self,
        ctx: &RequestContext,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
        include_context: bool,
    ) -> UrlMappingResult<String> {
        let charset = Charset::resolve(encoding, ctx.character_encoding.as_deref())?;
        let mut path = String::new();
        let mut used: BTreeSet<&str> = [CONTROLLER, ACTION].into_iter().collect();
        let tokens = self.pattern().tokens();
        let mut stopped_at = None;
        let mut unbound_stop = false;

        for (index, token) in tokens.iter().enumerate() {
            match token {
                Token::Literal(literal) => {
                    path.push('/');
                    path.push_str(literal);
                }
                Token::Variable { name, .. } => {
                    used.insert(name);
                    match params.get(name).filter(|v| !v.is_null()) {
                        Some(value) if value.is_empty() => {
                            stopped_at = Some(index);
                            break;
                        }
                        Some(value) => {
                            path.push('/');
                            path.push_str(&charset.encode_segment(&value.joined()));
                        }
                        None if self.is_nullable(name) => {
                            stopped_at = Some(index);
                            break;
                        }
                        None => {
                            return Err(UrlMappingError::MissingParameter {
                                pattern: self.pattern().to_string(),
                                name: name.clone(),
                            })
                        }
                    }
                }
                Token::DoubleWildcard { name: Some(name) } => {
                    used.insert(name);
                    let segments: Vec<String> = match params.get(name) {
                        Some(ParamValue::Single(s)) => s
                            .trim_start_matches('/')
                            .split('/')
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect(),
                        Some(ParamValue::Many(values)) => values.clone(),
                        _ => Vec::new(),
                    };
                    if segments.is_empty() {
                        stopped_at = Some(index);
                        break;
                    }
                    for segment in segments {
                        path.push('/');
                        path.push_str(&charset.encode_segment(&segment));
                    }
                }
                Token::Wildcard | Token::DoubleWildcard { name: None } => {
                    stopped_at = Some(index);
                    unbound_stop = true;
                    break;
                }
            }
        }

        // The extension rides on the final token, so it survives an empty
        // final value but not an earlier stop.
        let reached_last =
            !unbound_stop && stopped_at.map_or(true, |index| index + 1 == tokens.len());
        if let Some(ext) = self.pattern().extension() {
            match params.get(ext).filter(|v| !v.is_empty()) {
                Some(value) if reached_last && !path.is_empty() => {
                    used.insert(ext);
                    path.push('.');
                    path.push_str(&charset.encode_segment(&value.joined()));
                }
                Some(_) => {}
                None => {
                    used.insert(ext);
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        let mut uri = if include_context {
            format!("{}{}", ctx.context_path, path)
        } else {
            path
        };
        append_query(&mut uri, params, &used, charset);
        append_fragment(&mut uri, fragment, charset);

        tracing::debug!(pattern = %self.pattern(), url = %uri, "Created reverse URL");
        Ok(uri)
    }

    fn is_nullable(&self, name: &str) -> bool {
        self.constraints()
            .iter()
            .find(|c| c.name == name)
            .map_or(true, |c| c.nullable)
    }
}

impl UrlCreator for MappingEntry {
    fn create_url(
        &self,
        ctx: &RequestContext,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        self.render(ctx, params, encoding, fragment, true)
    }

    fn create_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        let params = with_target(params, controller, action);
        self.render(ctx, &params, encoding, fragment, true)
    }

    fn create_relative_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        let params = with_target(params, controller, action);
        self.render(ctx, &params, encoding, fragment, false)
    }
}

/// Fallback creator producing `/controller/action/id?rest`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultUrlCreator {
    controller: Option<String>,
    action: Option<String>,
}

impl DefaultUrlCreator {
    pub fn new(controller: Option<&str>, action: Option<&str>) -> Self {
        Self {
            controller: non_blank(controller).map(str::to_string),
            action: non_blank(action).map(str::to_string),
        }
    }

    fn render(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
        include_context: bool,
    ) -> UrlMappingResult<String> {
        let charset = Charset::resolve(encoding, ctx.character_encoding.as_deref())?;
        let controller = non_blank(controller)
            .or(self.controller.as_deref())
            .or(ctx.controller_name.as_deref());
        let action = non_blank(action).or(self.action.as_deref());

        let mut path = String::new();
        match action {
            Some(action) if action.contains('/') => {
                if !action.starts_with('/') {
                    path.push('/');
                }
                path.push_str(action);
            }
            _ => {
                if let Some(controller) = controller {
                    path.push('/');
                    path.push_str(&charset.encode_segment(controller));
                }
                if let Some(action) = action {
                    path.push('/');
                    path.push_str(&charset.encode_segment(action));
                }
            }
        }
        if let Some(id) = params.get(ID).filter(|v| !v.is_null()) {
            path.push('/');
            path.push_str(&charset.encode_segment(&id.joined()));
        }
        if path.is_empty() {
            path.push('/');
        }

        let mut uri = if include_context {
            format!("{}{}", ctx.context_path, path)
        } else {
            path
        };
        let used: BTreeSet<&str> = [CONTROLLER, ACTION, ID].into_iter().collect();
        append_query(&mut uri, params, &used, charset);
        append_fragment(&mut uri, fragment, charset);
        Ok(uri)
    }
}

impl UrlCreator for DefaultUrlCreator {
    fn create_url(
        &self,
        ctx: &RequestContext,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        self.render(ctx, None, None, params, encoding, fragment, true)
    }

    fn create_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        self.render(ctx, controller, action, params, encoding, fragment, true)
    }

    fn create_relative_url_for(
        &self,
        ctx: &RequestContext,
        controller: Option<&str>,
        action: Option<&str>,
        params: &ParamMap,
        encoding: Option<&str>,
        fragment: Option<&str>,
    ) -> UrlMappingResult<String> {
        self.render(ctx, controller, action, params, encoding, fragment, false)
    }
}
