//! Reverse routing: building URLs from route names and parameters.

use dashmap::DashMap;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::errors::UrlGenerationError;
use crate::path::UrlPath;
use crate::route::{Route, Segment};
use crate::routing::RouteCollection;
use crate::url::context::{Scheme, UrlGenerationContext};

/// Query parameter name that becomes the URL fragment instead of a query
/// pair.
pub const FRAGMENT_KEY: &str = "_fragment";

/// What kind of URL to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// Full `scheme://authority/path` URL.
    Absolute,
    /// Host-relative `/path`. Upgraded to a full URL when the target
    /// scheme differs from the current one, since a bare path cannot
    /// change schemes.
    AbsolutePath,
}

/// A value that can appear in a generated URL.
///
/// Only strings and integers have an obvious URL form; anything else must
/// be converted explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
}

impl ParamValue {
    /// Try to convert a JSON value, rejecting shapes with no URL form.
    pub fn from_json(name: &str, value: &serde_json::Value) -> Result<Self, UrlGenerationError> {
        match value {
            serde_json::Value::String(s) => Ok(ParamValue::Str(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(ParamValue::Int).ok_or_else(|| {
                UrlGenerationError::UnsupportedParameter {
                    name: name.to_string(),
                    found: format!("the non-integer number {n}"),
                }
            }),
            other => Err(UrlGenerationError::UnsupportedParameter {
                name: name.to_string(),
                found: format!("a JSON {}", json_type_name(other)),
            }),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Builds URLs against a route collection and a deployment context.
///
/// Parameter-free reverse lookups are memoized per (name, kind, scheme)
/// since they always yield the same string for the generator's lifetime.
pub struct UrlGenerator {
    routes: Arc<RouteCollection>,
    context: UrlGenerationContext,
    cache: DashMap<String, String>,
}

impl UrlGenerator {
    pub fn new(routes: Arc<RouteCollection>, context: UrlGenerationContext) -> Self {
        Self {
            routes,
            context,
            cache: DashMap::new(),
        }
    }

    /// The deployment context this generator emits URLs for.
    #[must_use]
    pub fn context(&self) -> &UrlGenerationContext {
        &self.context
    }

    /// Build a URL for an explicit path.
    ///
    /// An already-absolute target (anything with a scheme, e.g.
    /// `https://other.example/x` or `mailto:a@b`) is returned verbatim.
    /// Extra parameters become query pairs; a [`FRAGMENT_KEY`] parameter
    /// becomes the fragment. `secure` overrides the context's scheme
    /// choice when given.
    pub fn to(
        &self,
        target: &str,
        params: &[(&str, ParamValue)],
        kind: UrlKind,
        secure: Option<bool>,
    ) -> Result<String, UrlGenerationError> {
        if Url::parse(target).is_ok() {
            return Ok(target.to_string());
        }
        let (path_part, inline_fragment) = match target.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (target, None),
        };
        let path = UrlPath::parse(path_part);
        let mut rendered = path.as_str().to_string();

        let mut fragment = inline_fragment.map(str::to_string);
        let mut query = String::new();
        for (name, value) in params {
            if *name == FRAGMENT_KEY {
                fragment = Some(value.to_string());
                continue;
            }
            push_query_pair(&mut query, name, &value.to_string());
        }
        if !query.is_empty() {
            rendered.push('?');
            rendered.push_str(&query);
        }
        if let Some(fragment) = fragment {
            rendered.push('#');
            rendered.push_str(&urlencoding::encode(&fragment));
        }
        Ok(self.finalize(rendered, kind, secure))
    }

    /// Build a URL for a named route.
    ///
    /// Segment placeholders are filled from `params` (values validated
    /// against the segment's requirement regex and percent-encoded);
    /// leftover parameters become query pairs, [`FRAGMENT_KEY`] becomes
    /// the fragment. Omitting an optional segment also drops the segments
    /// after it.
    pub fn to_route(
        &self,
        name: &str,
        params: &[(&str, ParamValue)],
        kind: UrlKind,
        secure: Option<bool>,
    ) -> Result<String, UrlGenerationError> {
        let route = self
            .routes
            .find_by_name(name)
            .ok_or_else(|| UrlGenerationError::RouteNotFound {
                name: name.to_string(),
            })?;

        let cacheable = params.is_empty() && route.pattern().is_static();
        let cache_key = if cacheable {
            let key = format!("{name}|{kind:?}|{secure:?}");
            if let Some(hit) = self.cache.get(&key) {
                return Ok(hit.clone());
            }
            Some(key)
        } else {
            None
        };

        let (path, consumed) = self.render_path(&route, params)?;

        let mut rendered = path;
        let mut fragment = None;
        let mut query = String::new();
        for (param_name, value) in params {
            if consumed.iter().any(|c| c == param_name) {
                continue;
            }
            if *param_name == FRAGMENT_KEY {
                fragment = Some(value.to_string());
                continue;
            }
            push_query_pair(&mut query, param_name, &value.to_string());
        }
        if !query.is_empty() {
            rendered.push('?');
            rendered.push_str(&query);
        }
        if let Some(fragment) = fragment {
            rendered.push('#');
            rendered.push_str(&urlencoding::encode(&fragment));
        }

        let url = self.finalize(rendered, kind, secure);
        if let Some(key) = cache_key {
            self.cache.insert(key, url.clone());
        }
        Ok(url)
    }

    /// Render the path portion of a named route, returning the rendered
    /// path and the parameter names consumed by segments.
    fn render_path(
        &self,
        route: &Route,
        params: &[(&str, ParamValue)],
    ) -> Result<(String, Vec<String>), UrlGenerationError> {
        let pattern = route.pattern();
        let mut path = String::new();
        let mut consumed = Vec::new();
        let mut truncated = false;
        for segment in pattern.segments() {
            match segment {
                Segment::Static(literal) => {
                    path.push('/');
                    path.push_str(literal);
                }
                Segment::Param {
                    name: segment_name,
                    optional,
                } => {
                    let value = params
                        .iter()
                        .find(|(k, _)| k == segment_name)
                        .map(|(_, v)| v);
                    match value {
                        Some(value) => {
                            // A value for a segment after an omitted
                            // optional one cannot be placed in the path.
                            if truncated {
                                return Err(UrlGenerationError::MissingParameter {
                                    route: route.name().to_string(),
                                    segment: segment_name.clone(),
                                });
                            }
                            let rendered = value.to_string();
                            if let Some(requirement) = pattern.requirement(segment_name) {
                                if !requirement_matches(requirement, &rendered) {
                                    return Err(UrlGenerationError::ParameterMismatch {
                                        route: route.name().to_string(),
                                        segment: segment_name.clone(),
                                        pattern: requirement.to_string(),
                                        value: rendered,
                                    });
                                }
                            }
                            path.push('/');
                            path.push_str(&urlencoding::encode(&rendered));
                            consumed.push(segment_name.clone());
                        }
                        None if *optional => {
                            truncated = true;
                        }
                        None => {
                            return Err(UrlGenerationError::MissingParameter {
                                route: route.name().to_string(),
                                segment: segment_name.clone(),
                            });
                        }
                    }
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        } else if pattern.has_trailing_slash() {
            path.push('/');
        }
        Ok((path, consumed))
    }

    /// Apply kind and scheme policy to a rendered path-and-extras string.
    ///
    /// Scheme precedence: an explicit `secure` argument beats the
    /// context's forced-https flag, which beats the current request
    /// scheme.
    fn finalize(&self, rendered: String, kind: UrlKind, secure: Option<bool>) -> String {
        let secure = secure.unwrap_or(self.context.is_https_forced() || self.context.is_secure());
        let scheme = if secure { Scheme::Https } else { Scheme::Http };
        let crosses_scheme = secure != self.context.is_secure();
        match kind {
            UrlKind::Absolute => format!(
                "{}://{}{rendered}",
                scheme.as_str(),
                self.context.authority(scheme)
            ),
            UrlKind::AbsolutePath if crosses_scheme => format!(
                "{}://{}{rendered}",
                scheme.as_str(),
                self.context.authority(scheme)
            ),
            UrlKind::AbsolutePath => rendered,
        }
    }
}

fn requirement_matches(requirement: &str, value: &str) -> bool {
    // Requirements were validated when the route was registered.
    match Regex::new(&format!("^(?:{requirement})$")) {
        Ok(regex) => regex.is_match(value),
        Err(_) => false,
    }
}

fn push_query_pair(query: &mut String, name: &str, value: &str) {
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&urlencoding::encode(name));
    query.push('=');
    query.push_str(&urlencoding::encode(value));
}
