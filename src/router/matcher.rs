//! URL matching - hot path for request routing.
//!
//! The matcher is compiled once from a [`RouteCollection`] and is
//! read-only during request handling. Matching follows a strict precedence:
//!
//! 1. **Static routes** by exact string key. A path with static
//!    registrations but none for the request method is a
//!    [`MatchOutcome::MethodNotAllowed`] listing exactly the methods
//!    registered for that path — it never falls through to dynamic
//!    matching on a method miss.
//! 2. **Dynamic routes** in registration order; first match wins.
//! 3. **Fallback route**, if one was registered, unless the path ends
//!    with one of its excluded suffixes.
//!
//! Trailing slashes are significant per route: a pattern ending in `/`
//! only matches paths ending in `/`, and vice versa. Conditions attached
//! to a candidate must all pass; a failing condition rejects that
//! candidate and matching continues.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::path::{self, UrlPath};
use crate::request::{ParamVec, Request};
use crate::route::{ConditionFactory, Route};
use crate::routing::RouteCollection;

/// Result of successfully matching a request against the route table.
#[derive(Clone)]
pub struct RouteMatch {
    /// The matched route (shared with the collection)
    pub route: Arc<Route>,
    /// Parameters extracted from the path, in declaration order
    pub params: ParamVec,
}

impl RouteMatch {
    /// Get an extracted parameter by name, last occurrence wins.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Terminal outcome of a match attempt.
///
/// `NotFound` is an ordinary value, not an error: the embedding kernel
/// uses it to delegate the request back to the host.
#[derive(Clone)]
pub enum MatchOutcome {
    /// A route matched; parameters extracted.
    Matched(RouteMatch),
    /// The path is known but not for this method.
    MethodNotAllowed {
        /// Methods the path does answer
        allowed: Vec<Method>,
    },
    /// No route (and no applicable fallback) matched.
    NotFound,
}

impl MatchOutcome {
    /// The route match, if any.
    #[must_use]
    pub fn matched(&self) -> Option<&RouteMatch> {
        match self {
            MatchOutcome::Matched(found) => Some(found),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, MatchOutcome::NotFound)
    }
}

/// Compiled route matcher.
pub struct UrlMatcher {
    /// Static paths (trailing slash included in the key) to their routes
    /// in registration order
    static_routes: HashMap<String, Vec<Arc<Route>>>,
    /// Parameterized routes in registration order
    dynamic_routes: Vec<Arc<Route>>,
    fallback: Option<Arc<Route>>,
    conditions: Arc<ConditionFactory>,
}

impl UrlMatcher {
    /// Compile a matcher over a route collection with no conditions
    /// registered.
    #[must_use]
    pub fn new(collection: &RouteCollection) -> Self {
        Self::with_conditions(collection, Arc::new(ConditionFactory::empty()))
    }

    /// Compile a matcher over a route collection and a condition registry.
    #[must_use]
    pub fn with_conditions(
        collection: &RouteCollection,
        conditions: Arc<ConditionFactory>,
    ) -> Self {
        let mut static_routes: HashMap<String, Vec<Arc<Route>>> = HashMap::new();
        let mut dynamic_routes = Vec::new();
        let mut fallback = None;
        for route in collection.iter() {
            if route.is_fallback() {
                fallback = Some(Arc::clone(route));
            } else if route.pattern().is_static() {
                static_routes
                    .entry(route.pattern().raw().to_string())
                    .or_default()
                    .push(Arc::clone(route));
            } else {
                dynamic_routes.push(Arc::clone(route));
            }
        }
        info!(
            static_count = static_routes.len(),
            dynamic_count = dynamic_routes.len(),
            has_fallback = fallback.is_some(),
            "route matcher compiled"
        );
        Self {
            static_routes,
            dynamic_routes,
            fallback,
            conditions,
        }
    }

    /// Match a request against the route table.
    #[must_use]
    pub fn match_request(&self, request: &Request) -> MatchOutcome {
        let path = UrlPath::parse(&request.path);
        let path = path.decoded();
        let method = &request.method;
        debug!(method = %method, path = %path, "route match attempt");

        let match_start = std::time::Instant::now();
        let outcome = self.match_inner(method, &path, request);
        let duration = match_start.elapsed();

        match &outcome {
            MatchOutcome::Matched(found) => {
                info!(
                    method = %method,
                    path = %path,
                    route = %found.route.name(),
                    route_pattern = %found.route.pattern().raw(),
                    params = ?found.params,
                    duration_us = duration.as_micros(),
                    "route matched"
                );
            }
            MatchOutcome::MethodNotAllowed { allowed } => {
                warn!(
                    method = %method,
                    path = %path,
                    allowed = ?allowed,
                    "method not allowed for path"
                );
            }
            MatchOutcome::NotFound => {
                debug!(
                    method = %method,
                    path = %path,
                    duration_us = duration.as_micros(),
                    "no route matched"
                );
            }
        }
        outcome
    }

    fn match_inner(&self, method: &Method, path: &str, request: &Request) -> MatchOutcome {
        // Static precedence: a static path claims its method negotiation
        // outright, even when a dynamic pattern would also match.
        if let Some(candidates) = self.static_routes.get(path) {
            match candidates.iter().find(|r| r.methods().contains(method)) {
                Some(route) => {
                    let params = ParamVec::new();
                    if self.conditions_pass(route, request, &params) {
                        return MatchOutcome::Matched(RouteMatch {
                            route: Arc::clone(route),
                            params,
                        });
                    }
                    // A failing condition rejects only this candidate.
                }
                None => {
                    let mut allowed = Vec::new();
                    for route in candidates {
                        for m in route.methods() {
                            if !allowed.contains(m) {
                                allowed.push(m.clone());
                            }
                        }
                    }
                    return MatchOutcome::MethodNotAllowed { allowed };
                }
            }
        }

        let mut allowed: Vec<Method> = Vec::new();
        for route in &self.dynamic_routes {
            let Some(mut params) = route.pattern().match_path(path) else {
                continue;
            };
            Self::decode_params(&mut params);
            if !route.methods().contains(method) {
                for m in route.methods() {
                    if !allowed.contains(m) {
                        allowed.push(m.clone());
                    }
                }
                continue;
            }
            if !self.conditions_pass(route, request, &params) {
                continue;
            }
            return MatchOutcome::Matched(RouteMatch {
                route: Arc::clone(route),
                params,
            });
        }
        if !allowed.is_empty() {
            return MatchOutcome::MethodNotAllowed { allowed };
        }

        if let Some(fallback) = &self.fallback {
            if fallback.methods().contains(method)
                && !fallback
                    .fallback_exclusions()
                    .iter()
                    .any(|suffix| path.ends_with(suffix.as_str()))
            {
                if let Some(mut params) = fallback.pattern().match_path(path) {
                    Self::decode_params(&mut params);
                    return MatchOutcome::Matched(RouteMatch {
                        route: Arc::clone(fallback),
                        params,
                    });
                }
            }
        }
        MatchOutcome::NotFound
    }

    fn decode_params(params: &mut ParamVec) {
        for (_, value) in params.iter_mut() {
            if let std::borrow::Cow::Owned(decoded) = path::decode_param(value) {
                *value = decoded;
            }
        }
    }

    fn conditions_pass(&self, route: &Arc<Route>, request: &Request, params: &ParamVec) -> bool {
        route.conditions().iter().all(|blueprint| {
            match self.conditions.resolve(blueprint) {
                Ok(condition) => condition.is_satisfied(request, params),
                Err(error) => {
                    warn!(
                        route = %route.name(),
                        condition = blueprint.tag(),
                        error = %error,
                        "condition could not be constructed; rejecting candidate"
                    );
                    false
                }
            }
        })
    }
}
