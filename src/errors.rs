//! Error taxonomy for route registration, reverse routing and pipeline use.
//!
//! Three families of failure exist in this crate and they are deliberately
//! kept apart:
//!
//! - [`ConfigurationError`] — raised at registration time (duplicate static
//!   routes, attributes staged but never applied, registration against a
//!   cache-locked collection, ...). These indicate programmer error and are
//!   meant to surface during development, not to be recovered from at runtime.
//! - [`UrlGenerationError`] — raised synchronously by the reverse router when
//!   a URL cannot be built from the given route name and parameters. Messages
//!   name the offending route, segment, pattern and value so the failure is
//!   actionable from a log line alone.
//! - [`PipelineError`] — misuse of the single-use middleware pipeline.
//!
//! Matching outcomes (`NotFound`, `MethodNotAllowed`) are *not* errors; they
//! are ordinary values on the hot path, see [`crate::router::MatchOutcome`].

use http::Method;
use std::fmt;

/// Route registration error.
///
/// Returned by [`crate::routing::RouteCollection`] and
/// [`crate::routing::RoutingConfigurator`] when a registration would violate
/// an invariant of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A static path was registered twice for the same HTTP method.
    ///
    /// Dynamic patterns may coexist with a static path sharing the same
    /// prefix (the static route wins at match time), but two identical
    /// static registrations for one method are always a mistake.
    DuplicateStaticRoute {
        /// The conflicting path
        path: String,
        /// The method registered twice
        method: Method,
    },
    /// A route was defined while pending group attributes were staged but
    /// never applied through a `group()` call.
    ///
    /// Rejecting this prevents silently dropping a prefix, name or
    /// middleware attribution the caller clearly intended to apply.
    UnappliedAttributes {
        /// Name of the route being registered
        route: String,
    },
    /// A route was registered after the fallback route.
    ///
    /// The fallback must be the last registration; anything after it would
    /// be unreachable.
    RouteAfterFallback {
        /// Name of the route being registered
        route: String,
    },
    /// Two fallback routes were registered.
    DuplicateFallback,
    /// A route was registered against a collection loaded from the cache
    /// file. Cache-backed collections are immutable.
    CacheLocked {
        /// Name of the route being registered
        route: String,
    },
    /// A route pattern could not be parsed or compiled.
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },
    /// A route name violated the naming rules (empty or leading slash).
    InvalidRouteName {
        /// The offending name
        name: String,
    },
    /// A dashboard page referenced a parent page that was never registered.
    UnknownMenuParent {
        /// The page declaring the parent
        page: String,
        /// The missing parent page
        parent: String,
    },
    /// A dashboard page declared a parent that is itself a child page.
    /// Dashboard menus nest exactly one level deep.
    ConflictingMenuParent {
        /// The page declaring the parent
        page: String,
        /// The parent page that is already a child
        parent: String,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::DuplicateStaticRoute { path, method } => {
                write!(
                    f,
                    "routing configuration error: the static path '{path}' is already \
                    registered for method {method}. Two routes cannot claim the same \
                    static path and method."
                )
            }
            ConfigurationError::UnappliedAttributes { route } => {
                write!(
                    f,
                    "routing configuration error: cannot register route '{route}' while \
                    pending attributes are staged. Apply them with group() or drop them \
                    before registering routes."
                )
            }
            ConfigurationError::RouteAfterFallback { route } => {
                write!(
                    f,
                    "routing configuration error: route '{route}' was registered after \
                    the fallback route. The fallback must be the last registration."
                )
            }
            ConfigurationError::DuplicateFallback => {
                write!(
                    f,
                    "routing configuration error: a fallback route is already registered."
                )
            }
            ConfigurationError::CacheLocked { route } => {
                write!(
                    f,
                    "routing configuration error: cannot register route '{route}'. The \
                    route collection was loaded from the route cache and is read-only. \
                    Delete the cache file to register new routes."
                )
            }
            ConfigurationError::InvalidPattern { pattern, reason } => {
                write!(
                    f,
                    "routing configuration error: invalid route pattern '{pattern}': {reason}"
                )
            }
            ConfigurationError::InvalidRouteName { name } => {
                write!(
                    f,
                    "routing configuration error: invalid route name '{name}'. Route \
                    names must be non-empty and must not start with a slash."
                )
            }
            ConfigurationError::UnknownMenuParent { page, parent } => {
                write!(
                    f,
                    "routing configuration error: dashboard page '{page}' declares \
                    parent '{parent}', but no page with that name was registered."
                )
            }
            ConfigurationError::ConflictingMenuParent { page, parent } => {
                write!(
                    f,
                    "routing configuration error: dashboard page '{page}' declares \
                    parent '{parent}', but '{parent}' is itself a child page. Menu \
                    entries nest one level deep; pick a top-level parent."
                )
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Reverse-routing failure.
///
/// Returned by [`crate::url::UrlGenerator`] when a URL cannot be produced
/// from a route name and a parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlGenerationError {
    /// No route with the given name exists in the collection.
    RouteNotFound {
        /// The requested route name
        name: String,
    },
    /// A required segment parameter was not supplied.
    MissingParameter {
        /// The route being generated
        route: String,
        /// The segment with no value
        segment: String,
    },
    /// A supplied value does not satisfy the segment's requirement regex.
    ParameterMismatch {
        /// The route being generated
        route: String,
        /// The constrained segment
        segment: String,
        /// The requirement pattern the value must satisfy
        pattern: String,
        /// The value that was supplied
        value: String,
    },
    /// A parameter value had a shape that cannot appear in a URL
    /// (only strings and integers are accepted).
    UnsupportedParameter {
        /// The parameter name
        name: String,
        /// A description of the value that was supplied
        found: String,
    },
}

impl fmt::Display for UrlGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlGenerationError::RouteNotFound { name } => {
                write!(f, "url generation error: no route named '{name}' is registered.")
            }
            UrlGenerationError::MissingParameter { route, segment } => {
                write!(
                    f,
                    "url generation error: route '{route}' requires a value for the \
                    segment '{segment}' but none was provided."
                )
            }
            UrlGenerationError::ParameterMismatch {
                route,
                segment,
                pattern,
                value,
            } => {
                write!(
                    f,
                    "url generation error: the value '{value}' for segment '{segment}' \
                    of route '{route}' does not match the required pattern '{pattern}'."
                )
            }
            UrlGenerationError::UnsupportedParameter { name, found } => {
                write!(
                    f,
                    "url generation error: parameter '{name}' must be a string or an \
                    integer, got {found}."
                )
            }
        }
    }
}

impl std::error::Error for UrlGenerationError {}

/// Misuse of the single-use middleware pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// `then()` was called a second time without an intervening `send()`.
    ///
    /// A pipeline value executes exactly one request; reusing it silently
    /// would be a cross-request bug in persistent-process deployments.
    Exhausted,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Exhausted => {
                write!(
                    f,
                    "pipeline error: cannot run a pipeline twice without resending a \
                    request through send()."
                )
            }
        }
    }
}

impl std::error::Error for PipelineError {}
