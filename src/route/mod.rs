//! # Route Module
//!
//! The route data model: a named, method-scoped URL pattern bound to a
//! handler reference, carrying declarative middleware, conditions and
//! optional dashboard-menu metadata. Routes are plain serializable values —
//! everything dynamic (middleware instances, condition instances, handler
//! functions) is referenced by tag or name and resolved through registries
//! at dispatch time, which is what makes the on-disk route cache possible.

mod condition;
mod pattern;

pub use condition::{
    ConditionBlueprint, ConditionConstructor, ConditionFactory, ConditionResolveError,
    RouteCondition,
};
pub use pattern::{PathPattern, Segment};

use http::Method;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;
use crate::middleware::MiddlewareBlueprint;

/// All HTTP methods a route registered via `any()` responds to.
pub(crate) const ALL_METHODS: [Method; 8] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
];

/// Reference to the code that produces a route's response.
///
/// Handlers are referenced by name and looked up in the dispatcher's
/// registry; redirect routes carry their fixed response inline; the
/// delegate marker yields the request back to the embedding host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerRef {
    /// A handler registered under `name` in the dispatcher.
    Named {
        /// Registry name of the handler
        name: String,
    },
    /// A fixed redirect response.
    Redirect {
        /// Redirect target (path or absolute URL)
        to: String,
        /// Redirect status code
        status: u16,
    },
    /// Yield the request back to the host environment.
    Delegate,
}

/// Dashboard-menu metadata attached to a dashboard route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Menu entry title
    pub title: String,
    /// Parent page name for nested menu entries
    pub parent: Option<String>,
}

/// A named, method-scoped URL pattern bound to a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    name: String,
    #[serde(with = "method_list")]
    methods: Vec<Method>,
    pattern: PathPattern,
    middleware: Vec<MiddlewareBlueprint>,
    handler: HandlerRef,
    conditions: Vec<ConditionBlueprint>,
    menu: Option<MenuItem>,
    fallback: bool,
    fallback_exclusions: Vec<String>,
}

impl Route {
    /// Create a route.
    ///
    /// The name must be non-empty without a leading slash; the pattern is
    /// parsed and validated immediately.
    pub fn new(
        name: &str,
        methods: Vec<Method>,
        pattern: &str,
        handler: HandlerRef,
    ) -> Result<Self, ConfigurationError> {
        if name.is_empty() || name.starts_with('/') {
            return Err(ConfigurationError::InvalidRouteName {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            methods,
            pattern: PathPattern::parse(pattern)?,
            middleware: Vec::new(),
            handler,
            conditions: Vec::new(),
            menu: None,
            fallback: false,
            fallback_exclusions: Vec::new(),
        })
    }

    /// A GET route for a named handler.
    pub fn get(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, vec![Method::GET], pattern, handler)
    }

    /// A POST route for a named handler.
    pub fn post(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, vec![Method::POST], pattern, handler)
    }

    /// A PUT route for a named handler.
    pub fn put(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, vec![Method::PUT], pattern, handler)
    }

    /// A PATCH route for a named handler.
    pub fn patch(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, vec![Method::PATCH], pattern, handler)
    }

    /// A DELETE route for a named handler.
    pub fn delete(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, vec![Method::DELETE], pattern, handler)
    }

    /// An OPTIONS route for a named handler.
    pub fn options(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, vec![Method::OPTIONS], pattern, handler)
    }

    /// A route answering every HTTP method.
    pub fn any(name: &str, pattern: &str, handler: &str) -> Result<Self, ConfigurationError> {
        Self::named(name, ALL_METHODS.to_vec(), pattern, handler)
    }

    /// A route for an explicit method set.
    pub fn match_methods(
        name: &str,
        methods: Vec<Method>,
        pattern: &str,
        handler: &str,
    ) -> Result<Self, ConfigurationError> {
        Self::named(name, methods, pattern, handler)
    }

    fn named(
        name: &str,
        methods: Vec<Method>,
        pattern: &str,
        handler: &str,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            name,
            methods,
            pattern,
            HandlerRef::Named {
                name: handler.to_string(),
            },
        )
    }

    /// Append a middleware blueprint.
    #[must_use]
    pub fn middleware(mut self, blueprint: MiddlewareBlueprint) -> Self {
        self.middleware.push(blueprint);
        self
    }

    /// Append a condition blueprint.
    #[must_use]
    pub fn condition(mut self, blueprint: ConditionBlueprint) -> Self {
        self.conditions.push(blueprint);
        self
    }

    /// Attach requirement regexes to named parameters.
    pub fn requirements(
        mut self,
        requirements: &[(&str, &str)],
    ) -> Result<Self, ConfigurationError> {
        for (name, requirement) in requirements {
            self.pattern.add_requirement(name, requirement)?;
        }
        Ok(self)
    }

    /// Attach one requirement regex. Alias for a single-entry
    /// [`requirements`](Self::requirements) call, for fluent chains.
    pub fn and(self, name: &str, requirement: &str) -> Result<Self, ConfigurationError> {
        self.requirements(&[(name, requirement)])
    }

    /// The route name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The methods this route answers.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The parsed pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The handler reference.
    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// The ordered middleware blueprints.
    #[must_use]
    pub fn middleware_stack(&self) -> &[MiddlewareBlueprint] {
        &self.middleware
    }

    /// The ordered condition blueprints.
    #[must_use]
    pub fn conditions(&self) -> &[ConditionBlueprint] {
        &self.conditions
    }

    /// Dashboard-menu metadata, for dashboard routes.
    #[must_use]
    pub fn menu(&self) -> Option<&MenuItem> {
        self.menu.as_ref()
    }

    /// Whether this is the fallback route.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Path suffixes the fallback route refuses to swallow.
    #[must_use]
    pub fn fallback_exclusions(&self) -> &[String] {
        &self.fallback_exclusions
    }

    pub(crate) fn set_menu(&mut self, menu: MenuItem) {
        self.menu = Some(menu);
    }

    pub(crate) fn mark_fallback(&mut self, exclusions: Vec<String>) {
        self.fallback = true;
        self.fallback_exclusions = exclusions;
    }

    /// Rebuild the route under a path prefix.
    pub(crate) fn apply_prefix(mut self, prefix: &str) -> Result<Self, ConfigurationError> {
        self.pattern = self.pattern.prefixed(prefix)?;
        Ok(self)
    }

    /// Prepend a name prefix, joined with `.`.
    pub(crate) fn apply_name_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.name = format!("{prefix}.{}", self.name);
        }
        self
    }

    /// Prepend inherited middleware, de-duplicating identical blueprints.
    pub(crate) fn apply_middleware(mut self, inherited: &[MiddlewareBlueprint]) -> Self {
        let mut merged: Vec<MiddlewareBlueprint> = Vec::with_capacity(
            inherited.len() + self.middleware.len(),
        );
        for blueprint in inherited.iter().chain(self.middleware.iter()) {
            if !merged.contains(blueprint) {
                merged.push(blueprint.clone());
            }
        }
        self.middleware = merged;
        self
    }

    /// Namespace a named handler reference, joined with `::`.
    pub(crate) fn apply_namespace(mut self, namespace: &str) -> Self {
        if let HandlerRef::Named { name } = &self.handler {
            self.handler = HandlerRef::Named {
                name: format!("{namespace}::{name}"),
            };
        }
        self
    }
}

/// Serialize HTTP methods as their string names so the route cache stays
/// a plain, versionable JSON document.
mod method_list {
    use http::Method;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(methods: &[Method], serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
        names.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Method>, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| {
                name.parse::<Method>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid method '{name}'")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_name_rules() {
        assert!(Route::get("users.show", "/users/{id}", "show_user").is_ok());
        assert!(Route::get("", "/users", "list").is_err());
        assert!(Route::get("/users", "/users", "list").is_err());
    }

    #[test]
    fn test_requirements_validate_param_names() {
        let route = Route::get("foo", "/foo/{bar}", "foo_handler").unwrap();
        assert!(route.clone().and("bar", "[a]+").is_ok());
        assert!(route.and("baz", "[a]+").is_err());
    }

    #[test]
    fn test_middleware_merge_dedups() {
        let bp = MiddlewareBlueprint::new("auth");
        let route = Route::get("r", "/r", "h")
            .unwrap()
            .middleware(bp.clone())
            .apply_middleware(&[bp.clone(), MiddlewareBlueprint::new("log")]);
        let tags: Vec<&str> = route.middleware_stack().iter().map(|m| m.tag()).collect();
        assert_eq!(tags, vec!["auth", "log"]);
    }

    #[test]
    fn test_namespace_applies_to_named_handlers_only() {
        let named = Route::get("r", "/r", "h").unwrap().apply_namespace("admin");
        assert_eq!(
            named.handler(),
            &HandlerRef::Named {
                name: "admin::h".to_string()
            }
        );
        let redirect = Route::new(
            "r2",
            vec![Method::GET],
            "/old",
            HandlerRef::Redirect {
                to: "/new".to_string(),
                status: 301,
            },
        )
        .unwrap()
        .apply_namespace("admin");
        assert!(matches!(redirect.handler(), HandlerRef::Redirect { .. }));
    }

    #[test]
    fn test_route_serde_round_trip() {
        let route = Route::get("users.show", "/users/{id}", "show_user")
            .unwrap()
            .and("id", "\\d+")
            .unwrap()
            .middleware(MiddlewareBlueprint::new("auth"));
        let json = serde_json::to_string(&route).unwrap();
        let restored: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.name(), "users.show");
        assert_eq!(restored.methods(), &[Method::GET]);
        assert!(restored.pattern().match_path("/users/42").is_some());
        assert!(restored.pattern().match_path("/users/abc").is_none());
    }
}
