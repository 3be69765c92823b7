//! Fluent route registration surface.
//!
//! The configurator accumulates pending attributes (prefix, name,
//! namespace, middleware) through a value-semantic fluent chain and applies
//! them to every route registered inside the matching
//! [`group`](RoutingConfigurator::group) call. Attribute inheritance on
//! nested groups: prefixes join with `/`, names join with `.`, middleware
//! lists concatenate (identical blueprints de-duplicated), and the
//! innermost explicit namespace wins.
//!
//! Registering a route while attributes are staged but no `group` call has
//! consumed them is a configuration error — the alternative is silently
//! losing a prefix the caller clearly meant to apply.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::errors::ConfigurationError;
use crate::middleware::MiddlewareBlueprint;
use crate::path::UrlPath;
use crate::route::Route;

use super::dashboard::{DashboardConfigurator, MenuRegistry, NullMenuRegistry};
use super::RouteCollection;

/// Default path suffixes the fallback route refuses to swallow.
pub const DEFAULT_FALLBACK_EXCLUSIONS: [&str; 3] =
    ["favicon.ico", "robots.txt", "sitemap.xml"];

#[derive(Debug, Default, Clone)]
struct GroupAttributes {
    prefix: String,
    name: String,
    namespace: Option<String>,
    middleware: Vec<MiddlewareBlueprint>,
}

impl GroupAttributes {
    fn merge(parent: &GroupAttributes, child: &GroupAttributes) -> GroupAttributes {
        let prefix = if child.prefix.is_empty() {
            parent.prefix.clone()
        } else if parent.prefix.is_empty() {
            child.prefix.clone()
        } else {
            UrlPath::join(&parent.prefix, &child.prefix).as_str().to_string()
        };
        let name = match (parent.name.is_empty(), child.name.is_empty()) {
            (true, _) => child.name.clone(),
            (_, true) => parent.name.clone(),
            (false, false) => format!("{}.{}", parent.name, child.name),
        };
        let mut middleware = parent.middleware.clone();
        for blueprint in &child.middleware {
            if !middleware.contains(blueprint) {
                middleware.push(blueprint.clone());
            }
        }
        GroupAttributes {
            prefix,
            name,
            // Innermost explicit namespace always wins.
            namespace: child.namespace.clone().or_else(|| parent.namespace.clone()),
            middleware,
        }
    }

    fn is_empty(&self) -> bool {
        self.prefix.is_empty()
            && self.name.is_empty()
            && self.namespace.is_none()
            && self.middleware.is_empty()
    }
}

/// Fluent builder emitting routes into a shared [`RouteCollection`].
pub struct RoutingConfigurator {
    collection: RouteCollection,
    applied: GroupAttributes,
    staged: Option<GroupAttributes>,
    pub(super) dashboard_prefix: String,
    pub(super) menu_registry: Arc<dyn MenuRegistry>,
    fallback_exclusions: Vec<String>,
}

impl Default for RoutingConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: the menu registry is a dyn trait object.
impl fmt::Debug for RoutingConfigurator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingConfigurator")
            .field("routes", &self.collection.len())
            .field("applied", &self.applied)
            .field("staged", &self.staged)
            .field("dashboard_prefix", &self.dashboard_prefix)
            .field("fallback_exclusions", &self.fallback_exclusions)
            .finish_non_exhaustive()
    }
}

impl RoutingConfigurator {
    pub fn new() -> Self {
        Self {
            collection: RouteCollection::new(),
            applied: GroupAttributes::default(),
            staged: None,
            dashboard_prefix: "/wp-admin".to_string(),
            menu_registry: Arc::new(NullMenuRegistry),
            fallback_exclusions: DEFAULT_FALLBACK_EXCLUSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Override the dashboard path prefix (default `/wp-admin`).
    #[must_use]
    pub fn with_dashboard_prefix(mut self, prefix: &str) -> Self {
        self.dashboard_prefix = UrlPath::parse(prefix).as_str().to_string();
        self
    }

    /// Install the host's menu registry adapter.
    #[must_use]
    pub fn with_menu_registry(mut self, registry: Arc<dyn MenuRegistry>) -> Self {
        self.menu_registry = registry;
        self
    }

    /// Override the fallback exclusion suffixes.
    #[must_use]
    pub fn with_fallback_exclusions(mut self, suffixes: Vec<String>) -> Self {
        self.fallback_exclusions = suffixes;
        self
    }

    /// Stage a path prefix for the next `group` call.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        let staged = self.staged.get_or_insert_with(GroupAttributes::default);
        staged.prefix = if staged.prefix.is_empty() {
            UrlPath::parse(prefix).as_str().to_string()
        } else {
            UrlPath::join(&staged.prefix, prefix).as_str().to_string()
        };
        self
    }

    /// Stage a name prefix for the next `group` call.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        let staged = self.staged.get_or_insert_with(GroupAttributes::default);
        staged.name = if staged.name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", staged.name)
        };
        self
    }

    /// Stage a handler namespace for the next `group` call.
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.staged.get_or_insert_with(GroupAttributes::default).namespace =
            Some(namespace.to_string());
        self
    }

    /// Stage a middleware attribution for the next `group` call.
    #[must_use]
    pub fn middleware(mut self, blueprint: MiddlewareBlueprint) -> Self {
        self.staged
            .get_or_insert_with(GroupAttributes::default)
            .middleware
            .push(blueprint);
        self
    }

    /// Apply the staged attributes to every route registered inside the
    /// closure, then pop the frame.
    pub fn group<F>(mut self, configure: F) -> Result<Self, ConfigurationError>
    where
        F: FnOnce(Self) -> Result<Self, ConfigurationError>,
    {
        let frame = self.staged.take().unwrap_or_default();
        let saved = self.applied.clone();
        self.applied = GroupAttributes::merge(&saved, &frame);
        let mut configurator = configure(self)?;
        if let Some(staged) = configurator.staged.take() {
            if !staged.is_empty() {
                warn!("group closure ended with staged attributes that were never applied");
            }
        }
        configurator.applied = saved;
        Ok(configurator)
    }

    /// Register a fully built route, applying inherited group attributes.
    pub fn add(mut self, route: Route) -> Result<Self, ConfigurationError> {
        if self.staged.is_some() {
            return Err(ConfigurationError::UnappliedAttributes {
                route: route.name().to_string(),
            });
        }
        let mut route = route;
        if !self.applied.prefix.is_empty() {
            route = route.apply_prefix(&self.applied.prefix)?;
        }
        route = route.apply_name_prefix(&self.applied.name);
        route = route.apply_middleware(&self.applied.middleware);
        if let Some(namespace) = &self.applied.namespace {
            route = route.apply_namespace(namespace);
        }
        self.collection.add(route)?;
        Ok(self)
    }

    /// Register a GET route.
    pub fn get(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::get(name, path, handler)?)
    }

    /// Register a POST route.
    pub fn post(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::post(name, path, handler)?)
    }

    /// Register a PUT route.
    pub fn put(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::put(name, path, handler)?)
    }

    /// Register a PATCH route.
    pub fn patch(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::patch(name, path, handler)?)
    }

    /// Register a DELETE route.
    pub fn delete(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::delete(name, path, handler)?)
    }

    /// Register an OPTIONS route.
    pub fn options(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::options(name, path, handler)?)
    }

    /// Register a route answering every method.
    pub fn any(self, name: &str, path: &str, handler: &str) -> Result<Self, ConfigurationError> {
        self.add(Route::any(name, path, handler)?)
    }

    /// Register a route for an explicit method set.
    pub fn match_methods(
        self,
        name: &str,
        methods: Vec<http::Method>,
        path: &str,
        handler: &str,
    ) -> Result<Self, ConfigurationError> {
        self.add(Route::match_methods(name, methods, path, handler)?)
    }

    /// Register a 302 redirect route.
    pub fn redirect(self, from: &str, to: &str) -> Result<Self, ConfigurationError> {
        self.redirect_with_status(from, to, 302)
    }

    /// Register a 301 redirect route.
    pub fn permanent_redirect(self, from: &str, to: &str) -> Result<Self, ConfigurationError> {
        self.redirect_with_status(from, to, 301)
    }

    /// Register a 307 redirect route.
    pub fn temporary_redirect(self, from: &str, to: &str) -> Result<Self, ConfigurationError> {
        self.redirect_with_status(from, to, 307)
    }

    fn redirect_with_status(
        self,
        from: &str,
        to: &str,
        status: u16,
    ) -> Result<Self, ConfigurationError> {
        use crate::route::HandlerRef;
        use http::Method;
        let name = format!("redirect.{}", from.trim_start_matches('/'));
        let route = Route::new(
            &name,
            vec![Method::GET, Method::HEAD],
            from,
            HandlerRef::Redirect {
                to: to.to_string(),
                status,
            },
        )?;
        self.add(route)
    }

    /// Register the fallback route. Must be the last registration.
    pub fn fallback(self, handler: &str) -> Result<Self, ConfigurationError> {
        let exclusions = self.fallback_exclusions.clone();
        let mut route = Route::get("fallback", "/{fallback_path}", handler)?
            .and("fallback_path", ".+")?;
        route.mark_fallback(exclusions);
        self.add(route)
    }

    /// Open a dashboard block; only `page()` is available inside.
    pub fn dashboard<F>(mut self, configure: F) -> Result<Self, ConfigurationError>
    where
        F: FnOnce(DashboardConfigurator) -> Result<DashboardConfigurator, ConfigurationError>,
    {
        if let Some(staged) = self.staged.take() {
            if !staged.is_empty() {
                return Err(ConfigurationError::UnappliedAttributes {
                    route: "<dashboard>".to_string(),
                });
            }
        }
        let block = DashboardConfigurator {
            inner: self,
            pages: Vec::new(),
        };
        let block = configure(block)?;
        Ok(block.inner)
    }

    /// Finish registration and hand the collection over.
    #[must_use]
    pub fn into_collection(self) -> RouteCollection {
        if let Some(staged) = &self.staged {
            if !staged.is_empty() {
                warn!("configurator dropped with staged attributes that were never applied");
            }
        }
        self.collection
    }
}
