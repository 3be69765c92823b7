//! Ordered route storage with a name index.
//!
//! The collection is built once during bootstrap (or restored from the
//! route cache) and read-only afterwards. Registration-time invariants
//! live here: duplicate static path+method registrations are rejected,
//! nothing may follow the fallback route, and a cache-backed collection
//! refuses further additions outright.
//!
//! Name collisions follow last-registered-wins semantics: the name index
//! points at the newest route of that name, while earlier same-named
//! routes stay in the ordered sequence and remain path-matchable.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::errors::ConfigurationError;
use crate::route::Route;

/// The ordered set of registered routes.
#[derive(Default)]
pub struct RouteCollection {
    routes: Vec<Arc<Route>>,
    by_name: HashMap<String, usize>,
    locked: bool,
    has_fallback: bool,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// Enforces the collection invariants; see the module docs.
    pub fn add(&mut self, route: Route) -> Result<(), ConfigurationError> {
        if self.locked {
            return Err(ConfigurationError::CacheLocked {
                route: route.name().to_string(),
            });
        }
        if self.has_fallback {
            if route.is_fallback() {
                return Err(ConfigurationError::DuplicateFallback);
            }
            return Err(ConfigurationError::RouteAfterFallback {
                route: route.name().to_string(),
            });
        }
        if route.pattern().is_static() {
            self.check_static_conflict(&route)?;
        }
        if route.is_fallback() {
            self.has_fallback = true;
        }
        let index = self.routes.len();
        self.by_name.insert(route.name().to_string(), index);
        self.routes.push(Arc::new(route));
        Ok(())
    }

    fn check_static_conflict(&self, route: &Route) -> Result<(), ConfigurationError> {
        for existing in &self.routes {
            if !existing.pattern().is_static() || existing.pattern().raw() != route.pattern().raw()
            {
                continue;
            }
            if let Some(method) = route
                .methods()
                .iter()
                .find(|m| existing.methods().contains(m))
            {
                return Err(ConfigurationError::DuplicateStaticRoute {
                    path: route.pattern().raw().to_string(),
                    method: method.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look a route up by name. Returns the last-registered route when a
    /// name was registered more than once.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Route>> {
        self.by_name
            .get(name)
            .and_then(|&index| self.routes.get(index))
            .map(Arc::clone)
    }

    /// Iterate routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// The fallback route, if one was registered.
    #[must_use]
    pub fn fallback(&self) -> Option<Arc<Route>> {
        self.routes.iter().find(|r| r.is_fallback()).map(Arc::clone)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether the collection refuses further registrations.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Snapshot the routes for cache serialization.
    #[must_use]
    pub(crate) fn snapshot(&self) -> Vec<Route> {
        self.routes.iter().map(|r| Route::clone(r)).collect()
    }

    /// Rebuild a collection from cached routes and lock it.
    pub(crate) fn from_cached(routes: Vec<Route>) -> Result<Self, ConfigurationError> {
        let mut collection = RouteCollection::new();
        for route in routes {
            collection.add(route)?;
        }
        collection.locked = true;
        info!(
            routes_count = collection.len(),
            "route collection restored from cache and locked"
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_duplicate_name_replaces_lookup_keeps_order() {
        let mut collection = RouteCollection::new();
        collection.add(Route::get("home", "/first", "a").unwrap()).unwrap();
        collection.add(Route::get("home", "/second", "b").unwrap()).unwrap();
        assert_eq!(collection.len(), 2);
        let found = collection.find_by_name("home").unwrap();
        assert_eq!(found.pattern().raw(), "/second");
    }

    #[test]
    fn test_duplicate_static_route_rejected() {
        let mut collection = RouteCollection::new();
        collection.add(Route::get("a", "/users", "a").unwrap()).unwrap();
        let err = collection
            .add(Route::get("b", "/users", "b").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateStaticRoute {
                path: "/users".to_string(),
                method: Method::GET,
            }
        );
    }

    #[test]
    fn test_same_static_path_different_method_allowed() {
        let mut collection = RouteCollection::new();
        collection.add(Route::get("a", "/users", "list").unwrap()).unwrap();
        assert!(collection
            .add(Route::post("b", "/users", "create").unwrap())
            .is_ok());
    }

    #[test]
    fn test_dynamic_may_shadow_static_prefix() {
        let mut collection = RouteCollection::new();
        collection.add(Route::get("a", "/users/me", "me").unwrap()).unwrap();
        assert!(collection
            .add(Route::get("b", "/users/{id}", "show").unwrap())
            .is_ok());
    }

    #[test]
    fn test_locked_collection_rejects_additions() {
        let mut collection =
            RouteCollection::from_cached(vec![Route::get("a", "/a", "a").unwrap()]).unwrap();
        let err = collection
            .add(Route::get("b", "/b", "b").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::CacheLocked { .. }));
    }
}
