//! Dashboard-area routing.
//!
//! Dashboard routes live under the host's admin prefix and double as menu
//! entries in the host's navigation. Inside a
//! [`dashboard`](super::RoutingConfigurator::dashboard) block only
//! [`DashboardConfigurator::page`] is available: pages answer GET only,
//! their paths are auto-prefixed with the configured dashboard prefix, and
//! their menu metadata is validated and handed to the host through the
//! [`MenuRegistry`] adapter.

use tracing::debug;

use crate::errors::ConfigurationError;
use crate::route::{MenuItem, Route};

use super::RoutingConfigurator;

/// A validated menu entry handed to the host when a dashboard page is
/// registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Page (route) name
    pub page: String,
    /// Menu title
    pub title: String,
    /// Parent page name for nested entries
    pub parent: Option<String>,
    /// Full path under the dashboard prefix
    pub path: String,
}

/// Host adapter receiving dashboard menu registrations.
pub trait MenuRegistry: Send + Sync {
    /// Record a menu entry in the host's navigation.
    fn register(&self, entry: &MenuEntry);
}

/// Menu registry that drops all registrations. The default for tests and
/// hosts without a navigation menu.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMenuRegistry;

impl MenuRegistry for NullMenuRegistry {
    fn register(&self, _entry: &MenuEntry) {}
}

/// Restricted configurator available inside a dashboard block.
pub struct DashboardConfigurator {
    pub(super) inner: RoutingConfigurator,
    /// Pages registered so far in this block, with the parent each declared.
    pub(super) pages: Vec<(String, Option<String>)>,
}

impl DashboardConfigurator {
    /// Register a dashboard page.
    ///
    /// The path is joined under the dashboard prefix and the route answers
    /// GET only. When `menu` names a parent, that parent must be a page
    /// registered earlier in the same dashboard block and must itself be
    /// top-level: menus nest exactly one level deep.
    pub fn page(
        mut self,
        name: &str,
        path: &str,
        handler: &str,
        menu: Option<MenuItem>,
    ) -> Result<Self, ConfigurationError> {
        if let Some(menu) = &menu {
            if let Some(parent) = &menu.parent {
                match self.pages.iter().find(|(p, _)| p == parent) {
                    None => {
                        return Err(ConfigurationError::UnknownMenuParent {
                            page: name.to_string(),
                            parent: parent.clone(),
                        });
                    }
                    Some((_, Some(_))) => {
                        return Err(ConfigurationError::ConflictingMenuParent {
                            page: name.to_string(),
                            parent: parent.clone(),
                        });
                    }
                    Some((_, None)) => {}
                }
            }
        }

        let prefix = self.inner.dashboard_prefix.clone();
        let mut route = Route::get(name, path, handler)?.apply_prefix(&prefix)?;
        let full_path = route.pattern().raw().to_string();
        if let Some(menu) = menu.clone() {
            route.set_menu(menu);
        }
        self.inner = self.inner.add(route)?;
        self.pages
            .push((name.to_string(), menu.as_ref().and_then(|m| m.parent.clone())));

        if let Some(menu) = menu {
            let entry = MenuEntry {
                page: name.to_string(),
                title: menu.title,
                parent: menu.parent,
                path: full_path,
            };
            debug!(page = %entry.page, path = %entry.path, "registering dashboard menu entry");
            self.inner.menu_registry.register(&entry);
        }
        Ok(self)
    }
}
