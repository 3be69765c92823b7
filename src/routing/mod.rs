//! # Routing Module
//!
//! Route registration: the ordered [`RouteCollection`] with its
//! registration-time invariants, and the fluent [`RoutingConfigurator`]
//! surface (groups, prefixes, names, namespaces, middleware attribution,
//! dashboard/fallback/redirect sub-flows) that emits routes into it.
//!
//! Registration happens once per process. Afterwards the collection is
//! read-only: the matcher, generator and dispatcher all borrow it through
//! `Arc` and never mutate it during request handling.

mod collection;
mod configurator;
mod dashboard;

pub use collection::RouteCollection;
pub use configurator::{RoutingConfigurator, DEFAULT_FALLBACK_EXCLUSIONS};
pub use dashboard::{DashboardConfigurator, MenuEntry, MenuRegistry, NullMenuRegistry};
