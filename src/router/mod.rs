//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Architecture
//!
//! Matching uses a two-phase approach:
//!
//! 1. **Compilation**: the registered route table (or the one restored
//!    from the [`cache`](RouteCache)) is split into an exact-key static
//!    map, an ordered dynamic list and an optional fallback. Pattern
//!    regexes compile lazily on first use.
//! 2. **Matching**: an incoming method + path is resolved to a
//!    [`MatchOutcome`] with defined precedence — static before dynamic,
//!    registration order among dynamic routes, fallback last — including
//!    method negotiation (405 with the allowed set) and per-route
//!    trailing-slash semantics.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pipewright::routing::RoutingConfigurator;
//! use pipewright::router::UrlMatcher;
//! use pipewright::request::Request;
//! use http::Method;
//!
//! let routes = RoutingConfigurator::new()
//!     .get("pets.show", "/pets/{id}", "show_pet")?
//!     .into_collection();
//! let matcher = UrlMatcher::new(&routes);
//!
//! let request = Request::new(Method::GET, "/pets/123");
//! if let Some(found) = matcher.match_request(&request).matched() {
//!     println!("route: {}", found.route.name());
//!     println!("id: {}", found.param("id").unwrap());
//! }
//! ```

mod cache;
mod matcher;

pub use cache::{RouteCache, CACHE_FORMAT_VERSION};
pub use matcher::{MatchOutcome, RouteMatch, UrlMatcher};
