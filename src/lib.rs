//! # Pipewright
//!
//! **Pipewright** is an embeddable URL router and middleware pipeline for
//! Rust applications that sit inside a larger host environment. The host
//! owns the network and the process model; pipewright owns route
//! registration, request matching, middleware execution, reverse routing
//! and signed URLs.
//!
//! ## Overview
//!
//! Everything starts from a declarative route table. Routes are plain
//! serializable values: a name, a method set, a URL pattern, a handler
//! *reference* and declarative middleware/condition *blueprints*. Nothing
//! dynamic lives on the route itself, which is what makes the on-disk
//! route cache possible — the whole table round-trips through JSON and
//! every callable is re-resolved by name or tag at dispatch time.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`routing`]** - Route registration: the ordered collection and the
//!   fluent configurator (groups, prefixes, names, namespaces, dashboard
//!   and fallback sub-flows)
//! - **[`route`]** - The route data model: patterns, handler references,
//!   conditions, menu metadata
//! - **[`router`]** - Path matching with static-first precedence, method
//!   negotiation and the versioned route cache
//! - **[`middleware`]** - Blueprints, the tag-keyed factory and the
//!   single-use onion pipeline
//! - **[`dispatcher`]** - The handler registry and the glue from a match
//!   outcome to a response
//! - **[`url`]** - Reverse routing and HMAC-signed, expiring URLs
//! - **[`container`]** - The minimal dependency container middleware and
//!   condition constructors draw collaborators from
//!
//! ## Request Handling Flow
//!
//! 1. The host parses HTTP and builds a [`request::Request`].
//! 2. [`router::UrlMatcher::match_request`] resolves it to a
//!    [`router::MatchOutcome`] — static routes first, then dynamic routes
//!    in registration order, then the fallback.
//! 3. [`dispatcher::Dispatcher::dispatch`] materializes the route's
//!    middleware stack through the [`middleware::MiddlewareFactory`] and
//!    runs the request through a [`middleware::MiddlewarePipeline`]
//!    around the terminal handler.
//! 4. A `None` from dispatch means the request was never ours; the host
//!    keeps handling it. Everything else is a [`response::Response`],
//!    including contained stage failures.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http::Method;
//! use pipewright::dispatcher::Dispatcher;
//! use pipewright::request::Request;
//! use pipewright::router::UrlMatcher;
//! use pipewright::routing::RoutingConfigurator;
//!
//! let routes = RoutingConfigurator::new()
//!     .get("home", "/", "home")?
//!     .get("users.show", "/users/{id}", "show_user")?
//!     .into_collection();
//!
//! let matcher = UrlMatcher::new(&routes);
//! let request = Request::new(Method::GET, "/users/7");
//! let outcome = matcher.match_request(&request);
//! let response = dispatcher.dispatch(&outcome, request);
//! ```
//!
//! ## Host Considerations
//!
//! Pipewright never spawns threads or owns sockets. All matching state is
//! immutable after registration and shared via `Arc`, so a single matcher,
//! generator and dispatcher can serve concurrent requests from whatever
//! execution model the host uses.

pub mod container;
pub mod dispatcher;
pub mod errors;
pub mod middleware;
pub mod path;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod routing;
pub mod url;

pub use dispatcher::{Dispatcher, RequestHandler};
pub use errors::{ConfigurationError, PipelineError, UrlGenerationError};
pub use request::Request;
pub use response::Response;
pub use route::Route;
pub use router::{MatchOutcome, RouteCache, RouteMatch, UrlMatcher};
pub use routing::{RouteCollection, RoutingConfigurator};
pub use url::{UrlGenerationContext, UrlGenerator, UrlSigner};
