//! # Middleware Module
//!
//! Composable request/response interception around the terminal route
//! handler.
//!
//! Three pieces cooperate here:
//!
//! - [`Middleware`] / [`Next`] — the onion-style interception trait. A
//!   middleware receives the request plus a continuation over the rest of
//!   the stack; it can pre-process, short-circuit, or post-process.
//! - [`MiddlewareBlueprint`] / [`MiddlewareFactory`] — declarative
//!   references (tag + scalar args) stored on routes and resolved into
//!   instances through a registry backed by the dependency container.
//! - [`MiddlewarePipeline`] — the single-use execution of a stack around
//!   a handler, with per-stage error containment.

mod blueprint;
mod core;
mod factory;
mod pipeline;

pub use blueprint::{ConfigValue, MiddlewareBlueprint};
pub use core::{Middleware, Next};
pub use factory::{MiddlewareConstructor, MiddlewareFactory, MiddlewareResolveError};
pub use pipeline::MiddlewarePipeline;
