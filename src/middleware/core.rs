//! The middleware trait and its continuation.
//!
//! Middleware wrap the remainder of the stack as a [`Next`] continuation
//! (classic onion order): a middleware may call `next.run(request)` and
//! post-process the returned response, or return its own response without
//! calling `next`, which short-circuits everything further in. A failing
//! stage is contained exactly where it failed — the continuation converts
//! the error through the injected [`ErrorHandler`] and the resulting
//! response still flows back out through the middleware that already ran.

use std::sync::Arc;

use crate::dispatcher::RequestHandler;
use crate::request::Request;
use crate::response::{ErrorHandler, Response};

/// A composable request/response interceptor.
pub trait Middleware: Send + Sync {
    /// Process the request.
    ///
    /// Call `next.run(request)` to continue down the stack, or return a
    /// response directly to short-circuit. Errors are contained by the
    /// caller and converted via the pipeline's error handler.
    fn handle(&self, request: Request, next: Next<'_>) -> anyhow::Result<Response>;
}

/// Continuation over the remaining middleware stack and terminal handler.
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    handler: &'a dyn RequestHandler,
    error_handler: &'a dyn ErrorHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        stack: &'a [Arc<dyn Middleware>],
        handler: &'a dyn RequestHandler,
        error_handler: &'a dyn ErrorHandler,
    ) -> Self {
        Self {
            stack,
            handler,
            error_handler,
        }
    }

    /// Run the rest of the stack (and finally the terminal handler) for
    /// the given request, producing a response.
    ///
    /// Each stage's failure is converted to a response at that stage;
    /// already-completed middleware are never re-entered.
    pub fn run(self, request: Request) -> Response {
        match self.stack.split_first() {
            Some((middleware, rest)) => {
                let next = Next::new(rest, self.handler, self.error_handler);
                let at_failure = request.clone();
                match middleware.handle(request, next) {
                    Ok(response) => response,
                    Err(error) => {
                        self.error_handler.report(&error, &at_failure);
                        self.error_handler.to_response(&error, &at_failure)
                    }
                }
            }
            None => {
                let at_failure = request.clone();
                match self.handler.handle(request) {
                    Ok(response) => response,
                    Err(error) => {
                        self.error_handler.report(&error, &at_failure);
                        self.error_handler.to_response(&error, &at_failure)
                    }
                }
            }
        }
    }
}
