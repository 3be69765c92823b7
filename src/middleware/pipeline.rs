//! Single-use middleware pipeline.
//!
//! A pipeline value moves through `idle → sent → configured → executed`.
//! [`MiddlewarePipeline::send`] and [`MiddlewarePipeline::through`] are
//! value-to-value transformations; [`MiddlewarePipeline::then`] executes
//! the onion and consumes the stored request. Running `then` again
//! without an intervening `send` is [`PipelineError::Exhausted`] — the
//! guard that stops a pipeline being silently reused across requests in
//! persistent-process deployments.

use std::sync::Arc;

use tracing::debug;

use crate::dispatcher::RequestHandler;
use crate::errors::PipelineError;
use crate::request::Request;
use crate::response::{ErrorHandler, Response};

use super::{Middleware, Next};

/// An ordered, single-use middleware chain around a terminal handler.
pub struct MiddlewarePipeline {
    error_handler: Arc<dyn ErrorHandler>,
    request: Option<Request>,
    stack: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Create an idle pipeline with the given error handler.
    pub fn new(error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            error_handler,
            request: None,
            stack: Vec::new(),
        }
    }

    /// Load a request, arming the pipeline for one execution.
    #[must_use]
    pub fn send(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    /// Set the ordered middleware stack the request will pass through.
    #[must_use]
    pub fn through(mut self, stack: Vec<Arc<dyn Middleware>>) -> Self {
        self.stack = stack;
        self
    }

    /// Execute the stack around the terminal handler.
    ///
    /// Middleware run in the order given to [`through`](Self::through);
    /// the first middleware's post-processing runs last. Every stage
    /// failure is contained and converted via the error handler, so this
    /// always produces a response once a request is loaded.
    pub fn then(&mut self, handler: &dyn RequestHandler) -> Result<Response, PipelineError> {
        let request = self.request.take().ok_or(PipelineError::Exhausted)?;
        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            middleware_count = self.stack.len(),
            "running middleware pipeline"
        );
        let next = Next::new(&self.stack, handler, self.error_handler.as_ref());
        Ok(next.run(request))
    }
}
