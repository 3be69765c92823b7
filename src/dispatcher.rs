//! Request dispatch: from a match outcome to a response.
//!
//! The dispatcher owns the handler registry and the collaborators needed
//! to turn a [`MatchOutcome`] into a [`Response`]: the middleware factory
//! that materializes each route's blueprint stack, a [`ResponseFactory`]
//! for redirects and negotiation responses, and the [`ErrorHandler`] the
//! pipeline contains failures with.
//!
//! Dispatch returns `Option<Response>`: `None` means the request is not
//! ours (no route matched, or the route explicitly delegates) and the
//! embedding host should keep handling it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::middleware::{MiddlewareFactory, MiddlewarePipeline};
use crate::request::Request;
use crate::response::{DefaultResponseFactory, ErrorHandler, LogErrorHandler, Response, ResponseFactory};
use crate::route::HandlerRef;
use crate::router::{MatchOutcome, RouteMatch};

/// Terminal request handler at the center of the middleware onion.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: Request) -> anyhow::Result<Response>;
}

impl<F> RequestHandler for F
where
    F: Fn(Request) -> anyhow::Result<Response> + Send + Sync,
{
    fn handle(&self, request: Request) -> anyhow::Result<Response> {
        self(request)
    }
}

/// Resolves match outcomes to responses through the middleware pipeline.
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
    middleware: Arc<MiddlewareFactory>,
    responses: Arc<dyn ResponseFactory>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl Dispatcher {
    /// Create a dispatcher with default response and error collaborators.
    pub fn new(middleware: Arc<MiddlewareFactory>) -> Self {
        Self {
            handlers: HashMap::new(),
            middleware,
            responses: Arc::new(DefaultResponseFactory),
            error_handler: Arc::new(LogErrorHandler),
        }
    }

    /// Swap in the host's response factory.
    #[must_use]
    pub fn with_response_factory(mut self, responses: Arc<dyn ResponseFactory>) -> Self {
        self.responses = responses;
        self
    }

    /// Swap in the host's error handler.
    #[must_use]
    pub fn with_error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }

    /// Register a handler under the name routes reference it by.
    pub fn register_handler(&mut self, name: &str, handler: impl RequestHandler + 'static) {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    /// Whether a handler is registered under the name.
    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Turn a match outcome into a response.
    ///
    /// `None` delegates the request back to the host (no match, or a
    /// delegate route). Everything else is a response, including contained
    /// middleware/handler failures and 405 negotiation.
    pub fn dispatch(&self, outcome: &MatchOutcome, request: Request) -> Option<Response> {
        match outcome {
            MatchOutcome::NotFound => {
                debug!(
                    request_id = %request.id,
                    path = %request.path,
                    "no route matched; delegating to host"
                );
                None
            }
            MatchOutcome::MethodNotAllowed { allowed } => {
                let mut response = self.responses.empty(405);
                let allow = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                response.set_header("Allow", allow);
                Some(response)
            }
            MatchOutcome::Matched(found) => self.run_matched(found, request),
        }
    }

    fn run_matched(&self, found: &RouteMatch, mut request: Request) -> Option<Response> {
        let route = &found.route;
        if matches!(route.handler(), HandlerRef::Delegate) {
            debug!(
                request_id = %request.id,
                route = %route.name(),
                "route delegates to host"
            );
            return None;
        }

        request.route_params = found.params.clone();
        request.set_attribute("route", serde_json::Value::String(route.name().to_string()));
        info!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            route = %route.name(),
            "dispatching request"
        );

        let at_failure = request.clone();
        let stack = match self.middleware.resolve_stack(route.middleware_stack()) {
            Ok(stack) => stack,
            Err(error) => {
                let error = anyhow::Error::new(error);
                self.error_handler.report(&error, &at_failure);
                return Some(self.error_handler.to_response(&error, &at_failure));
            }
        };

        let terminal: Arc<dyn RequestHandler> = match route.handler() {
            HandlerRef::Named { name } => match self.handlers.get(name) {
                Some(handler) => Arc::clone(handler),
                None => {
                    warn!(route = %route.name(), handler = %name, "no handler registered");
                    Arc::new(UnknownHandler { name: name.clone() })
                }
            },
            HandlerRef::Redirect { to, status } => Arc::new(RedirectHandler {
                responses: Arc::clone(&self.responses),
                to: to.clone(),
                status: *status,
            }),
            HandlerRef::Delegate => return None,
        };

        let mut pipeline = MiddlewarePipeline::new(Arc::clone(&self.error_handler))
            .send(request)
            .through(stack);
        match pipeline.then(terminal.as_ref()) {
            Ok(response) => Some(response),
            Err(error) => {
                // A freshly sent pipeline cannot be exhausted.
                let error = anyhow::Error::new(error);
                self.error_handler.report(&error, &at_failure);
                Some(self.error_handler.to_response(&error, &at_failure))
            }
        }
    }
}

/// Stand-in for a handler name with no registration, so the failure is
/// contained by the pipeline like any other stage failure.
struct UnknownHandler {
    name: String,
}

impl RequestHandler for UnknownHandler {
    fn handle(&self, _request: Request) -> anyhow::Result<Response> {
        Err(anyhow::anyhow!(
            "no handler registered under the name '{}'",
            self.name
        ))
    }
}

/// Terminal handler for redirect routes.
struct RedirectHandler {
    responses: Arc<dyn ResponseFactory>,
    to: String,
    status: u16,
}

impl RequestHandler for RedirectHandler {
    fn handle(&self, _request: Request) -> anyhow::Result<Response> {
        Ok(self.responses.redirect(&self.to, self.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::TypeRegistry;
    use crate::request::ParamVec;
    use crate::route::Route;
    use http::Method;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        let factory = MiddlewareFactory::new(Arc::new(TypeRegistry::new()));
        Dispatcher::new(Arc::new(factory))
    }

    fn matched(route: Route) -> MatchOutcome {
        MatchOutcome::Matched(RouteMatch {
            route: Arc::new(route),
            params: ParamVec::new(),
        })
    }

    #[test]
    fn test_named_handler_runs() {
        let mut dispatcher = dispatcher();
        dispatcher.register_handler("hello", |_req: Request| {
            Ok(Response::new(
                200,
                crate::request::HeaderVec::new(),
                json!("hi"),
            ))
        });
        let outcome = matched(Route::get("hello", "/hello", "hello").unwrap());
        let response = dispatcher
            .dispatch(&outcome, Request::new(Method::GET, "/hello"))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!("hi"));
    }

    #[test]
    fn test_not_found_delegates() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch(&MatchOutcome::NotFound, Request::new(Method::GET, "/"));
        assert!(response.is_none());
    }

    #[test]
    fn test_method_not_allowed_carries_allow_header() {
        let dispatcher = dispatcher();
        let outcome = MatchOutcome::MethodNotAllowed {
            allowed: vec![Method::GET, Method::POST],
        };
        let response = dispatcher
            .dispatch(&outcome, Request::new(Method::DELETE, "/x"))
            .unwrap();
        assert_eq!(response.status, 405);
        assert_eq!(response.get_header("allow"), Some("GET, POST"));
    }

    #[test]
    fn test_redirect_route() {
        let dispatcher = dispatcher();
        let route = Route::new(
            "redirect.old",
            vec![Method::GET],
            "/old",
            HandlerRef::Redirect {
                to: "/new".to_string(),
                status: 301,
            },
        )
        .unwrap();
        let response = dispatcher
            .dispatch(&matched(route), Request::new(Method::GET, "/old"))
            .unwrap();
        assert_eq!(response.status, 301);
        assert_eq!(response.get_header("location"), Some("/new"));
    }

    #[test]
    fn test_delegate_route_yields_none() {
        let dispatcher = dispatcher();
        let route = Route::new(
            "host.page",
            vec![Method::GET],
            "/page",
            HandlerRef::Delegate,
        )
        .unwrap();
        let response = dispatcher.dispatch(&matched(route), Request::new(Method::GET, "/page"));
        assert!(response.is_none());
    }

    #[test]
    fn test_unregistered_handler_is_contained() {
        let dispatcher = dispatcher();
        let outcome = matched(Route::get("ghost", "/ghost", "ghost").unwrap());
        let response = dispatcher
            .dispatch(&outcome, Request::new(Method::GET, "/ghost"))
            .unwrap();
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_route_params_reach_the_handler() {
        let mut dispatcher = dispatcher();
        dispatcher.register_handler("show", |req: Request| {
            Ok(Response::new(
                200,
                crate::request::HeaderVec::new(),
                json!(req.route_param("id")),
            ))
        });
        let route = Route::get("users.show", "/users/{id}", "show").unwrap();
        let params = route.pattern().match_path("/users/42").unwrap();
        let outcome = MatchOutcome::Matched(RouteMatch {
            route: Arc::new(route),
            params,
        });
        let response = dispatcher
            .dispatch(&outcome, Request::new(Method::GET, "/users/42"))
            .unwrap();
        assert_eq!(response.body, json!("42"));
    }
}
