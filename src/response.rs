//! Response value type and the collaborator traits that produce responses.
//!
//! [`ResponseFactory`] and [`ErrorHandler`] are the two narrow interfaces
//! the pipeline and dispatcher use to turn content and failures into
//! responses. Hosts swap in their own implementations; the defaults here
//! are sufficient for tests and simple embeddings.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::request::{HeaderVec, Request};

/// An in-process HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

impl Response {
    /// Create a response from its parts.
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Set a header, replacing any existing value with the same
    /// case-insensitive name.
    pub fn set_header(&mut self, name: &str, value: String) {
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            entry.1 = value;
        } else {
            self.headers.push((std::sync::Arc::from(name), value));
        }
    }

    /// Get a header by case-insensitive name.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Produces response values from simple content.
pub trait ResponseFactory: Send + Sync {
    /// An HTML response with the given body.
    fn html(&self, body: &str) -> Response;

    /// A JSON response with the given body.
    fn json(&self, body: Value) -> Response;

    /// A redirect to `location` with the given status code.
    fn redirect(&self, location: &str, status: u16) -> Response;

    /// A bodiless response with the given status code.
    fn empty(&self, status: u16) -> Response;
}

/// Default response factory used when the host does not supply one.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResponseFactory;

impl ResponseFactory for DefaultResponseFactory {
    fn html(&self, body: &str) -> Response {
        let mut response = Response::new(200, HeaderVec::new(), Value::String(body.to_string()));
        response.set_header("Content-Type", "text/html; charset=utf-8".to_string());
        response
    }

    fn json(&self, body: Value) -> Response {
        let mut response = Response::new(200, HeaderVec::new(), body);
        response.set_header("Content-Type", "application/json".to_string());
        response
    }

    fn redirect(&self, location: &str, status: u16) -> Response {
        let mut response = Response::new(status, HeaderVec::new(), Value::Null);
        response.set_header("Location", location.to_string());
        response
    }

    fn empty(&self, status: u16) -> Response {
        Response::new(status, HeaderVec::new(), Value::Null)
    }
}

/// Converts a contained middleware/handler failure into a response.
///
/// The pipeline calls [`ErrorHandler::report`] first (the logging side
/// channel) and then [`ErrorHandler::to_response`] to keep producing a
/// response for the request. Production hosts render an error page here;
/// the error itself must never reach the client verbatim.
pub trait ErrorHandler: Send + Sync {
    /// Produce the client-facing response for a contained failure.
    fn to_response(&self, error: &anyhow::Error, request: &Request) -> Response;

    /// Report the failure out-of-band. Default: structured log at `error`.
    fn report(&self, error: &anyhow::Error, request: &Request) {
        error!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            error = %error,
            "request pipeline stage failed"
        );
    }
}

/// Error handler producing a generic 500 JSON body.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn to_response(&self, _error: &anyhow::Error, _request: &Request) -> Response {
        Response::new(
            500,
            HeaderVec::new(),
            serde_json::json!({ "error": "Internal Server Error" }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut response = Response::new(200, HeaderVec::new(), Value::Null);
        response.set_header("Content-Type", "text/plain".to_string());
        response.set_header("content-type", "application/json".to_string());
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.get_header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_default_factory_redirect() {
        let response = DefaultResponseFactory.redirect("/next", 302);
        assert_eq!(response.status, 302);
        assert_eq!(response.get_header("location"), Some("/next"));
    }

    #[test]
    fn test_log_error_handler_hides_details() {
        use http::Method;
        let request = Request::new(Method::GET, "/boom");
        let error = anyhow::anyhow!("secret database password leaked");
        let response = LogErrorHandler.to_response(&error, &request);
        assert_eq!(response.status, 500);
        assert!(!response.body.to_string().contains("secret"));
    }
}
