//! Request abstraction handed through the matcher, pipeline and handlers.
//!
//! The crate never owns a network socket; the embedding host parses HTTP
//! and builds a [`Request`] from whatever representation it uses. Matched
//! route parameters and middleware-set attributes travel downstream on the
//! request itself.

use http::Method;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::path::UrlPath;

/// Maximum number of path/query parameters before heap allocation.
/// Most routes carry well under eight parameters.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the matching hot path.
///
/// Names come from the route table and are shared as `Arc<str>`; values are
/// per-request data extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage, `(lowercase-insensitive name, value)`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

/// An in-process HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id, generated when the host does not supply one
    pub id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Normalized request path (leading slash, no duplicate slashes)
    pub path: String,
    /// Query parameters in the order they appeared in the URL
    pub query: ParamVec,
    /// Request headers
    pub headers: HeaderVec,
    /// Parsed body, when the host chose to parse one
    pub body: Option<Value>,
    /// Parameters extracted from the matched route pattern
    pub route_params: ParamVec,
    attributes: HashMap<String, Value>,
}

impl Request {
    /// Create a request for the given method and path.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            id: RequestId::new(),
            method,
            path: UrlPath::parse(path).as_str().to_string(),
            query: ParamVec::new(),
            headers: HeaderVec::new(),
            body: None,
            route_params: ParamVec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Parse a full or root-relative URL into a request.
    ///
    /// Query parameter order is preserved, which matters for signed-URL
    /// validation where the signature covers the exact query string.
    pub fn from_url(method: Method, target: &str) -> Result<Self, url::ParseError> {
        let parsed = if target.starts_with('/') {
            url::Url::parse("http://localhost")?.join(target)?
        } else {
            url::Url::parse(target)?
        };
        let mut request = Request::new(method, parsed.path());
        for (key, value) in parsed.query_pairs() {
            request
                .query
                .push((Arc::from(key.as_ref()), value.into_owned()));
        }
        Ok(request)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((Arc::from(name), value.to_string()));
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Attach a parsed body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a query parameter by name, last occurrence wins.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a matched route parameter by name, last occurrence wins.
    #[must_use]
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by case-insensitive name, per RFC 7230.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Read an attribute previously set by a middleware or the dispatcher.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Store an attribute for downstream consumers.
    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    /// The path plus the query string exactly as it would appear in a URL.
    ///
    /// Used as the canonical form for URL signature validation.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}
