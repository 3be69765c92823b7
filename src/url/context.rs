//! Per-deployment URL generation context.

use serde::{Deserialize, Serialize};

/// URL scheme the generator may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// The scheme name without the `://` separator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// The default port for the scheme.
    #[must_use]
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Immutable description of the current deployment's host, scheme and
/// ports. Constructed once per request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlGenerationContext {
    host: String,
    scheme: Scheme,
    http_port: u16,
    https_port: u16,
    force_https: bool,
}

impl UrlGenerationContext {
    /// A context serving `https://host` on default ports.
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            scheme: Scheme::Https,
            http_port: 80,
            https_port: 443,
            force_https: false,
        }
    }

    /// A context serving plain `http://host` on default ports.
    pub fn http(host: &str) -> Self {
        Self {
            scheme: Scheme::Http,
            ..Self::new(host)
        }
    }

    /// Use a non-standard port for http URLs.
    #[must_use]
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Use a non-standard port for https URLs.
    #[must_use]
    pub fn with_https_port(mut self, port: u16) -> Self {
        self.https_port = port;
        self
    }

    /// Force every generated URL onto https regardless of the current
    /// request scheme.
    #[must_use]
    pub fn force_https(mut self) -> Self {
        self.force_https = true;
        self
    }

    /// The host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the current request scheme is https.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// Whether https is forced for generated URLs.
    #[must_use]
    pub fn is_https_forced(&self) -> bool {
        self.force_https
    }

    /// The `host[:port]` authority for the given scheme, omitting
    /// default ports.
    #[must_use]
    pub fn authority(&self, scheme: Scheme) -> String {
        let port = match scheme {
            Scheme::Http => self.http_port,
            Scheme::Https => self.https_port,
        };
        if port == scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{port}", self.host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_are_omitted() {
        let ctx = UrlGenerationContext::new("example.com");
        assert_eq!(ctx.authority(Scheme::Https), "example.com");
        assert_eq!(ctx.authority(Scheme::Http), "example.com");
    }

    #[test]
    fn test_non_standard_ports_appear() {
        let ctx = UrlGenerationContext::new("example.com")
            .with_https_port(8443)
            .with_http_port(8080);
        assert_eq!(ctx.authority(Scheme::Https), "example.com:8443");
        assert_eq!(ctx.authority(Scheme::Http), "example.com:8080");
    }

    #[test]
    fn test_http_context_is_insecure() {
        assert!(!UrlGenerationContext::http("example.com").is_secure());
        assert!(UrlGenerationContext::new("example.com").is_secure());
    }
}
