//! Signed, expiring URLs.
//!
//! A signed URL carries two extra query parameters: `expires` (unix
//! seconds) and `signature` (HMAC-SHA256 over the canonical path and
//! query, base64url without padding). The signature covers the path, the
//! full query including `expires`, and nothing else; fragments and the
//! scheme/authority are excluded so the same link validates behind any
//! proxy or host alias.
//!
//! Canonicalization decodes the query and re-encodes it with one fixed
//! encoder on both the signing and validating side, so cosmetic encoding
//! differences (`%20` vs `+`) never break a valid link.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::errors::UrlGenerationError;
use crate::request::Request;
use crate::url::generator::{ParamValue, UrlGenerator, UrlKind};

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the expiry timestamp.
pub const EXPIRES_KEY: &str = "expires";
/// Query parameter carrying the signature itself.
pub const SIGNATURE_KEY: &str = "signature";

/// Failure to produce a signed URL.
#[derive(Debug)]
pub enum SigningError {
    /// The target string could not be parsed as a URL or path.
    InvalidTarget(url::ParseError),
    /// Reverse routing for the named route failed.
    Generation(UrlGenerationError),
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningError::InvalidTarget(err) => {
                write!(f, "url signing error: target is not a valid URL: {err}")
            }
            SigningError::Generation(err) => write!(f, "url signing error: {err}"),
        }
    }
}

impl std::error::Error for SigningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SigningError::InvalidTarget(err) => Some(err),
            SigningError::Generation(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for SigningError {
    fn from(err: url::ParseError) -> Self {
        SigningError::InvalidTarget(err)
    }
}

impl From<UrlGenerationError> for SigningError {
    fn from(err: UrlGenerationError) -> Self {
        SigningError::Generation(err)
    }
}

/// Produces and validates signed URLs with a shared secret.
pub struct UrlSigner {
    key: Vec<u8>,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    /// Sign a path or URL, valid for `lifetime` from now.
    pub fn sign(&self, target: &str, lifetime: Duration) -> Result<String, SigningError> {
        self.sign_at(target, now_unix().saturating_add(lifetime.as_secs()))
    }

    /// Sign a path or URL with an explicit expiry timestamp (unix seconds).
    pub fn sign_at(&self, target: &str, expires_unix: u64) -> Result<String, SigningError> {
        let (without_fragment, fragment) = match target.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (target, None),
        };

        let parsed = if without_fragment.starts_with('/') {
            url::Url::parse("http://canonical.invalid")?.join(without_fragment)?
        } else {
            url::Url::parse(without_fragment)?
        };
        let host_prefix = if without_fragment.starts_with('/') {
            String::new()
        } else {
            let authority = parsed
                .host_str()
                .map(|host| match parsed.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                })
                .unwrap_or_default();
            format!("{}://{authority}", parsed.scheme())
        };

        let mut pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.push((EXPIRES_KEY.to_string(), expires_unix.to_string()));

        let canonical = canonicalize(parsed.path(), &pairs);
        let signature = self.mac_base64(&canonical);

        let mut signed = format!("{host_prefix}{canonical}&{SIGNATURE_KEY}={signature}");
        if let Some(fragment) = fragment {
            signed.push('#');
            signed.push_str(fragment);
        }
        Ok(signed)
    }

    /// Generate a named route URL and sign it.
    pub fn sign_route(
        &self,
        generator: &UrlGenerator,
        name: &str,
        params: &[(&str, ParamValue)],
        lifetime: Duration,
    ) -> Result<String, SigningError> {
        let url = generator.to_route(name, params, UrlKind::AbsolutePath, None)?;
        self.sign(&url, lifetime)
    }

    /// Whether the request carries a currently valid signature.
    #[must_use]
    pub fn has_valid_signature(&self, request: &Request) -> bool {
        self.has_valid_signature_at(request, now_unix())
    }

    /// Signature check against an explicit clock, for deterministic tests
    /// and host environments with their own time source.
    #[must_use]
    pub fn has_valid_signature_at(&self, request: &Request, now_unix: u64) -> bool {
        let Some(signature) = request.query_param(SIGNATURE_KEY) else {
            return false;
        };
        let Some(expires) = request.query_param(EXPIRES_KEY) else {
            return false;
        };
        let Ok(expires) = expires.parse::<u64>() else {
            return false;
        };
        if now_unix >= expires {
            return false;
        }
        let Ok(provided) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };

        let pairs: Vec<(String, String)> = request
            .query
            .iter()
            .filter(|(k, _)| k.as_ref() != SIGNATURE_KEY)
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let canonical = canonicalize(&request.path, &pairs);

        let mut mac = self.mac();
        mac.update(canonical.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&provided).is_ok()
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length")
    }

    fn mac_base64(&self, canonical: &str) -> String {
        let mut mac = self.mac();
        mac.update(canonical.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

/// One fixed rendering of a path and decoded query pairs.
fn canonicalize(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_signed_url_round_trips() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/download?file=report", 2_000_000_000).unwrap();
        assert!(signed.contains("expires=2000000000"));
        assert!(signed.contains("signature="));

        let request = Request::from_url(Method::GET, &signed).unwrap();
        assert!(signer.has_valid_signature_at(&request, 1_999_999_999));
    }

    #[test]
    fn test_tampered_query_fails() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/download?file=report", 2_000_000_000).unwrap();
        let tampered = signed.replace("file=report", "file=secrets");
        let request = Request::from_url(Method::GET, &tampered).unwrap();
        assert!(!signer.has_valid_signature_at(&request, 0));
    }

    #[test]
    fn test_tampered_path_fails() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/download", 2_000_000_000).unwrap();
        let tampered = signed.replace("/download", "/admin");
        let request = Request::from_url(Method::GET, &tampered).unwrap();
        assert!(!signer.has_valid_signature_at(&request, 0));
    }

    #[test]
    fn test_tampered_expiry_fails() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/download", 2_000_000_000).unwrap();
        let tampered = signed.replace("expires=2000000000", "expires=3000000000");
        let request = Request::from_url(Method::GET, &tampered).unwrap();
        assert!(!signer.has_valid_signature_at(&request, 0));
    }

    #[test]
    fn test_expired_signature_fails() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/download", 1000).unwrap();
        let request = Request::from_url(Method::GET, &signed).unwrap();
        assert!(signer.has_valid_signature_at(&request, 999));
        assert!(!signer.has_valid_signature_at(&request, 1000));
        assert!(!signer.has_valid_signature_at(&request, 1001));
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/download", 2_000_000_000).unwrap();
        let request = Request::from_url(Method::GET, &signed).unwrap();
        assert!(!UrlSigner::new("other").has_valid_signature_at(&request, 0));
    }

    #[test]
    fn test_missing_signature_fails() {
        let signer = UrlSigner::new("secret");
        let request = Request::from_url(Method::GET, "/download?expires=2000000000").unwrap();
        assert!(!signer.has_valid_signature_at(&request, 0));
    }

    #[test]
    fn test_absolute_target_signature_is_host_independent() {
        let signer = UrlSigner::new("secret");
        let signed = signer
            .sign_at("https://example.com/download?x=1", 2_000_000_000)
            .unwrap();
        assert!(signed.starts_with("https://example.com/download"));
        // Same path and query behind a different host still validates.
        let relative = signed.replace("https://example.com", "");
        let request = Request::from_url(Method::GET, &relative).unwrap();
        assert!(signer.has_valid_signature_at(&request, 0));
    }

    #[test]
    fn test_fragment_is_excluded_and_preserved() {
        let signer = UrlSigner::new("secret");
        let signed = signer.sign_at("/docs#install", 2_000_000_000).unwrap();
        assert!(signed.ends_with("#install"));
        let request = Request::from_url(Method::GET, signed.trim_end_matches("#install")).unwrap();
        assert!(signer.has_valid_signature_at(&request, 0));
    }
}
