//! Normalized URL path value type.
//!
//! Both route patterns and incoming request paths pass through [`UrlPath`]
//! before they are compared, so slash handling is decided in exactly one
//! place: a leading slash is always present, duplicate slashes are
//! collapsed, and the trailing slash is preserved because it is significant
//! to matching (a pattern ending in `/` only matches paths ending in `/`).

use std::borrow::Cow;
use std::fmt;

/// A normalized URL path.
///
/// Invariants held by every constructed value:
/// - starts with `/`
/// - contains no `//` runs
/// - percent-encoding is untouched (decoding is a matcher concern)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlPath(String);

impl UrlPath {
    /// Normalize a raw path string.
    ///
    /// Adds the leading slash when missing and collapses duplicate slashes.
    /// The trailing slash, if any, survives normalization.
    pub fn parse(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len() + 1);
        out.push('/');
        let mut last_was_slash = true;
        for ch in raw.chars() {
            if ch == '/' {
                if !last_was_slash {
                    out.push('/');
                }
                last_was_slash = true;
            } else {
                out.push(ch);
                last_was_slash = false;
            }
        }
        UrlPath(out)
    }

    /// The normalized path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path ends with a slash. The root path `/` is exempt from
    /// trailing-slash semantics and reports `false`.
    #[must_use]
    pub fn has_trailing_slash(&self) -> bool {
        self.0.len() > 1 && self.0.ends_with('/')
    }

    /// Join a prefix and a tail into one normalized path.
    ///
    /// Used by the configurator when group prefixes are applied; the tail's
    /// trailing-slash rule is preserved.
    #[must_use]
    pub fn join(prefix: &str, tail: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let tail = tail.trim_start_matches('/');
        if tail.is_empty() {
            UrlPath::parse(prefix)
        } else {
            UrlPath::parse(&format!("{prefix}/{tail}"))
        }
    }

    /// Percent-decode the path for comparison against route patterns.
    ///
    /// Decoding happens per segment so an encoded slash (`%2F`) stays data
    /// inside its segment instead of becoming path structure: `/files/a%2Fb`
    /// is one `files` segment and one `a/b` value, not three segments. A
    /// decoded segment containing `/` or `%` is re-escaped (`%` first, then
    /// `/`); [`decode_param`] reverses that escape on values captured from
    /// the path. Invalid UTF-8 after decoding leaves a segment untouched;
    /// such a segment can only match the same encoded bytes literally.
    #[must_use]
    pub fn decoded(&self) -> Cow<'_, str> {
        if !self.0.contains('%') {
            return Cow::Borrowed(self.0.as_str());
        }
        let mut out = String::with_capacity(self.0.len());
        for (index, segment) in self.0.split('/').enumerate() {
            if index > 0 {
                out.push('/');
            }
            match urlencoding::decode(segment) {
                Ok(decoded) if decoded.contains('%') || decoded.contains('/') => {
                    out.push_str(&decoded.replace('%', "%25").replace('/', "%2F"));
                }
                Ok(decoded) => out.push_str(&decoded),
                Err(_) => out.push_str(segment),
            }
        }
        Cow::Owned(out)
    }
}

/// Reverse the segment escape applied by [`UrlPath::decoded`] on a value
/// captured from the path.
#[must_use]
pub fn decode_param(value: &str) -> Cow<'_, str> {
    if !value.contains('%') {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace("%2F", "/").replace("%25", "%"))
}

impl fmt::Display for UrlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UrlPath {
    fn from(raw: &str) -> Self {
        UrlPath::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_leading_slash() {
        assert_eq!(UrlPath::parse("foo/bar").as_str(), "/foo/bar");
    }

    #[test]
    fn test_collapses_duplicate_slashes() {
        assert_eq!(UrlPath::parse("//foo///bar").as_str(), "/foo/bar");
    }

    #[test]
    fn test_preserves_trailing_slash() {
        let path = UrlPath::parse("/foo/");
        assert_eq!(path.as_str(), "/foo/");
        assert!(path.has_trailing_slash());
    }

    #[test]
    fn test_root_is_not_trailing() {
        let root = UrlPath::parse("/");
        assert_eq!(root.as_str(), "/");
        assert!(!root.has_trailing_slash());
    }

    #[test]
    fn test_join_merges_slashes() {
        assert_eq!(UrlPath::join("/api/", "/users").as_str(), "/api/users");
        assert_eq!(UrlPath::join("/api", "users/").as_str(), "/api/users/");
        assert_eq!(UrlPath::join("", "users").as_str(), "/users");
        assert_eq!(UrlPath::join("/api", "").as_str(), "/api");
    }

    #[test]
    fn test_decoded_path() {
        assert_eq!(UrlPath::parse("/caf%C3%A9").decoded(), "/café");
        assert_eq!(UrlPath::parse("/files/a%20b").decoded(), "/files/a b");
    }

    #[test]
    fn test_decoded_keeps_encoded_slash_in_its_segment() {
        let path = UrlPath::parse("/files/a%2Fb");
        let decoded = path.decoded();
        assert_eq!(decoded, "/files/a%2Fb");
        assert_eq!(decode_param("a%2Fb"), "a/b");
    }

    #[test]
    fn test_decoded_escape_round_trips_literal_percent() {
        // %252F is the data "%2F", not a slash.
        let path = UrlPath::parse("/files/%252F");
        let decoded = path.decoded();
        assert_eq!(decoded, "/files/%252F");
        assert_eq!(decode_param("%252F"), "%2F");
    }
}
