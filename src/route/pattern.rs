//! Route pattern parsing and compilation.
//!
//! Transforms declarative patterns like `/users/{id}` or
//! `/archive/{year}/{month?}` into compiled regexes that match a request
//! path and extract named parameters. Compilation happens in two phases:
//!
//! 1. **Parse** (registration time): the pattern string is split into
//!    static and parameter segments, placeholder syntax and requirement
//!    regexes are validated, and structural errors are rejected with a
//!    [`ConfigurationError`].
//! 2. **Compile** (first match): the segments are assembled into a single
//!    anchored regex with one named capture group per parameter. The
//!    compiled regex is cached and recomputed lazily after a pattern is
//!    loaded back from the route cache.
//!
//! Parameter captures default to `[^/]+` (a segment value never spans a
//! slash); a requirement regex attached via [`PathPattern::add_requirement`]
//! replaces that default for its segment. `{name?}` marks a segment
//! optional; every segment after an optional one is itself treated as
//! optional, and a static segment after an optional one is rejected as
//! unmatchable.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::ConfigurationError;
use crate::path::UrlPath;
use crate::request::ParamVec;

/// One parsed segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// A literal path segment matched verbatim.
    Static(String),
    /// A `{name}` or `{name?}` placeholder.
    Param {
        /// Capture name
        name: String,
        /// Whether the segment may be omitted from the path
        optional: bool,
    },
}

/// A parsed, lazily compiled route pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    requirements: BTreeMap<String, String>,
    trailing_slash: bool,
    #[serde(skip)]
    compiled: OnceCell<Regex>,
}

impl PathPattern {
    /// Parse a pattern string.
    ///
    /// Rejects malformed placeholders, duplicate parameter names and
    /// static segments that follow an optional parameter.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let path = UrlPath::parse(raw);
        let trailing_slash = path.has_trailing_slash();

        let mut segments = Vec::new();
        let mut seen_optional = false;
        for part in path.as_str().split('/').filter(|p| !p.is_empty()) {
            if part.starts_with('{') && part.ends_with('}') {
                let inner = &part[1..part.len() - 1];
                let (name, optional) = match inner.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if name.is_empty() || !is_valid_param_name(name) {
                    return Err(ConfigurationError::InvalidPattern {
                        pattern: raw.to_string(),
                        reason: format!(
                            "'{part}' is not a valid parameter placeholder; names must \
                            match [A-Za-z_][A-Za-z0-9_]*"
                        ),
                    });
                }
                if segments.iter().any(|s| matches!(s, Segment::Param { name: n, .. } if n == name))
                {
                    return Err(ConfigurationError::InvalidPattern {
                        pattern: raw.to_string(),
                        reason: format!("parameter '{name}' appears more than once"),
                    });
                }
                // Everything after an optional segment is itself optional.
                let optional = optional || seen_optional;
                seen_optional = seen_optional || optional;
                segments.push(Segment::Param {
                    name: name.to_string(),
                    optional,
                });
            } else {
                if part.contains('{') || part.contains('}') {
                    return Err(ConfigurationError::InvalidPattern {
                        pattern: raw.to_string(),
                        reason: format!(
                            "segment '{part}' mixes literal text and placeholder braces"
                        ),
                    });
                }
                if seen_optional {
                    return Err(ConfigurationError::InvalidPattern {
                        pattern: raw.to_string(),
                        reason: format!(
                            "static segment '{part}' cannot follow an optional parameter"
                        ),
                    });
                }
                segments.push(Segment::Static(part.to_string()));
            }
        }

        Ok(Self {
            raw: path.as_str().to_string(),
            segments,
            requirements: BTreeMap::new(),
            trailing_slash,
            compiled: OnceCell::new(),
        })
    }

    /// Attach a requirement regex to a named parameter.
    ///
    /// The regex is anchored around the whole segment value at compile
    /// time, so `[a]+` means "the entire segment is one or more `a`".
    pub fn add_requirement(
        &mut self,
        name: &str,
        requirement: &str,
    ) -> Result<(), ConfigurationError> {
        if !self
            .segments
            .iter()
            .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name))
        {
            return Err(ConfigurationError::InvalidPattern {
                pattern: self.raw.clone(),
                reason: format!("cannot constrain unknown parameter '{name}'"),
            });
        }
        if let Err(err) = Regex::new(&format!("^(?:{requirement})$")) {
            return Err(ConfigurationError::InvalidPattern {
                pattern: self.raw.clone(),
                reason: format!("requirement for '{name}' is not a valid regex: {err}"),
            });
        }
        self.requirements.insert(name.to_string(), requirement.to_string());
        self.compiled = OnceCell::new();
        Ok(())
    }

    /// The normalized pattern string, trailing slash included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains no parameter placeholders.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    /// Whether the pattern requires a trailing slash on matched paths.
    #[must_use]
    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// The parsed segments in declaration order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The requirement regex attached to a parameter, if any.
    #[must_use]
    pub fn requirement(&self, name: &str) -> Option<&str> {
        self.requirements.get(name).map(String::as_str)
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Match a decoded request path against the pattern.
    ///
    /// Returns extracted parameters in declaration order, or `None` when
    /// the path does not match. Omitted optional segments produce no entry.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let captures = self.regex().captures(path)?;
        let mut params = ParamVec::new();
        for name in self.param_names() {
            if let Some(value) = captures.name(name) {
                params.push((Arc::from(name), value.as_str().to_string()));
            }
        }
        Some(params)
    }

    /// Rebuild the pattern under a path prefix, carrying requirements over.
    ///
    /// Used when group prefixes are applied to an already-parsed route.
    pub(crate) fn prefixed(&self, prefix: &str) -> Result<Self, ConfigurationError> {
        let joined = UrlPath::join(prefix, &self.raw);
        let mut pattern = PathPattern::parse(joined.as_str())?;
        for (name, requirement) in &self.requirements {
            pattern.add_requirement(name, requirement)?;
        }
        Ok(pattern)
    }

    /// The compiled regex, built on first use.
    ///
    /// Requirements were validated at registration, so assembly cannot
    /// produce an invalid regex.
    pub(crate) fn regex(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            let pattern = self.build_regex_source();
            Regex::new(&pattern).expect("failed to compile route pattern regex")
        })
    }

    fn build_regex_source(&self) -> String {
        if self.segments.is_empty() {
            return "^/$".to_string();
        }
        let mut pattern = String::with_capacity(self.raw.len() + 16);
        pattern.push('^');
        for segment in &self.segments {
            match segment {
                Segment::Static(literal) => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(literal));
                }
                Segment::Param { name, optional } => {
                    let capture = match self.requirements.get(name) {
                        Some(req) => format!("(?P<{name}>(?:{req}))"),
                        None => format!("(?P<{name}>[^/]+)"),
                    };
                    if *optional {
                        pattern.push_str(&format!("(?:/{capture})?"));
                    } else {
                        pattern.push('/');
                        pattern.push_str(&capture);
                    }
                }
            }
        }
        if self.trailing_slash {
            pattern.push('/');
        }
        pattern.push('$');
        pattern
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.requirements == other.requirements
    }
}

impl Eq for PathPattern {}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
