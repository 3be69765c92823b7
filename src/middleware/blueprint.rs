//! Declarative middleware references.
//!
//! A route never stores middleware instances; it stores
//! [`MiddlewareBlueprint`]s — a registry tag plus ordered scalar
//! arguments — which survive serialization into the route cache and are
//! resolved into instances by the
//! [`MiddlewareFactory`](super::MiddlewareFactory) at dispatch time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar configuration argument carried by a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// String argument
    Str(String),
    /// Integer argument
    Int(i64),
    /// Boolean argument
    Bool(bool),
}

impl ConfigValue {
    /// The string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer value, if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The boolean value, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Str(s) => f.write_str(s),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A middleware reference: registry tag plus ordered construction
/// arguments.
///
/// Equality covers both fields so group-attribute merging can
/// de-duplicate identical references while keeping differently configured
/// instances of the same middleware apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareBlueprint {
    tag: String,
    args: Vec<ConfigValue>,
}

impl MiddlewareBlueprint {
    /// Reference a middleware by registry tag with no arguments.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            args: Vec::new(),
        }
    }

    /// Reference a middleware by registry tag with construction arguments.
    pub fn with_args<I, V>(tag: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ConfigValue>,
    {
        Self {
            tag: tag.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The registry tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The ordered construction arguments.
    #[must_use]
    pub fn args(&self) -> &[ConfigValue] {
        &self.args
    }
}
