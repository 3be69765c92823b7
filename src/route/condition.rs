//! Route conditions: declarative predicates evaluated at match time.
//!
//! A condition is referenced from a route as a tag plus scalar arguments
//! (mirroring middleware blueprints, and serializable into the route cache
//! the same way) and constructed through a registry backed by the
//! dependency container. All conditions attached to a route must pass for
//! the route to match; a failing condition rejects the candidate and
//! matching continues with the next route.

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::middleware::ConfigValue;
use crate::request::{ParamVec, Request};

/// A predicate over the request and the candidate route's extracted
/// parameters.
pub trait RouteCondition: Send + Sync {
    /// Whether the candidate route should match this request.
    fn is_satisfied(&self, request: &Request, params: &ParamVec) -> bool;
}

/// A condition reference: registry tag plus construction arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionBlueprint {
    tag: String,
    args: Vec<ConfigValue>,
}

impl ConditionBlueprint {
    /// Reference a condition by registry tag with no arguments.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            args: Vec::new(),
        }
    }

    /// Reference a condition by registry tag with construction arguments.
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

/// Constructor registered for a condition tag.
pub type ConditionConstructor = Box<
    dyn Fn(&dyn Container, &[ConfigValue]) -> anyhow::Result<Arc<dyn RouteCondition>>
        + Send
        + Sync,
>;

/// Resolves [`ConditionBlueprint`]s into condition instances.
pub struct ConditionFactory {
    container: Arc<dyn Container>,
    constructors: HashMap<String, ConditionConstructor>,
}

impl ConditionFactory {
    /// Create a factory over the given container.
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self {
            container,
            constructors: HashMap::new(),
        }
    }

    /// A factory with no registered conditions and an empty container.
    ///
    /// Useful for route tables that attach no conditions.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Arc::new(NullContainer))
    }

    /// Register a constructor under a tag, replacing any previous one.
    pub fn register<F>(&mut self, tag: &str, constructor: F)
    where
        F: Fn(&dyn Container, &[ConfigValue]) -> anyhow::Result<Arc<dyn RouteCondition>>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(tag.to_string(), Box::new(constructor));
    }

    /// Resolve one blueprint into a condition instance.
    pub fn resolve(
        &self,
        blueprint: &ConditionBlueprint,
    ) -> Result<Arc<dyn RouteCondition>, ConditionResolveError> {
        let constructor = self.constructors.get(blueprint.tag()).ok_or_else(|| {
            ConditionResolveError::UnknownCondition {
                tag: blueprint.tag().to_string(),
            }
        })?;
        constructor(self.container.as_ref(), blueprint.args()).map_err(|error| {
            ConditionResolveError::Construction {
                tag: blueprint.tag().to_string(),
                message: error.to_string(),
            }
        })
    }
}

/// Failure to turn a blueprint into a condition instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionResolveError {
    /// No constructor registered for the tag.
    UnknownCondition {
        /// The unresolvable tag
        tag: String,
    },
    /// The registered constructor returned an error.
    Construction {
        /// The tag whose constructor failed
        tag: String,
        /// The constructor's error message
        message: String,
    },
}

impl fmt::Display for ConditionResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionResolveError::UnknownCondition { tag } => {
                write!(f, "condition error: no condition registered under tag '{tag}'")
            }
            ConditionResolveError::Construction { tag, message } => {
                write!(
                    f,
                    "condition error: constructing condition '{tag}' failed: {message}"
                )
            }
        }
    }
}

impl std::error::Error for ConditionResolveError {}

struct NullContainer;

impl Container for NullContainer {
    fn get_any(&self, _id: TypeId) -> Option<Arc<dyn std::any::Any + Send + Sync>> {
        None
    }

    fn has_any(&self, _id: TypeId) -> bool {
        false
    }
}
