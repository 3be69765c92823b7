//! Middleware construction through a tag registry.
//!
//! Blueprints are resolved against a registry of constructors keyed by
//! tag. A constructor receives the dependency [`Container`] (for
//! class-typed collaborators) and the blueprint's scalar arguments in
//! order; arguments the blueprint omits fall back to whatever default the
//! constructor declares. Unknown tags fail loudly with the tag name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::container::Container;

use super::{ConfigValue, Middleware, MiddlewareBlueprint};

/// Constructor registered for a middleware tag.
pub type MiddlewareConstructor =
    Box<dyn Fn(&dyn Container, &[ConfigValue]) -> anyhow::Result<Arc<dyn Middleware>> + Send + Sync>;

/// Resolves [`MiddlewareBlueprint`]s into middleware instances.
pub struct MiddlewareFactory {
    container: Arc<dyn Container>,
    constructors: HashMap<String, MiddlewareConstructor>,
}

impl MiddlewareFactory {
    /// Create a factory over the given container.
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self {
            container,
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor under a tag, replacing any previous one.
    pub fn register<F>(&mut self, tag: &str, constructor: F)
    where
        F: Fn(&dyn Container, &[ConfigValue]) -> anyhow::Result<Arc<dyn Middleware>>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(tag.to_string(), Box::new(constructor));
    }

    /// Whether a constructor is registered for the tag.
    #[must_use]
    pub fn knows(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Resolve one blueprint into an instance.
    pub fn resolve(
        &self,
        blueprint: &MiddlewareBlueprint,
    ) -> Result<Arc<dyn Middleware>, MiddlewareResolveError> {
        let constructor = self.constructors.get(blueprint.tag()).ok_or_else(|| {
            MiddlewareResolveError::UnknownMiddleware {
                tag: blueprint.tag().to_string(),
            }
        })?;
        debug!(tag = blueprint.tag(), args = ?blueprint.args(), "constructing middleware");
        constructor(self.container.as_ref(), blueprint.args()).map_err(|error| {
            MiddlewareResolveError::Construction {
                tag: blueprint.tag().to_string(),
                message: error.to_string(),
            }
        })
    }

    /// Resolve an ordered blueprint list into an ordered instance stack.
    pub fn resolve_stack(
        &self,
        blueprints: &[MiddlewareBlueprint],
    ) -> Result<Vec<Arc<dyn Middleware>>, MiddlewareResolveError> {
        blueprints.iter().map(|bp| self.resolve(bp)).collect()
    }
}

/// Failure to turn a blueprint into a middleware instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareResolveError {
    /// No constructor registered for the tag.
    UnknownMiddleware {
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

impl fmt::Display for MiddlewareResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareResolveError::UnknownMiddleware { tag } => {
                write!(
                    f,
                    "middleware error: no middleware registered under tag '{tag}'"
                )
            }
            MiddlewareResolveError::Construction { tag, message } => {
                write!(
                    f,
                    "middleware error: constructing middleware '{tag}' failed: {message}"
                )
            }
        }
    }
}

impl std::error::Error for MiddlewareResolveError {}
