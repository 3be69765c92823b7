//! Dependency resolution for middleware and condition construction.
//!
//! Middleware and route conditions are described declaratively (a tag plus
//! scalar arguments) and constructed on demand. Their class-typed
//! dependencies come out of a [`Container`]: a narrow resolve/has interface
//! the host implements, with [`TypeRegistry`] as the in-crate
//! implementation supporting both singleton and factory bindings.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased dependency container.
///
/// Object-safe by design; the typed surface lives on [`ContainerExt`].
pub trait Container: Send + Sync {
    /// Resolve an instance by type id.
    fn get_any(&self, id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Whether a binding exists for the type id.
    fn has_any(&self, id: TypeId) -> bool;
}

/// Typed convenience layer over [`Container`].
pub trait ContainerExt {
    /// Resolve an `Arc<T>`, failing with the type name when unbound.
    fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError>;

    /// Whether `T` is bound.
    fn has<T: Any + Send + Sync>(&self) -> bool;
}

impl<C: Container + ?Sized> ContainerExt for C {
    fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        let erased = self
            .get_any(TypeId::of::<T>())
            .ok_or(ContainerError::NotRegistered {
                type_name: std::any::type_name::<T>(),
            })?;
        erased
            .downcast::<T>()
            .map_err(|_| ContainerError::NotRegistered {
                type_name: std::any::type_name::<T>(),
            })
    }

    fn has<T: Any + Send + Sync>(&self) -> bool {
        self.has_any(TypeId::of::<T>())
    }
}

/// Container resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No binding exists for the requested type.
    NotRegistered {
        /// Fully qualified name of the missing type
        type_name: &'static str,
    },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::NotRegistered { type_name } => {
                write!(f, "container error: no binding registered for '{type_name}'")
            }
        }
    }
}

impl std::error::Error for ContainerError {}

enum Binding {
    Singleton(Arc<dyn Any + Send + Sync>),
    Factory(Box<dyn Fn(&TypeRegistry) -> Arc<dyn Any + Send + Sync> + Send + Sync>),
}

/// Simple type-map container with singleton and factory bindings.
///
/// Singletons hand out the same `Arc` on every resolve; factory bindings
/// run their closure per resolve.
#[derive(Default)]
pub struct TypeRegistry {
    bindings: HashMap<TypeId, Binding>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a singleton instance.
    pub fn insert<T: Any + Send + Sync>(&mut self, instance: T) {
        self.bindings
            .insert(TypeId::of::<T>(), Binding::Singleton(Arc::new(instance)));
    }

    /// Bind an already shared singleton.
    pub fn insert_arc<T: Any + Send + Sync>(&mut self, instance: Arc<T>) {
        self.bindings
            .insert(TypeId::of::<T>(), Binding::Singleton(instance));
    }

    /// Bind a factory invoked on every resolve.
    pub fn bind_factory<T, F>(&mut self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&TypeRegistry) -> T + Send + Sync + 'static,
    {
        self.bindings.insert(
            TypeId::of::<T>(),
            Binding::Factory(Box::new(move |registry| Arc::new(factory(registry)))),
        );
    }
}

impl Container for TypeRegistry {
    fn get_any(&self, id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        match self.bindings.get(&id)? {
            Binding::Singleton(instance) => Some(Arc::clone(instance)),
            Binding::Factory(factory) => Some(factory(self)),
        }
    }

    fn has_any(&self, id: TypeId) -> bool {
        self.bindings.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Config {
        greeting: String,
    }

    #[test]
    fn test_singleton_binding_is_shared() {
        let mut registry = TypeRegistry::new();
        registry.insert(Config {
            greeting: "hi".to_string(),
        });
        let a = registry.resolve::<Config>().unwrap();
        let b = registry.resolve::<Config>().unwrap();
        assert_eq!(a.greeting, "hi");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_binding_builds_per_resolve() {
        let mut registry = TypeRegistry::new();
        registry.bind_factory(|_| Config {
            greeting: "fresh".to_string(),
        });
        let a = registry.resolve::<Config>().unwrap();
        let b = registry.resolve::<Config>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_binding_names_the_type() {
        let registry = TypeRegistry::new();
        let err = registry.resolve::<Config>().unwrap_err();
        assert!(err.to_string().contains("Config"));
    }

    #[test]
    fn test_has_reports_bindings() {
        let mut registry = TypeRegistry::new();
        assert!(!registry.has::<Config>());
        registry.insert(Config {
            greeting: String::new(),
        });
        assert!(registry.has::<Config>());
    }
}
