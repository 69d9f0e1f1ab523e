// Dependency injection container

use crate::logging::{debug, trace};
use crate::{Error, Provider};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Shared = Arc<dyn Any + Send + Sync>;
type Build = Arc<dyn Fn(&Container) -> Result<Shared, Error> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Key {
    Type(TypeId),
    Name(String),
}

#[derive(Clone)]
enum Binding {
    Instance(Shared),
    Singleton { build: Build, cell: Arc<OnceCell<Shared>> },
    Factory(Build),
}

#[derive(Default)]
struct Registry {
    bindings: HashMap<Key, Binding>,
    aliases: HashMap<String, String>,
}

/// The dependency injection container.
///
/// Bindings are keyed by type or by name. Factories receive the container
/// so they can resolve their own dependencies; the registry lock is never
/// held while one runs.
#[derive(Clone)]
pub struct Container {
    registry: Arc<RwLock<Registry>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new DI container");
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
        }
    }

    fn bind(&self, key: Key, binding: Binding) {
        trace!(key = ?key, "Acquiring write lock for registration");
        self.registry.write().bindings.insert(key, binding);
    }

    fn builder<T, F>(factory: F) -> Build
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        Arc::new(move |container| factory(container).map(|value| Arc::new(value) as Shared))
    }

    /// Register a pre-built instance
    pub fn instance<T: Provider>(&self, value: T) {
        self.bind(Key::Type(TypeId::of::<T>()), Binding::Instance(Arc::new(value)));
        debug!(provider = std::any::type_name::<T>(), "Instance registered");
    }

    /// Register a lazily-built, shared instance
    pub fn singleton<T, F>(&self, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind(
            Key::Type(TypeId::of::<T>()),
            Binding::Singleton {
                build: Self::builder(factory),
                cell: Arc::new(OnceCell::new()),
            },
        );
        debug!(provider = std::any::type_name::<T>(), "Singleton registered");
    }

    /// Register a factory producing a fresh value on every resolve
    pub fn factory<T, F>(&self, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind(Key::Type(TypeId::of::<T>()), Binding::Factory(Self::builder(factory)));
        debug!(provider = std::any::type_name::<T>(), "Factory registered");
    }

    pub fn instance_named<T: Provider>(&self, name: &str, value: T) {
        self.bind(Key::Name(name.to_string()), Binding::Instance(Arc::new(value)));
        debug!(name, "Named instance registered");
    }

    pub fn singleton_named<T, F>(&self, name: &str, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind(
            Key::Name(name.to_string()),
            Binding::Singleton {
                build: Self::builder(factory),
                cell: Arc::new(OnceCell::new()),
            },
        );
        debug!(name, "Named singleton registered");
    }

    pub fn factory_named<T, F>(&self, name: &str, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind(Key::Name(name.to_string()), Binding::Factory(Self::builder(factory)));
        debug!(name, "Named factory registered");
    }

    /// Make `alias` resolve to whatever `name` is bound to
    pub fn alias(&self, alias: &str, name: &str) {
        self.registry
            .write()
            .aliases
            .insert(alias.to_string(), name.to_string());
    }

    fn lookup(&self, key: &Key) -> Option<Binding> {
        let registry = self.registry.read();
        let key = match key {
            Key::Name(name) => {
                let mut current = name;
                // Alias chains are short; the hop limit guards against cycles
                for _ in 0..16 {
                    match registry.aliases.get(current) {
                        Some(target) => current = target,
                        None => break,
                    }
                }
                Key::Name(current.clone())
            }
            other => other.clone(),
        };
        registry.bindings.get(&key).cloned()
    }

    fn produce(&self, binding: Binding) -> Result<Shared, Error> {
        match binding {
            Binding::Instance(value) => Ok(value),
            Binding::Singleton { build, cell } => cell.get_or_try_init(|| build(self)).cloned(),
            Binding::Factory(build) => build(self),
        }
    }

    fn resolve_key<T: Provider>(&self, key: Key, label: &str) -> Result<Arc<T>, Error> {
        trace!(provider = label, "Attempting to resolve provider");

        let binding = self
            .lookup(&key)
            .ok_or_else(|| Error::ProviderNotFound(label.to_string()))?;

        let value = self.produce(binding)?;
        let result = value.downcast::<T>().map_err(|_| {
            Error::ProviderNotFound(format!(
                "{} is not a {}",
                label,
                std::any::type_name::<T>()
            ))
        });

        if result.is_ok() {
            debug!(provider = label, "Provider resolved successfully");
        }
        result
    }

    /// Resolve a provider by type
    pub fn resolve<T: Provider>(&self) -> Result<Arc<T>, Error> {
        self.resolve_key(Key::Type(TypeId::of::<T>()), std::any::type_name::<T>())
    }

    /// Resolve a provider by name (aliases are followed)
    pub fn resolve_named<T: Provider>(&self, name: &str) -> Result<Arc<T>, Error> {
        self.resolve_key(Key::Name(name.to_string()), name)
    }

    /// Check if a provider is registered
    pub fn has<T: Provider>(&self) -> bool {
        self.registry
            .read()
            .bindings
            .contains_key(&Key::Type(TypeId::of::<T>()))
    }

    pub fn has_named(&self, name: &str) -> bool {
        self.lookup(&Key::Name(name.to_string())).is_some()
    }

    /// Drop every binding, alias and cached singleton
    pub fn flush(&self) {
        let mut registry = self.registry.write();
        let count = registry.bindings.len();
        registry.bindings.clear();
        registry.aliases.clear();

        debug!(provider_count = count, "Flushed container");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
