//! A small service container: named, lazily-constructed singletons.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use smol_str::SmolStr;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{WireError, WireResult};

/// A constructed service, type-erased.
pub type SharedService = Arc<dyn Any + Send + Sync>;

type ServiceFuture = BoxFuture<'static, WireResult<SharedService>>;
type ServiceFactory = Box<dyn Fn() -> ServiceFuture + Send + Sync>;

struct ServiceEntry {
    factory: ServiceFactory,
    cell: OnceCell<SharedService>,
}

enum Binding {
    Service(Arc<ServiceEntry>),
    Alias(SmolStr),
}

/// Registry of named services.
///
/// Registration records a factory only; construction is deferred to the
/// first resolve and runs at most once, after which every resolve (under
/// any alias) returns the same instance.
///
/// Services and aliases share one name table, so a name is claimed or
/// rejected in a single critical section even under concurrent
/// registration.
#[derive(Default)]
pub struct ServiceContainer {
    bindings: RwLock<HashMap<SmolStr, Binding>>,
}

impl ServiceContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazily-constructed singleton under `name`.
    ///
    /// The factory runs on the first resolve of `name` (or any alias of
    /// it) and never again.
    pub fn register<T, F, Fut>(&self, name: impl Into<SmolStr>, factory: F) -> WireResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WireResult<Arc<T>>> + Send + 'static,
    {
        let name = name.into();
        let erased: ServiceFactory = Box::new(move || {
            let fut = factory();
            Box::pin(async move { fut.await.map(|service| service as SharedService) })
        });

        match self.bindings.write().entry(name.clone()) {
            Entry::Occupied(_) => return Err(WireError::duplicate(name.as_str())),
            Entry::Vacant(slot) => {
                slot.insert(Binding::Service(Arc::new(ServiceEntry {
                    factory: erased,
                    cell: OnceCell::new(),
                })));
            }
        }
        debug!(service = %name, "service registered");
        Ok(())
    }

    /// Register `alias` as a second name for `target`.
    ///
    /// The target must be a registered service; aliases do not chain.
    pub fn alias(&self, alias: impl Into<SmolStr>, target: impl Into<SmolStr>) -> WireResult<()> {
        let alias = alias.into();
        let target = target.into();

        let mut bindings = self.bindings.write();
        if !matches!(bindings.get(&target), Some(Binding::Service(_))) {
            return Err(WireError::service_not_found(target.as_str()));
        }
        match bindings.entry(alias.clone()) {
            Entry::Occupied(_) => return Err(WireError::duplicate(alias.as_str())),
            Entry::Vacant(slot) => {
                slot.insert(Binding::Alias(target.clone()));
            }
        }
        drop(bindings);

        debug!(alias = %alias, target = %target, "alias registered");
        Ok(())
    }

    /// Whether a service or alias exists under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name)
    }

    /// Names of registered services, aliases excluded.
    pub fn service_names(&self) -> Vec<SmolStr> {
        let mut names: Vec<_> = self
            .bindings
            .read()
            .iter()
            .filter_map(|(name, binding)| match binding {
                Binding::Service(_) => Some(name.clone()),
                Binding::Alias(_) => None,
            })
            .collect();
        names.sort();
        names
    }

    /// Resolve the service registered under `name`, constructing it on
    /// first use.
    pub async fn resolve<T>(&self, name: &str) -> WireResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let entry = self.entry(name)?;
        let constructed = !entry.cell.initialized();

        let shared = entry.cell.get_or_try_init(|| (entry.factory)()).await?;
        if constructed {
            info!(service = %name, "service constructed");
        }

        shared
            .clone()
            .downcast::<T>()
            .map_err(|_| WireError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    fn entry(&self, name: &str) -> WireResult<Arc<ServiceEntry>> {
        let bindings = self.bindings.read();
        let entry = match bindings.get(name) {
            Some(Binding::Service(entry)) => entry,
            Some(Binding::Alias(target)) => match bindings.get(target) {
                Some(Binding::Service(entry)) => entry,
                _ => return Err(WireError::service_not_found(name)),
            },
            None => return Err(WireError::service_not_found(name)),
        };
        Ok(entry.clone())
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aliases = self
            .bindings
            .read()
            .values()
            .filter(|binding| matches!(binding, Binding::Alias(_)))
            .count();
        f.debug_struct("ServiceContainer")
            .field("services", &self.service_names())
            .field("aliases", &aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    #[tokio::test]
    async fn test_resolve_returns_the_same_singleton() {
        let container = ServiceContainer::new();
        container
            .register("greeter", || async {
                Ok(Arc::new(Greeter {
                    greeting: "hello".to_string(),
                }))
            })
            .unwrap();

        let first: Arc<Greeter> = container.resolve("greeter").await.unwrap();
        let second: Arc<Greeter> = container.resolve("greeter").await.unwrap();

        assert_eq!(first.greeting, "hello");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = ServiceContainer::new();
        let counter = calls.clone();
        container
            .register("counted", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(42u32))
                }
            })
            .unwrap();

        for _ in 0..3 {
            let _: Arc<u32> = container.resolve("counted").await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_alias_resolves_identical_instance() {
        let container = ServiceContainer::new();
        container
            .register("app.value", || async { Ok(Arc::new(7u32)) })
            .unwrap();
        container.alias("value", "app.value").unwrap();

        let canonical: Arc<u32> = container.resolve("app.value").await.unwrap();
        let aliased: Arc<u32> = container.resolve("value").await.unwrap();
        assert!(Arc::ptr_eq(&canonical, &aliased));
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let container = ServiceContainer::new();
        let err = container.resolve::<u32>("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let container = ServiceContainer::new();
        container
            .register("value", || async { Ok(Arc::new(1u32)) })
            .unwrap();

        let err = container
            .register("value", || async { Ok(Arc::new(2u32)) })
            .unwrap_err();
        assert!(matches!(err, WireError::DuplicateService(_)));

        let err = container.alias("value", "value").unwrap_err();
        assert!(matches!(err, WireError::DuplicateService(_)));
    }

    #[tokio::test]
    async fn test_concurrent_registration_claims_name_once() {
        let container = Arc::new(ServiceContainer::new());

        let handles: Vec<_> = (0..8u32)
            .map(|id| {
                let container = container.clone();
                std::thread::spawn(move || {
                    container.register("value", move || async move { Ok(Arc::new(id)) })
                })
            })
            .collect();

        let registered = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|result| result.is_ok())
            .count();
        assert_eq!(registered, 1);

        // The winner's factory is the one that survives.
        let value: Arc<u32> = container.resolve("value").await.unwrap();
        assert!(*value < 8);
        assert_eq!(container.service_names(), vec![SmolStr::new("value")]);
    }

    #[tokio::test]
    async fn test_alias_to_missing_target_rejected() {
        let container = ServiceContainer::new();
        let err = container.alias("value", "app.value").unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let container = ServiceContainer::new();
        container
            .register("value", || async { Ok(Arc::new(1u32)) })
            .unwrap();

        let err = container.resolve::<String>("value").await.unwrap_err();
        assert!(matches!(err, WireError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_failing_factory_propagates() {
        let container = ServiceContainer::new();
        container
            .register("broken", || async {
                Err::<Arc<u32>, _>(WireError::Construction("boom".to_string()))
            })
            .unwrap();

        let err = container.resolve::<u32>("broken").await.unwrap_err();
        assert!(err.is_construction_error());
    }
}
