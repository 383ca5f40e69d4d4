//! Named, lazily built services.
//!
//! Service-aware routers and dispatchers keep only a service id and look
//! the handler up here when a message arrives, so replacing a service after
//! registration changes what later dispatches reach.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use switchyard_core::error::DomainError;

type Instance = Box<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn() -> Instance + Send + Sync>;

struct ServiceEntry {
    factory: Factory,
    instance: OnceLock<Instance>,
}

/// Container of shared services keyed by id.
///
/// Each service is an `Arc<S>`, where `S` may be a trait object. Instances
/// are built on the first [`ServiceContainer::get`] and reused afterwards.
#[derive(Default)]
pub struct ServiceContainer {
    services: RwLock<HashMap<String, Arc<ServiceEntry>>>,
}

impl ServiceContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lazily built service, replacing any existing entry.
    pub fn set<S, F>(&self, id: impl Into<String>, factory: F)
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<S> + Send + Sync + 'static,
    {
        let entry = ServiceEntry {
            factory: Box::new(move || Box::new(factory()) as Instance),
            instance: OnceLock::new(),
        };
        self.insert(id.into(), entry);
    }

    /// Registers an already built service, replacing any existing entry.
    pub fn set_instance<S>(&self, id: impl Into<String>, service: Arc<S>)
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let shared = Arc::clone(&service);
        let entry = ServiceEntry {
            factory: Box::new(move || Box::new(Arc::clone(&shared)) as Instance),
            instance: OnceLock::from(Box::new(service) as Instance),
        };
        self.insert(id.into(), entry);
    }

    /// Whether a service is registered under `id`.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Returns the service registered under `id`, building it if needed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ServiceNotFound` if nothing is registered under
    /// `id` or the service is not an `Arc<S>`.
    pub fn get<S>(&self, id: &str) -> Result<Arc<S>, DomainError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let entry = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::ServiceNotFound(id.to_owned()))?;
        let instance = entry.instance.get_or_init(|| (entry.factory)());
        instance
            .downcast_ref::<Arc<S>>()
            .cloned()
            .ok_or_else(|| {
                DomainError::ServiceNotFound(format!("{id} is not a {}", type_name::<S>()))
            })
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort_unstable();
        ids
    }

    fn insert(&self, id: String, entry: ServiceEntry) {
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(entry));
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("ids", &self.ids())
            .finish()
    }
}

/// A handler reference that resolves through a [`ServiceContainer`].
pub struct ServiceBinding<H: ?Sized> {
    service_id: String,
    resolve: fn(&ServiceContainer, &str) -> Result<Arc<H>, DomainError>,
}

impl<H: ?Sized> ServiceBinding<H> {
    /// Binds `service_id` with the function that turns the stored service
    /// into an `Arc<H>`.
    #[must_use]
    pub fn new(
        service_id: impl Into<String>,
        resolve: fn(&ServiceContainer, &str) -> Result<Arc<H>, DomainError>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            resolve,
        }
    }

    /// The bound service id.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Looks the service up in `container`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ServiceNotFound` if the service is missing or
    /// has another type.
    pub fn resolve(&self, container: &ServiceContainer) -> Result<Arc<H>, DomainError> {
        (self.resolve)(container, &self.service_id)
    }
}

impl<H: ?Sized> Clone for ServiceBinding<H> {
    fn clone(&self) -> Self {
        Self {
            service_id: self.service_id.clone(),
            resolve: self.resolve,
        }
    }
}

impl<H: ?Sized> fmt::Debug for ServiceBinding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBinding")
            .field("service_id", &self.service_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_owned()
        }
    }

    struct French;

    impl Greeter for French {
        fn greet(&self) -> String {
            "bonjour".to_owned()
        }
    }

    #[test]
    fn test_get_builds_service_once() {
        // Arrange
        let container = ServiceContainer::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        container.set("greeter", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(English)
        });

        // Act
        let first = container.get::<English>("greeter").unwrap();
        let second = container.get::<English>("greeter").unwrap();

        // Assert
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_trait_object_service() {
        let container = ServiceContainer::new();
        container.set_instance::<dyn Greeter>("greeter", Arc::new(French));

        let greeter = container.get::<dyn Greeter>("greeter").unwrap();

        assert_eq!(greeter.greet(), "bonjour");
    }

    #[test]
    fn test_get_missing_service_is_service_not_found() {
        let container = ServiceContainer::new();

        let result = container.get::<English>("greeter");

        assert!(matches!(result, Err(DomainError::ServiceNotFound(id)) if id == "greeter"));
        assert!(!container.has("greeter"));
    }

    #[test]
    fn test_get_with_wrong_type_is_service_not_found() {
        let container = ServiceContainer::new();
        container.set_instance("greeter", Arc::new(English));

        let result = container.get::<French>("greeter");

        assert!(matches!(result, Err(DomainError::ServiceNotFound(_))));
    }

    #[test]
    fn test_set_replaces_existing_service() {
        // Arrange
        let container = ServiceContainer::new();
        container.set_instance::<dyn Greeter>("greeter", Arc::new(English));
        assert_eq!(container.get::<dyn Greeter>("greeter").unwrap().greet(), "hello");

        // Act
        container.set("greeter", || Arc::new(French) as Arc<dyn Greeter>);

        // Assert
        assert_eq!(container.get::<dyn Greeter>("greeter").unwrap().greet(), "bonjour");
        assert_eq!(container.ids(), vec!["greeter".to_owned()]);
    }

    #[test]
    fn test_binding_resolves_through_container() {
        fn resolve(
            container: &ServiceContainer,
            id: &str,
        ) -> Result<Arc<dyn Greeter>, DomainError> {
            let greeter: Arc<dyn Greeter> = container.get::<English>(id)?;
            Ok(greeter)
        }
        let container = ServiceContainer::new();
        let binding = ServiceBinding::new("greeter", resolve);
        assert!(binding.resolve(&container).is_err());

        container.set_instance("greeter", Arc::new(English));

        assert_eq!(binding.resolve(&container).unwrap().greet(), "hello");
        assert_eq!(binding.service_id(), "greeter");
    }
}
