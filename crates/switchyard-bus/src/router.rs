//! Router state shared by the command and query sides.
//!
//! [`InMemoryRouter`] holds handler instances, [`ServiceAwareRouter`] holds
//! service ids and builds handlers from a [`ServiceContainer`] on demand.
//! Both are generic over the handler trait object; the command and query
//! modules add the typed `register_handler` methods and the routing traits.

use std::fmt;
use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::type_tag::TypeTag;
use tracing::debug;

use crate::handler_map::HandlerMap;
use crate::service::{ServiceBinding, ServiceContainer};

/// Router holding handler instances directly.
pub struct InMemoryRouter<H: ?Sized> {
    handlers: HandlerMap<H>,
}

impl<H: ?Sized> InMemoryRouter<H> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HandlerMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, tag: TypeTag, handler: Arc<H>) {
        if self.handlers.contains(&tag) {
            debug!(payload_type = %tag, "replacing handler");
        }
        self.handlers.insert(tag, handler);
    }

    /// Returns the handler registered for `tag`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if none is registered.
    pub fn get_handler(&self, tag: &TypeTag) -> Result<Arc<H>, DomainError> {
        self.handlers.get(tag)
    }

    /// Whether a handler is registered for `tag`.
    #[must_use]
    pub fn has_handler(&self, tag: &TypeTag) -> bool {
        self.handlers.contains(tag)
    }

    /// Every type with a handler, sorted by name.
    #[must_use]
    pub fn handled_types(&self) -> Vec<TypeTag> {
        let mut types: Vec<TypeTag> = self.handlers.types().cloned().collect();
        types.sort_unstable();
        types
    }
}

impl<H: ?Sized> Default for InMemoryRouter<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for InMemoryRouter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRouter")
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Router that maps payload types to service ids and builds the handler
/// from a [`ServiceContainer`] when a message is routed.
pub struct ServiceAwareRouter<H: ?Sized> {
    container: Arc<ServiceContainer>,
    bindings: HandlerMap<ServiceBinding<H>>,
}

impl<H: ?Sized> ServiceAwareRouter<H> {
    /// Creates an empty router over `container`.
    #[must_use]
    pub fn new(container: Arc<ServiceContainer>) -> Self {
        Self {
            container,
            bindings: HandlerMap::new(),
        }
    }

    pub(crate) fn bind(&mut self, tag: TypeTag, binding: ServiceBinding<H>) {
        debug!(
            payload_type = %tag,
            service_id = binding.service_id(),
            "binding handler service"
        );
        self.bindings.insert(tag, Arc::new(binding));
    }

    /// Builds the handler registered for `tag`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if no service is bound to `tag`,
    /// or `DomainError::ServiceNotFound` if the service cannot be resolved.
    pub fn get_handler(&self, tag: &TypeTag) -> Result<Arc<H>, DomainError> {
        self.bindings.get(tag)?.resolve(&self.container)
    }

    /// Whether `tag` is bound and its service is registered.
    #[must_use]
    pub fn has_handler(&self, tag: &TypeTag) -> bool {
        self.bindings
            .get(tag)
            .is_ok_and(|binding| self.container.has(binding.service_id()))
    }

    /// Checks that every bound service is registered in the container.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ServiceNotFound` listing each unresolved
    /// `type -> service` pair.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut missing: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, binding)| !self.container.has(binding.service_id()))
            .map(|(tag, binding)| format!("{tag} -> {}", binding.service_id()))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(DomainError::ServiceNotFound(missing.join(", ")))
    }
}

impl<H: ?Sized> fmt::Debug for ServiceAwareRouter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAwareRouter")
            .field("container", &self.container)
            .field("bindings", &self.bindings)
            .finish()
    }
}
