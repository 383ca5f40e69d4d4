//! Event dispatcher whose handlers live in a service container.

use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::EventMessage;

use super::simple::SimpleEventDispatcher;
use super::{
    EventDispatcher, EventHandler, EventKey, EventSubscriber, SubscribedHandler, SubscriberId,
};
use crate::service::{ServiceBinding, ServiceContainer};

fn resolve_handler<H>(
    container: &ServiceContainer,
    service_id: &str,
) -> Result<Arc<dyn EventHandler>, DomainError>
where
    H: EventHandler + 'static,
{
    let handler: Arc<dyn EventHandler> = container.get::<H>(service_id)?;
    Ok(handler)
}

struct LazyHandler {
    container: Arc<ServiceContainer>,
    binding: ServiceBinding<dyn EventHandler>,
}

impl EventHandler for LazyHandler {
    fn handle(&self, message: &EventMessage) -> Result<(), DomainError> {
        self.binding.resolve(&self.container)?.handle(message)
    }
}

struct LazyMethod<S> {
    container: Arc<ServiceContainer>,
    service_id: String,
    method: fn(&S, &EventMessage) -> Result<(), DomainError>,
}

impl<S: EventSubscriber> EventHandler for LazyMethod<S> {
    fn handle(&self, message: &EventMessage) -> Result<(), DomainError> {
        let subscriber = self.container.get::<S>(&self.service_id)?;
        (self.method)(&subscriber, message)
    }
}

/// Dispatcher that stores service ids and resolves handlers and subscribers
/// from a [`ServiceContainer`] each time an event is dispatched.
///
/// Services are therefore built on first use, and replacing a service in the
/// container changes which instance later events reach. Plain handler
/// instances can be mixed in through the [`EventDispatcher`] methods.
pub struct ServiceAwareEventDispatcher {
    container: Arc<ServiceContainer>,
    inner: SimpleEventDispatcher,
}

impl ServiceAwareEventDispatcher {
    /// Creates a dispatcher over `container`.
    #[must_use]
    pub fn new(container: Arc<ServiceContainer>) -> Self {
        Self {
            container,
            inner: SimpleEventDispatcher::new(),
        }
    }

    /// The backing container.
    #[must_use]
    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }

    /// Adds the handler service `service_id` for `key`. The service must
    /// hold an `Arc<H>` by dispatch time.
    pub fn add_service_handler<H>(&self, key: EventKey, service_id: impl Into<String>, priority: i32)
    where
        H: EventHandler + 'static,
    {
        let service_id = service_id.into();
        let handler: Arc<dyn EventHandler> = Arc::new(LazyHandler {
            container: Arc::clone(&self.container),
            binding: ServiceBinding::new(service_id.clone(), resolve_handler::<H>),
        });
        self.inner.add_subscriber_handlers(
            SubscriberId::Service(service_id),
            vec![SubscribedHandler {
                key,
                handler,
                priority,
            }],
        );
    }

    /// Binds every method `S` declares to the subscriber service
    /// `service_id`.
    pub fn register_service<S: EventSubscriber>(&self, service_id: impl Into<String>) {
        let service_id = service_id.into();
        let handlers = S::subscriptions()
            .into_iter()
            .map(|subscription| SubscribedHandler {
                key: subscription.key,
                priority: subscription.priority,
                handler: Arc::new(LazyMethod {
                    container: Arc::clone(&self.container),
                    service_id: service_id.clone(),
                    method: subscription.method,
                }),
            })
            .collect();
        self.inner
            .add_subscriber_handlers(SubscriberId::Service(service_id), handlers);
    }

    /// Removes everything added for `service_id`.
    pub fn unregister_service(&self, service_id: &str) {
        self.inner
            .remove_subscriber_handlers(&SubscriberId::Service(service_id.to_owned()));
    }
}

impl EventDispatcher for ServiceAwareEventDispatcher {
    fn dispatch(&self, message: &EventMessage) -> Result<(), DomainError> {
        self.inner.dispatch(message)
    }

    fn add_handler(&self, key: EventKey, handler: Arc<dyn EventHandler>, priority: i32) {
        self.inner.add_handler(key, handler, priority);
    }

    fn remove_handler(&self, key: &EventKey, handler: &Arc<dyn EventHandler>) {
        self.inner.remove_handler(key, handler);
    }

    fn add_subscriber_handlers(&self, owner: SubscriberId, handlers: Vec<SubscribedHandler>) {
        self.inner.add_subscriber_handlers(owner, handlers);
    }

    fn remove_subscriber_handlers(&self, owner: &SubscriberId) {
        self.inner.remove_subscriber_handlers(owner);
    }

    fn handlers(&self, key: &EventKey) -> Vec<Arc<dyn EventHandler>> {
        self.inner.handlers(key)
    }

    fn all_handlers(&self) -> Vec<(EventKey, Vec<Arc<dyn EventHandler>>)> {
        self.inner.all_handlers()
    }

    fn has_handlers(&self, key: &EventKey) -> bool {
        self.inner.has_handlers(key)
    }
}
