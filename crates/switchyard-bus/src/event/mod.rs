//! Event side: handlers, subscribers and dispatchers.
//!
//! Unlike commands, an event may reach any number of handlers. Handlers are
//! registered per event type or for [`EventKey::AllEvents`], run in
//! descending priority (ties in registration order), and the first failure
//! stops the remaining handlers.

mod queueing;
mod service_aware;
mod simple;

use std::fmt;
use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::EventMessage;
use switchyard_core::payload::{Event, IntoPayload, PayloadType};
use switchyard_core::type_tag::TypeTag;

pub use queueing::QueueingEventDispatcher;
pub use service_aware::ServiceAwareEventDispatcher;
pub use simple::SimpleEventDispatcher;

/// What a handler listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// One concrete event type.
    Type(TypeTag),
    /// Every event, after the type-specific handlers.
    AllEvents,
}

impl EventKey {
    /// Key for events of type `E`.
    #[must_use]
    pub fn of<E: Event + PayloadType>() -> Self {
        Self::Type(E::type_tag())
    }
}

impl From<TypeTag> for EventKey {
    fn from(tag: TypeTag) -> Self {
        Self::Type(tag)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(tag) => fmt::Display::fmt(tag, f),
            Self::AllEvents => f.write_str("*"),
        }
    }
}

/// Reacts to events.
pub trait EventHandler: Send + Sync {
    /// Handles `message`.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of the dispatch and reaches the caller.
    fn handle(&self, message: &EventMessage) -> Result<(), DomainError>;
}

struct FnHandler<F>(F);

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&EventMessage) -> Result<(), DomainError> + Send + Sync,
{
    fn handle(&self, message: &EventMessage) -> Result<(), DomainError> {
        (self.0)(message)
    }
}

/// Wraps a closure as an event handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&EventMessage) -> Result<(), DomainError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// One handler method a subscriber declares.
pub struct Subscription<S> {
    key: EventKey,
    priority: i32,
    method: fn(&S, &EventMessage) -> Result<(), DomainError>,
}

impl<S> Subscription<S> {
    /// Subscribes `method` to events of type `E` at priority 0.
    #[must_use]
    pub fn on<E: Event + PayloadType>(method: fn(&S, &EventMessage) -> Result<(), DomainError>) -> Self {
        Self {
            key: EventKey::of::<E>(),
            priority: 0,
            method,
        }
    }

    /// Subscribes `method` to every event at priority 0.
    #[must_use]
    pub fn all_events(method: fn(&S, &EventMessage) -> Result<(), DomainError>) -> Self {
        Self {
            key: EventKey::AllEvents,
            priority: 0,
            method,
        }
    }

    /// Sets the priority; higher runs first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The subscribed key.
    #[must_use]
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    /// The priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// A type whose methods handle events, declared statically.
///
/// A subscriber may list several methods for the same key.
pub trait EventSubscriber: Send + Sync + Sized + 'static {
    /// The methods to bind on registration.
    fn subscriptions() -> Vec<Subscription<Self>>;
}

struct BoundMethod<S> {
    subscriber: Arc<S>,
    method: fn(&S, &EventMessage) -> Result<(), DomainError>,
}

impl<S: EventSubscriber> EventHandler for BoundMethod<S> {
    fn handle(&self, message: &EventMessage) -> Result<(), DomainError> {
        (self.method)(&self.subscriber, message)
    }
}

/// Identifies everything registered on behalf of one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriberId {
    /// A subscriber instance, by address.
    Instance(usize),
    /// A subscriber or handler living in a service container.
    Service(String),
}

impl SubscriberId {
    /// Id of a registered subscriber instance.
    #[must_use]
    pub fn of<S>(subscriber: &Arc<S>) -> Self {
        Self::Instance(Arc::as_ptr(subscriber).addr())
    }
}

/// A handler added on behalf of a subscriber.
pub struct SubscribedHandler {
    /// Key it listens to.
    pub key: EventKey,
    /// The handler.
    pub handler: Arc<dyn EventHandler>,
    /// Its priority.
    pub priority: i32,
}

/// Delivers events to every interested handler.
pub trait EventDispatcher: Send + Sync {
    /// Runs the handlers for `message`'s type, then the all-events handlers.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; later handlers do not run.
    fn dispatch(&self, message: &EventMessage) -> Result<(), DomainError>;

    /// Adds `handler` for `key` at `priority`.
    fn add_handler(&self, key: EventKey, handler: Arc<dyn EventHandler>, priority: i32);

    /// Removes every registration of `handler` under `key`.
    fn remove_handler(&self, key: &EventKey, handler: &Arc<dyn EventHandler>);

    /// Adds handlers owned by `owner`, removable together.
    fn add_subscriber_handlers(&self, owner: SubscriberId, handlers: Vec<SubscribedHandler>);

    /// Removes every handler owned by `owner`.
    fn remove_subscriber_handlers(&self, owner: &SubscriberId);

    /// Handlers for `key`, in dispatch order.
    fn handlers(&self, key: &EventKey) -> Vec<Arc<dyn EventHandler>>;

    /// Every key with its handlers in dispatch order.
    fn all_handlers(&self) -> Vec<(EventKey, Vec<Arc<dyn EventHandler>>)>;

    /// Whether anything listens on `key`.
    fn has_handlers(&self, key: &EventKey) -> bool {
        !self.handlers(key).is_empty()
    }

    /// Wraps `event` in a fresh envelope and dispatches it.
    ///
    /// # Errors
    ///
    /// See [`EventDispatcher::dispatch`].
    fn trigger<E>(&self, event: E) -> Result<(), DomainError>
    where
        E: IntoPayload<dyn Event>,
        Self: Sized,
    {
        self.dispatch(&EventMessage::create(event))
    }

    /// Binds every method `S` declares to `subscriber`.
    fn register<S: EventSubscriber>(&self, subscriber: Arc<S>)
    where
        Self: Sized,
    {
        let handlers = S::subscriptions()
            .into_iter()
            .map(|subscription| SubscribedHandler {
                key: subscription.key,
                priority: subscription.priority,
                handler: Arc::new(BoundMethod {
                    subscriber: Arc::clone(&subscriber),
                    method: subscription.method,
                }),
            })
            .collect();
        self.add_subscriber_handlers(SubscriberId::of(&subscriber), handlers);
    }

    /// Removes everything registered for `subscriber`.
    fn unregister<S: EventSubscriber>(&self, subscriber: &Arc<S>)
    where
        Self: Sized,
    {
        self.remove_subscriber_handlers(&SubscriberId::of(subscriber));
    }
}

impl<D: EventDispatcher + ?Sized> EventDispatcher for Arc<D> {
    fn dispatch(&self, message: &EventMessage) -> Result<(), DomainError> {
        (**self).dispatch(message)
    }

    fn add_handler(&self, key: EventKey, handler: Arc<dyn EventHandler>, priority: i32) {
        (**self).add_handler(key, handler, priority);
    }

    fn remove_handler(&self, key: &EventKey, handler: &Arc<dyn EventHandler>) {
        (**self).remove_handler(key, handler);
    }

    fn add_subscriber_handlers(&self, owner: SubscriberId, handlers: Vec<SubscribedHandler>) {
        (**self).add_subscriber_handlers(owner, handlers);
    }

    fn remove_subscriber_handlers(&self, owner: &SubscriberId) {
        (**self).remove_subscriber_handlers(owner);
    }

    fn handlers(&self, key: &EventKey) -> Vec<Arc<dyn EventHandler>> {
        (**self).handlers(key)
    }

    fn all_handlers(&self) -> Vec<(EventKey, Vec<Arc<dyn EventHandler>>)> {
        (**self).all_handlers()
    }

    fn has_handlers(&self, key: &EventKey) -> bool {
        (**self).has_handlers(key)
    }
}
