//! Command buses.

use std::sync::Arc;

use switchyard_core::config::MessagingConfig;
use switchyard_core::error::DomainError;
use switchyard_core::message::CommandMessage;
use switchyard_core::payload::{Command, IntoPayload, PayloadType};
use switchyard_core::queue::MessageQueue;
use tracing::debug;

use super::handler::CommandHandler;
use super::router::{CommandRouter, InMemoryCommandRouter};

/// Delivers commands to their handler.
pub trait CommandBus: Send + Sync {
    /// Dispatches a command message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if nothing handles the command,
    /// or the handler's own error unchanged.
    fn dispatch(&self, message: CommandMessage) -> Result<(), DomainError>;

    /// Wraps `command` in a fresh envelope and dispatches it.
    ///
    /// # Errors
    ///
    /// See [`CommandBus::dispatch`].
    fn execute<C>(&self, command: C) -> Result<(), DomainError>
    where
        C: IntoPayload<dyn Command>,
        Self: Sized,
    {
        self.dispatch(CommandMessage::create(command))
    }
}

impl<B: CommandBus + ?Sized> CommandBus for Arc<B> {
    fn dispatch(&self, message: CommandMessage) -> Result<(), DomainError> {
        (**self).dispatch(message)
    }
}

fn invoke(router: &dyn CommandRouter, message: &CommandMessage) -> Result<(), DomainError> {
    let handler = router.route(message.payload())?;
    debug!(
        message_id = %message.id(),
        payload_type = %message.payload_type(),
        "dispatching command"
    );
    handler.handle(message)
}

/// Bus that owns an in-memory router and runs the handler inline.
#[derive(Debug, Default)]
pub struct SynchronousCommandBus {
    router: InMemoryCommandRouter,
}

impl SynchronousCommandBus {
    /// Creates a bus over `router`.
    #[must_use]
    pub fn new(router: InMemoryCommandRouter) -> Self {
        Self { router }
    }

    /// Registers `handler` for commands of type `C`.
    pub fn register_handler<C>(&mut self, handler: Arc<dyn CommandHandler>) -> &mut Self
    where
        C: Command + PayloadType,
    {
        self.router.register_handler::<C>(handler);
        self
    }

    /// The underlying router.
    #[must_use]
    pub fn router(&self) -> &InMemoryCommandRouter {
        &self.router
    }
}

impl CommandBus for SynchronousCommandBus {
    fn dispatch(&self, message: CommandMessage) -> Result<(), DomainError> {
        invoke(&self.router, &message)
    }
}

/// Bus that delegates handler lookup to any [`CommandRouter`].
pub struct RoutingCommandBus {
    router: Arc<dyn CommandRouter>,
}

impl RoutingCommandBus {
    /// Creates a bus over `router`.
    #[must_use]
    pub fn new(router: Arc<dyn CommandRouter>) -> Self {
        Self { router }
    }
}

impl CommandBus for RoutingCommandBus {
    fn dispatch(&self, message: CommandMessage) -> Result<(), DomainError> {
        invoke(self.router.as_ref(), &message)
    }
}

/// Bus that serialises commands onto a queue channel instead of handling
/// them in-process.
pub struct QueueingCommandBus {
    queue: Arc<dyn MessageQueue>,
    channel: String,
}

impl QueueingCommandBus {
    /// Creates a bus writing to `channel` of `queue`.
    #[must_use]
    pub fn new(queue: Arc<dyn MessageQueue>, channel: impl Into<String>) -> Self {
        Self {
            queue,
            channel: channel.into(),
        }
    }

    /// Creates a bus writing to the configured command channel.
    #[must_use]
    pub fn from_config(queue: Arc<dyn MessageQueue>, config: &MessagingConfig) -> Self {
        Self::new(queue, config.command_channel.clone())
    }

    /// The target channel.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl CommandBus for QueueingCommandBus {
    fn dispatch(&self, message: CommandMessage) -> Result<(), DomainError> {
        let serialized = message.serialize()?;
        debug!(
            message_id = %message.id(),
            payload_type = %message.payload_type(),
            channel = %self.channel,
            "enqueueing command"
        );
        self.queue.enqueue(&self.channel, serialized)
    }
}
