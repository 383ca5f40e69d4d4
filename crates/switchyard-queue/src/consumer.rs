//! Consumers that turn queued messages back into envelopes and deliver them.

use std::sync::Arc;

use switchyard_bus::command::CommandBus;
use switchyard_bus::event::EventDispatcher;
use switchyard_core::error::DomainError;
use switchyard_core::message::{CommandMessage, EventMessage, PayloadRegistry, SerializedMessage};
use switchyard_core::payload::{Command, Event};

/// Handles one message taken from a queue.
pub trait MessageConsumer: Send + Sync {
    /// Delivers `message`.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error or the handler's error. The worker
    /// leaves the message unacknowledged in either case.
    fn consume(&self, message: &SerializedMessage) -> Result<(), DomainError>;
}

/// Feeds queued commands into a command bus.
pub struct CommandConsumer {
    registry: PayloadRegistry<dyn Command>,
    bus: Arc<dyn CommandBus>,
}

impl CommandConsumer {
    /// Creates a consumer rebuilding payloads with `registry`.
    #[must_use]
    pub fn new(registry: PayloadRegistry<dyn Command>, bus: Arc<dyn CommandBus>) -> Self {
        Self { registry, bus }
    }
}

impl MessageConsumer for CommandConsumer {
    fn consume(&self, message: &SerializedMessage) -> Result<(), DomainError> {
        let command = CommandMessage::from_serialized(message, &self.registry)?;
        self.bus.dispatch(command)
    }
}

/// Feeds queued events into an event dispatcher.
pub struct EventConsumer {
    registry: PayloadRegistry<dyn Event>,
    dispatcher: Arc<dyn EventDispatcher>,
}

impl EventConsumer {
    /// Creates a consumer rebuilding payloads with `registry`.
    #[must_use]
    pub fn new(registry: PayloadRegistry<dyn Event>, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }
}

impl MessageConsumer for EventConsumer {
    fn consume(&self, message: &SerializedMessage) -> Result<(), DomainError> {
        let event = EventMessage::from_serialized(message, &self.registry)?;
        self.dispatcher.dispatch(&event)
    }
}

#[cfg(test)]
mod tests {
    use switchyard_bus::command::{SynchronousCommandBus, handler_for};
    use switchyard_bus::event::{EventKey, SimpleEventDispatcher, handler_fn};
    use switchyard_test_support::{RegisterUserCommand, TraceLog, UserRegisteredEvent};

    use super::*;

    #[test]
    fn test_command_consumer_dispatches_rebuilt_command() {
        // Arrange
        let log = TraceLog::new();
        let seen = log.clone();
        let mut bus = SynchronousCommandBus::default();
        bus.register_handler::<RegisterUserCommand>(handler_for(
            move |command: &RegisterUserCommand, _| {
                seen.push(command.email.clone());
                Ok(())
            },
        ));
        let mut registry = PayloadRegistry::<dyn Command>::new();
        registry.register::<RegisterUserCommand>();
        let consumer = CommandConsumer::new(registry, Arc::new(bus));
        let message = CommandMessage::create(RegisterUserCommand::jsmith())
            .serialize()
            .unwrap();

        // Act
        consumer.consume(&message).unwrap();

        // Assert
        assert_eq!(log.entries(), vec!["jsmith@example.com"]);
    }

    #[test]
    fn test_command_consumer_rejects_unknown_payload() {
        let consumer = CommandConsumer::new(
            PayloadRegistry::new(),
            Arc::new(SynchronousCommandBus::default()),
        );
        let message = CommandMessage::create(RegisterUserCommand::jsmith())
            .serialize()
            .unwrap();

        let result = consumer.consume(&message);

        assert!(matches!(result, Err(DomainError::InvalidPayloadType(_))));
    }

    #[test]
    fn test_event_consumer_rejects_command_messages() {
        let mut registry = PayloadRegistry::<dyn Event>::new();
        registry.register::<UserRegisteredEvent>();
        let consumer = EventConsumer::new(registry, Arc::new(SimpleEventDispatcher::new()));
        let message = CommandMessage::create(RegisterUserCommand::jsmith())
            .serialize()
            .unwrap();

        let result = consumer.consume(&message);

        assert!(matches!(result, Err(DomainError::Validation(msg)) if msg.contains("Invalid message type")));
    }

    #[test]
    fn test_event_consumer_dispatches_rebuilt_event() {
        // Arrange
        let log = TraceLog::new();
        let seen = log.clone();
        let dispatcher = SimpleEventDispatcher::new();
        dispatcher.add_handler(
            EventKey::of::<UserRegisteredEvent>(),
            handler_fn(move |message| {
                seen.push(message.payload_type().to_string());
                Ok(())
            }),
            0,
        );
        let mut registry = PayloadRegistry::<dyn Event>::new();
        registry.register::<UserRegisteredEvent>();
        let consumer = EventConsumer::new(registry, Arc::new(dispatcher));
        let message = EventMessage::create(UserRegisteredEvent::new(
            "jsmith@example.com",
            "James",
            "Smith",
            "D",
        ))
        .serialize()
        .unwrap();

        // Act
        consumer.consume(&message).unwrap();

        // Assert
        assert_eq!(log.entries(), vec!["Tests.User.UserRegisteredEvent"]);
    }
}
