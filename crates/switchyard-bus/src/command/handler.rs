//! Command handler contract.

use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::CommandMessage;
use switchyard_core::payload::{Command, PayloadType};

/// Handles one kind of command.
pub trait CommandHandler: Send + Sync {
    /// Handles `message`.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler fails with; buses propagate it unchanged.
    fn handle(&self, message: &CommandMessage) -> Result<(), DomainError>;
}

struct FnHandler<F>(F);

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&CommandMessage) -> Result<(), DomainError> + Send + Sync,
{
    fn handle(&self, message: &CommandMessage) -> Result<(), DomainError> {
        (self.0)(message)
    }
}

/// Wraps a closure as a command handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(&CommandMessage) -> Result<(), DomainError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wraps a closure taking the concrete command as a command handler.
///
/// The handler fails with `DomainError::InvalidPayloadType` if it receives
/// a message carrying any other payload.
pub fn handler_for<C, F>(f: F) -> Arc<dyn CommandHandler>
where
    C: Command + PayloadType,
    F: Fn(&C, &CommandMessage) -> Result<(), DomainError> + Send + Sync + 'static,
{
    handler_fn(move |message: &CommandMessage| {
        let command = message.payload_as::<C>().ok_or_else(|| {
            DomainError::InvalidPayloadType(format!(
                "expected {}, got {}",
                C::TYPE_NAME,
                message.payload_type()
            ))
        })?;
        f(command, message)
    })
}

#[cfg(test)]
mod tests {
    use switchyard_test_support::{ChangeEmailCommand, RegisterUserCommand, TraceLog};

    use super::*;

    #[test]
    fn test_handler_for_passes_concrete_command() {
        // Arrange
        let log = TraceLog::new();
        let seen = log.clone();
        let handler = handler_for(move |command: &RegisterUserCommand, _| {
            seen.push(command.email.clone());
            Ok(())
        });

        // Act
        handler
            .handle(&CommandMessage::create(RegisterUserCommand::jsmith()))
            .unwrap();

        // Assert
        assert_eq!(log.entries(), vec!["jsmith@example.com"]);
    }

    #[test]
    fn test_handler_for_rejects_other_payloads() {
        let handler = handler_for(|_: &RegisterUserCommand, _| Ok(()));
        let message = CommandMessage::create(ChangeEmailCommand {
            from: "a@example.com".to_owned(),
            to: "b@example.com".to_owned(),
        });

        let result = handler.handle(&message);

        assert!(matches!(result, Err(DomainError::InvalidPayloadType(_))));
    }
}
