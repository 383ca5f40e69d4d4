//! Command routers: find the single handler for a command.

use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::payload::{Command, PayloadType};

use super::handler::CommandHandler;
use crate::router::{InMemoryRouter, ServiceAwareRouter};
use crate::service::{ServiceBinding, ServiceContainer};

/// Resolves the handler responsible for a command.
pub trait CommandRouter: Send + Sync {
    /// Returns the handler for `command`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if no handler is registered for
    /// the command's type, or `DomainError::ServiceNotFound` if a lazily
    /// resolved handler cannot be built.
    fn route(&self, command: &dyn Command) -> Result<Arc<dyn CommandHandler>, DomainError>;
}

/// Router holding command handler instances directly.
pub type InMemoryCommandRouter = InMemoryRouter<dyn CommandHandler>;

/// Router that maps command types to service ids and builds the handler
/// from a [`ServiceContainer`] when a command is routed.
pub type ServiceAwareCommandRouter = ServiceAwareRouter<dyn CommandHandler>;

impl InMemoryRouter<dyn CommandHandler> {
    /// Registers `handler` for commands of type `C`, replacing any previous
    /// registration.
    pub fn register_handler<C>(&mut self, handler: Arc<dyn CommandHandler>) -> &mut Self
    where
        C: Command + PayloadType,
    {
        self.insert(C::type_tag(), handler);
        self
    }
}

impl CommandRouter for InMemoryRouter<dyn CommandHandler> {
    fn route(&self, command: &dyn Command) -> Result<Arc<dyn CommandHandler>, DomainError> {
        self.get_handler(&command.payload_type())
    }
}

fn resolve_handler<H>(
    container: &ServiceContainer,
    service_id: &str,
) -> Result<Arc<dyn CommandHandler>, DomainError>
where
    H: CommandHandler + 'static,
{
    let handler: Arc<dyn CommandHandler> = container.get::<H>(service_id)?;
    Ok(handler)
}

impl ServiceAwareRouter<dyn CommandHandler> {
    /// Routes commands of type `C` to the service `service_id`, which must
    /// hold an `Arc<H>` by dispatch time.
    pub fn register_handler<C, H>(&mut self, service_id: impl Into<String>) -> &mut Self
    where
        C: Command + PayloadType,
        H: CommandHandler + 'static,
    {
        self.bind(
            C::type_tag(),
            ServiceBinding::new(service_id, resolve_handler::<H>),
        );
        self
    }
}

impl CommandRouter for ServiceAwareRouter<dyn CommandHandler> {
    fn route(&self, command: &dyn Command) -> Result<Arc<dyn CommandHandler>, DomainError> {
        self.get_handler(&command.payload_type())
    }
}
