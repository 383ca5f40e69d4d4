//! Builds the buses and registries for the accounts context.

use std::sync::Arc;

use switchyard_bus::command::{self, SynchronousCommandBus};
use switchyard_bus::event::EventDispatcher;
use switchyard_bus::query::{self, SynchronousQueryBus};
use switchyard_core::clock::Clock;
use switchyard_core::message::PayloadRegistry;
use switchyard_core::payload::{Command, Event, Query};

use crate::application::command_handlers::{handle_change_email, handle_register_user};
use crate::application::query_handlers::get_user_profile;
use crate::application::repository::UserAccountRepository;
use crate::domain::commands::{ChangeEmail, RegisterUser};
use crate::domain::events::{EmailChanged, UserRegistered};
use crate::domain::queries::GetUserProfile;

/// Commands this context accepts from a queue.
#[must_use]
pub fn command_registry() -> PayloadRegistry<dyn Command> {
    let mut registry = PayloadRegistry::new();
    registry.register::<RegisterUser>().register::<ChangeEmail>();
    registry
}

/// Events this context publishes.
#[must_use]
pub fn event_registry() -> PayloadRegistry<dyn Event> {
    let mut registry = PayloadRegistry::new();
    registry
        .register::<UserRegistered>()
        .register::<EmailChanged>();
    registry
}

/// Queries this context answers.
#[must_use]
pub fn query_registry() -> PayloadRegistry<dyn Query> {
    let mut registry = PayloadRegistry::new();
    registry.register::<GetUserProfile>();
    registry
}

/// Command bus with a handler for every accounts command. Events are
/// published to `events` after they are appended to `repository`.
#[must_use]
pub fn build_command_bus(
    repository: Arc<UserAccountRepository>,
    events: Arc<dyn EventDispatcher>,
    clock: Arc<dyn Clock>,
) -> SynchronousCommandBus {
    let mut bus = SynchronousCommandBus::default();

    let (repo, dispatcher, time) = (Arc::clone(&repository), Arc::clone(&events), Arc::clone(&clock));
    bus.register_handler::<RegisterUser>(command::handler_for(
        move |command: &RegisterUser, _| {
            handle_register_user(command, time.as_ref(), &repo, dispatcher.as_ref()).map(|_| ())
        },
    ));

    bus.register_handler::<ChangeEmail>(command::handler_for(
        move |command: &ChangeEmail, _| {
            handle_change_email(command, clock.as_ref(), &repository, events.as_ref()).map(|_| ())
        },
    ));

    bus
}

/// Query bus answering every accounts query from `repository`.
#[must_use]
pub fn build_query_bus(repository: Arc<UserAccountRepository>) -> SynchronousQueryBus {
    let mut bus = SynchronousQueryBus::default();
    bus.register_handler::<GetUserProfile>(query::handler_for(
        move |query: &GetUserProfile, _| get_user_profile(query, &repository),
    ));
    bus
}
