//! Command handlers for the accounts context.
//!
//! Each handler loads the aggregate, executes the command, appends the
//! extracted stream to the repository and only then publishes its events.

use switchyard_bus::event::EventDispatcher;
use switchyard_core::clock::Clock;
use switchyard_core::error::DomainError;
use switchyard_eventsourcing::aggregate::AggregateRoot;
use switchyard_eventsourcing::stream::EventStream;
use tracing::info;
use uuid::Uuid;

use crate::application::repository::UserAccountRepository;
use crate::domain::aggregates::UserAccount;
use crate::domain::commands::{ChangeEmail, RegisterUser};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct AccountCommandResult {
    /// The account affected or created by the command.
    pub user_id: Uuid,
    /// The records appended and published.
    pub stream: EventStream,
}

fn publish(stream: &EventStream, events: &dyn EventDispatcher) -> Result<(), DomainError> {
    for record in stream {
        events.dispatch(record.event_message())?;
    }
    Ok(())
}

fn persist_and_publish(
    user_id: Uuid,
    account: &mut UserAccount,
    repository: &UserAccountRepository,
    events: &dyn EventDispatcher,
) -> Result<AccountCommandResult, DomainError> {
    let stream = account.extract_recorded_events();
    repository.append(user_id, &stream)?;
    publish(&stream, events)?;
    Ok(AccountCommandResult { user_id, stream })
}

/// Handles `RegisterUser`: creates the account and publishes
/// `UserRegistered`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id or email is already taken or
/// the input is invalid, otherwise the repository's or a handler's error.
pub fn handle_register_user(
    command: &RegisterUser,
    clock: &dyn Clock,
    repository: &UserAccountRepository,
    events: &dyn EventDispatcher,
) -> Result<AccountCommandResult, DomainError> {
    if repository.load(command.user_id).is_some() {
        return Err(DomainError::Validation(format!(
            "user account {} already exists",
            command.user_id
        )));
    }
    if repository.email_in_use(&command.email) {
        return Err(DomainError::Validation(format!(
            "email {} is already registered",
            command.email
        )));
    }

    let mut account = UserAccount::register(
        command.user_id,
        &command.email,
        &command.first_name,
        &command.last_name,
        &command.middle_name,
        clock,
    )?;
    info!(user_id = %command.user_id, "user account registered");
    persist_and_publish(command.user_id, &mut account, repository, events)
}

/// Handles `ChangeEmail`: reconstitutes the account and publishes
/// `EmailChanged` when the address actually changes.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the account does not exist or the
/// email is invalid or taken, otherwise the repository's or a handler's
/// error.
pub fn handle_change_email(
    command: &ChangeEmail,
    clock: &dyn Clock,
    repository: &UserAccountRepository,
    events: &dyn EventDispatcher,
) -> Result<AccountCommandResult, DomainError> {
    let mut account = repository.load(command.user_id).ok_or_else(|| {
        DomainError::Validation(format!("user account {} not found", command.user_id))
    })?;
    if account.email() != command.email && repository.email_in_use(&command.email) {
        return Err(DomainError::Validation(format!(
            "email {} is already registered",
            command.email
        )));
    }

    account.change_email(&command.email, clock)?;
    persist_and_publish(command.user_id, &mut account, repository, events)
}
