//! Aggregate roots for the accounts context.

use std::sync::LazyLock;

use switchyard_core::clock::Clock;
use switchyard_core::error::DomainError;
use switchyard_core::payload::Event;
use switchyard_eventsourcing::aggregate::{AggregateRoot, EventLog, EventSourcedAggregateRoot};
use switchyard_eventsourcing::appliers::EventAppliers;
use uuid::Uuid;

use super::events::{EmailChanged, UserRegistered};

static APPLIERS: LazyLock<EventAppliers<UserAccount>> = LazyLock::new(|| {
    EventAppliers::new()
        .on::<UserRegistered>(UserAccount::apply_registered)
        .on::<EmailChanged>(UserAccount::apply_email_changed)
});

/// The aggregate root for a user account.
#[derive(Debug, Default)]
pub struct UserAccount {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    middle_name: String,
    log: EventLog,
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::Validation(format!("invalid email address: {email:?}"))),
    }
}

impl UserAccount {
    /// Registers a new account and records `UserRegistered`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the email is malformed or a
    /// required name is blank.
    pub fn register(
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        validate_email(email)?;
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::Validation(
                "first and last name are required".to_owned(),
            ));
        }

        let mut account = Self::default();
        account.record_that_at(
            UserRegistered {
                user_id,
                email: email.to_owned(),
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                middle_name: middle_name.to_owned(),
            },
            clock,
        );
        Ok(account)
    }

    /// Changes the login email. Changing to the current email records
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `email` is malformed.
    pub fn change_email(&mut self, email: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        validate_email(email)?;
        if email == self.email {
            return Ok(());
        }
        self.record_that_at(
            EmailChanged {
                user_id: self.id,
                previous_email: self.email.clone(),
                email: email.to_owned(),
            },
            clock,
        );
        Ok(())
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Given name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Family name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Middle name, possibly empty.
    #[must_use]
    pub fn middle_name(&self) -> &str {
        &self.middle_name
    }

    /// Names joined for display, skipping an empty middle name.
    #[must_use]
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn apply_registered(&mut self, event: &UserRegistered) {
        self.id = event.user_id;
        self.email.clone_from(&event.email);
        self.first_name.clone_from(&event.first_name);
        self.last_name.clone_from(&event.last_name);
        self.middle_name.clone_from(&event.middle_name);
    }

    fn apply_email_changed(&mut self, event: &EmailChanged) {
        self.email.clone_from(&event.email);
    }
}

impl AggregateRoot for UserAccount {
    type Id = Uuid;
    const AGGREGATE_TYPE: &'static str = "Accounts.User.UserAccount";

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn event_log(&self) -> &EventLog {
        &self.log
    }

    fn event_log_mut(&mut self) -> &mut EventLog {
        &mut self.log
    }

    fn apply_event(&mut self, event: &dyn Event) {
        APPLIERS.apply(self, event);
    }
}

impl EventSourcedAggregateRoot for UserAccount {}
