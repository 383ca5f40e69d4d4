//! Payload fixtures shared by the bus, queue and event-sourcing tests.

use serde::{Deserialize, Serialize};
use switchyard_core::payload::{Command, Event, PayloadType, Query};

/// Registers a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserCommand {
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Middle name or initial.
    pub middle_name: String,
}

impl RegisterUserCommand {
    /// The canonical James D. Smith registration.
    #[must_use]
    pub fn jsmith() -> Self {
        Self {
            email: "jsmith@example.com".to_owned(),
            first_name: "James".to_owned(),
            last_name: "Smith".to_owned(),
            middle_name: "D".to_owned(),
        }
    }
}

impl PayloadType for RegisterUserCommand {
    const TYPE_NAME: &'static str = "Tests.User.RegisterUserCommand";
}

impl Command for RegisterUserCommand {}

/// Changes a user's email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEmailCommand {
    /// Old email.
    pub from: String,
    /// New email.
    pub to: String,
}

impl PayloadType for ChangeEmailCommand {
    const TYPE_NAME: &'static str = "Tests.User.ChangeEmailCommand";
}

impl Command for ChangeEmailCommand {}

/// A user has registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegisteredEvent {
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Middle name or initial.
    pub middle_name: String,
}

impl UserRegisteredEvent {
    /// Builds the event from its four fields.
    #[must_use]
    pub fn new(email: &str, first_name: &str, last_name: &str, middle_name: &str) -> Self {
        Self {
            email: email.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            middle_name: middle_name.to_owned(),
        }
    }
}

impl PayloadType for UserRegisteredEvent {
    const TYPE_NAME: &'static str = "Tests.User.UserRegisteredEvent";
}

impl Event for UserRegisteredEvent {}

/// Looks a user up by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserQuery {
    /// Login email.
    pub email: String,
}

impl PayloadType for GetUserQuery {
    const TYPE_NAME: &'static str = "Tests.User.GetUserQuery";
}

impl Query for GetUserQuery {}
