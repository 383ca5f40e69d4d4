//! Domain events for the accounts context.

use serde::{Deserialize, Serialize};
use switchyard_core::payload::{Event, PayloadType};
use uuid::Uuid;

/// Emitted when a user account is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    /// The account identifier.
    pub user_id: Uuid,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Middle name, possibly empty.
    pub middle_name: String,
}

impl PayloadType for UserRegistered {
    const TYPE_NAME: &'static str = "Accounts.User.UserRegistered";
}

impl Event for UserRegistered {}

/// Emitted when a user changes their login email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChanged {
    /// The account identifier.
    pub user_id: Uuid,
    /// Email before the change.
    pub previous_email: String,
    /// Email after the change.
    pub email: String,
}

impl PayloadType for EmailChanged {
    const TYPE_NAME: &'static str = "Accounts.User.EmailChanged";
}

impl Event for EmailChanged {}
