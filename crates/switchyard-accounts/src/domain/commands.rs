//! Commands for the accounts context.

use serde::{Deserialize, Serialize};
use switchyard_core::payload::{Command, PayloadType};
use uuid::Uuid;

/// Command to register a new user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUser {
    /// Identifier chosen by the caller for the new account.
    pub user_id: Uuid,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Middle name, empty when there is none.
    #[serde(default)]
    pub middle_name: String,
}

impl PayloadType for RegisterUser {
    const TYPE_NAME: &'static str = "Accounts.User.RegisterUser";
}

impl Command for RegisterUser {}

/// Command to change a user's login email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEmail {
    /// The account to change.
    pub user_id: Uuid,
    /// The new email.
    pub email: String,
}

impl PayloadType for ChangeEmail {
    const TYPE_NAME: &'static str = "Accounts.User.ChangeEmail";
}

impl Command for ChangeEmail {}
