//! Queries for the accounts context.

use serde::{Deserialize, Serialize};
use switchyard_core::payload::{PayloadType, Query};
use uuid::Uuid;

/// Query for the profile of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserProfile {
    /// The account identifier.
    pub user_id: Uuid,
}

impl PayloadType for GetUserProfile {
    const TYPE_NAME: &'static str = "Accounts.User.GetUserProfile";
}

impl Query for GetUserProfile {}
