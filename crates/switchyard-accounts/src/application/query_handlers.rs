//! Query handlers for the accounts context.
//!
//! Handlers reconstitute the aggregate from its records and return
//! read-only views.

use serde::Serialize;
use switchyard_core::error::DomainError;
use switchyard_eventsourcing::aggregate::AggregateRoot;
use uuid::Uuid;

use crate::application::repository::UserAccountRepository;
use crate::domain::queries::GetUserProfile;

/// Read-only view of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfileView {
    /// The account identifier.
    pub user_id: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Sequence number of the newest stored event.
    pub version: Option<u64>,
}

/// Answers `GetUserProfile`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the account does not exist.
pub fn get_user_profile(
    query: &GetUserProfile,
    repository: &UserAccountRepository,
) -> Result<UserProfileView, DomainError> {
    let account = repository.load(query.user_id).ok_or_else(|| {
        DomainError::Validation(format!("user account {} not found", query.user_id))
    })?;
    Ok(UserProfileView {
        user_id: query.user_id,
        email: account.email().to_owned(),
        full_name: account.full_name(),
        version: account.committed_version(),
    })
}
