//! Event-sourced storage for user accounts.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use switchyard_core::error::DomainError;
use switchyard_eventsourcing::aggregate::EventSourcedAggregateRoot;
use switchyard_eventsourcing::record::EventRecord;
use switchyard_eventsourcing::stream::EventStream;
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::UserAccount;

/// In-memory record store for [`UserAccount`] aggregates.
///
/// Appends are checked against the stream's committed version, so two
/// writers working from the same history cannot both succeed.
#[derive(Debug, Default)]
pub struct UserAccountRepository {
    records: Mutex<HashMap<Uuid, Vec<EventRecord>>>,
}

impl UserAccountRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records of `user_id`, oldest first.
    #[must_use]
    pub fn records(&self, user_id: Uuid) -> Vec<EventRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.get(&user_id).cloned().unwrap_or_default()
    }

    /// Rebuilds the account from its records.
    #[must_use]
    pub fn load(&self, user_id: Uuid) -> Option<UserAccount> {
        let records = self.records(user_id);
        if records.is_empty() {
            return None;
        }
        Some(UserAccount::reconstitute(&records))
    }

    /// Whether any stored account currently uses `email`.
    #[must_use]
    pub fn email_in_use(&self, email: &str) -> bool {
        let ids: Vec<Uuid> = {
            let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            records.keys().copied().collect()
        };
        ids.into_iter()
            .filter_map(|id| self.load(id))
            .any(|account| account.email() == email)
    }

    /// Appends the records of `stream` to `user_id`'s history.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the stored history no longer
    /// ends at the stream's committed version.
    pub fn append(&self, user_id: Uuid, stream: &EventStream) -> Result<(), DomainError> {
        if stream.is_empty() {
            return Ok(());
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let history = records.entry(user_id).or_default();
        let stored_version = history.last().map(EventRecord::sequence_number);
        if stored_version != stream.committed_version() {
            return Err(DomainError::Infrastructure(format!(
                "concurrency conflict on user account {user_id}: expected version {:?}, found {stored_version:?}",
                stream.committed_version()
            )));
        }
        history.extend(stream.iter().cloned());
        debug!(
            user_id = %user_id,
            appended = stream.len(),
            version = ?stream.current_version(),
            "appended user account events"
        );
        Ok(())
    }
}
