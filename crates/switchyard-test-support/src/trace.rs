//! Shared, ordered record of what ran during a test.

use std::sync::{Arc, Mutex};

/// Cloneable list of trace entries, shared between handlers, filters and the
/// test body.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl TraceLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// Returns a snapshot of all entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}
