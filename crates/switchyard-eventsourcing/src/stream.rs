//! Ordered, read-only view over one aggregate's records.

use std::slice;
use std::vec;

use crate::record::EventRecord;

/// Sorted, deduplicated records of a single aggregate, with the version
/// watermarks at the time the stream was taken.
#[derive(Debug, Clone, Default)]
pub struct EventStream {
    records: Vec<EventRecord>,
    committed_version: Option<u64>,
    current_version: Option<u64>,
}

impl EventStream {
    /// Builds a stream, sorting `records` by sequence number and dropping
    /// records equal to one already kept.
    #[must_use]
    pub fn new(
        records: impl IntoIterator<Item = EventRecord>,
        committed_version: Option<u64>,
        current_version: Option<u64>,
    ) -> Self {
        let mut records: Vec<EventRecord> = records.into_iter().collect();
        records.sort();
        records.dedup();
        Self {
            records,
            committed_version,
            current_version,
        }
    }

    /// Builds a stream of stored history: nothing committed before it and
    /// the current version at its last record.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = EventRecord>) -> Self {
        let mut stream = Self::new(records, None, None);
        stream.current_version = stream.last_sequence();
        stream
    }

    /// Version committed before these records were recorded.
    #[must_use]
    pub fn committed_version(&self) -> Option<u64> {
        self.committed_version
    }

    /// Version after the last record.
    #[must_use]
    pub fn current_version(&self) -> Option<u64> {
        self.current_version
    }

    /// Sequence number of the last record.
    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        self.records.last().map(EventRecord::sequence_number)
    }

    /// Records in ascending sequence order.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Iterates records in ascending sequence order.
    pub fn iter(&self) -> slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the stream has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for EventStream {
    type Item = EventRecord;
    type IntoIter = vec::IntoIter<EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventStream {
    type Item = &'a EventRecord;
    type IntoIter = slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::message::EventMessage;
    use switchyard_test_support::UserRegisteredEvent;
    use uuid::Uuid;

    use super::*;

    fn record(id: &Uuid, sequence: u64) -> EventRecord {
        let message = EventMessage::create(UserRegisteredEvent::new(
            "jsmith@example.com",
            "James",
            "Smith",
            "D",
        ));
        EventRecord::new(message, id, "Accounts.User", sequence)
    }

    #[test]
    fn test_stream_sorts_and_deduplicates() {
        // Arrange
        let id = Uuid::new_v4();
        let first = record(&id, 0);
        let second = record(&id, 1);
        let third = record(&id, 2);

        // Act
        let stream = EventStream::from_records(vec![
            third.clone(),
            first.clone(),
            second.clone(),
            first.clone(),
        ]);

        // Assert
        let sequences: Vec<u64> = stream.iter().map(EventRecord::sequence_number).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.current_version(), Some(2));
        assert_eq!(stream.committed_version(), None);
    }

    #[test]
    fn test_duplicates_interleaved_at_one_sequence_are_dropped() {
        // Arrange
        let id = Uuid::new_v4();
        let first = record(&id, 1);
        let second = record(&id, 1);

        // Act
        let stream = EventStream::new(
            vec![first.clone(), second.clone(), first.clone(), second.clone()],
            Some(0),
            Some(1),
        );

        // Assert
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.iter().filter(|r| **r == first).count(), 1);
        assert_eq!(stream.iter().filter(|r| **r == second).count(), 1);
    }

    #[test]
    fn test_empty_stream() {
        let stream = EventStream::from_records(Vec::new());

        assert!(stream.is_empty());
        assert_eq!(stream.last_sequence(), None);
        assert_eq!(stream.into_iter().count(), 0);
    }
}
