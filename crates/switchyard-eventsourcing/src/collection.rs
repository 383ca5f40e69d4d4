//! Per-aggregate buffer of recorded events.

use switchyard_core::message::EventMessage;
use switchyard_core::type_tag::TypeTag;
use tracing::trace;

use crate::aggregate_id::AggregateId;
use crate::record::EventRecord;
use crate::stream::EventStream;

/// Records events for one aggregate instance with gap-free sequence numbers.
///
/// Numbering starts at 0, or one past the committed sequence when the
/// aggregate was loaded from history. [`EventCollection::commit`] empties
/// the buffer and keeps the last sequence as the committed watermark.
#[derive(Debug, Clone)]
pub struct EventCollection {
    aggregate_id: String,
    aggregate_id_type: TypeTag,
    aggregate_type: TypeTag,
    committed_sequence: Option<u64>,
    last_sequence: Option<u64>,
    records: Vec<EventRecord>,
}

impl EventCollection {
    /// Creates an empty collection for the given aggregate.
    #[must_use]
    pub fn new<I: AggregateId>(aggregate_id: &I, aggregate_type: &str) -> Self {
        Self {
            aggregate_id: aggregate_id.to_string(),
            aggregate_id_type: I::type_tag(),
            aggregate_type: TypeTag::new(aggregate_type),
            committed_sequence: None,
            last_sequence: None,
            records: Vec::new(),
        }
    }

    /// Resumes numbering after `committed_sequence`.
    ///
    /// Must be called before anything is recorded; doing otherwise is a
    /// programming error.
    pub fn initialize_sequence(&mut self, committed_sequence: u64) {
        debug_assert!(
            self.records.is_empty(),
            "cannot initialize the sequence of {} {} after recording events",
            self.aggregate_type,
            self.aggregate_id
        );
        self.committed_sequence = Some(committed_sequence);
        self.last_sequence = Some(committed_sequence);
    }

    /// Appends `event_message` with the next sequence number and returns it.
    pub fn record(&mut self, event_message: EventMessage) -> u64 {
        let sequence = self.last_sequence().map_or(0, |last| last + 1);
        trace!(
            aggregate_type = %self.aggregate_type,
            aggregate_id = %self.aggregate_id,
            sequence,
            payload_type = %event_message.payload_type(),
            "recording event"
        );
        self.records.push(EventRecord::from_parts(
            event_message,
            self.aggregate_id.clone(),
            self.aggregate_id_type.clone(),
            self.aggregate_type.clone(),
            sequence,
        ));
        self.last_sequence = Some(sequence);
        sequence
    }

    /// Sequence of the newest record, or the committed sequence when the
    /// buffer is empty.
    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        if self.records.is_empty() {
            self.committed_sequence
        } else {
            self.last_sequence
        }
    }

    /// The committed watermark.
    #[must_use]
    pub fn committed_sequence(&self) -> Option<u64> {
        self.committed_sequence
    }

    /// Snapshot of the buffered records.
    #[must_use]
    pub fn stream(&self) -> EventStream {
        EventStream::new(
            self.records.iter().cloned(),
            self.committed_sequence,
            self.last_sequence(),
        )
    }

    /// Marks everything recorded so far as committed and empties the buffer.
    pub fn commit(&mut self) {
        self.committed_sequence = self.last_sequence();
        self.records.clear();
    }

    /// Buffered records.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
