//! Aggregate roots that record events instead of mutating state directly.

use switchyard_core::clock::{Clock, SystemClock};
use switchyard_core::message::EventMessage;
use switchyard_core::payload::{Event, IntoPayload};
use tracing::debug;

use crate::aggregate_id::AggregateId;
use crate::collection::EventCollection;
use crate::record::EventRecord;
use crate::stream::EventStream;

/// Event bookkeeping embedded in every aggregate root.
///
/// The collection is created on first use, with the aggregate id current at
/// that moment.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    collection: Option<EventCollection>,
    committed_version: Option<u64>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collection_mut<I: AggregateId>(&mut self, id: &I, aggregate_type: &str) -> &mut EventCollection {
        self.collection
            .get_or_insert_with(|| EventCollection::new(id, aggregate_type))
    }

    /// Records not yet extracted.
    #[must_use]
    pub fn pending(&self) -> &[EventRecord] {
        self.collection
            .as_ref()
            .map(EventCollection::records)
            .unwrap_or_default()
    }
}

/// An entity whose state changes only by recording events.
pub trait AggregateRoot: Send + Sync {
    /// Identifier type.
    type Id: AggregateId;

    /// Type name written into every record.
    const AGGREGATE_TYPE: &'static str;

    /// The aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// The embedded event log.
    fn event_log(&self) -> &EventLog;

    /// Mutable access to the embedded event log.
    fn event_log_mut(&mut self) -> &mut EventLog;

    /// Folds `event` into the aggregate's state. The default ignores every
    /// event; implementations usually delegate to an `EventAppliers` table.
    fn apply_event(&mut self, _event: &dyn Event) {}

    /// Applies `event`, then records it with the next sequence number.
    fn record_that<E: IntoPayload<dyn Event>>(&mut self, event: E) {
        self.record_that_at(event, &SystemClock);
    }

    /// Like [`AggregateRoot::record_that`], stamping the event with `clock`.
    fn record_that_at<E: IntoPayload<dyn Event>>(&mut self, event: E, clock: &dyn Clock) {
        let message = EventMessage::create_at(event, clock);
        self.apply_event(message.payload());
        let id = self.id().clone();
        self.event_log_mut()
            .collection_mut(&id, Self::AGGREGATE_TYPE)
            .record(message);
    }

    /// Takes the recorded events as a stream and commits them.
    ///
    /// The caller owns the stream from here on: persisting it and
    /// dispatching its events is not coordinated by the aggregate.
    fn extract_recorded_events(&mut self) -> EventStream {
        let id = self.id().clone();
        let log = self.event_log_mut();
        let collection = log.collection_mut(&id, Self::AGGREGATE_TYPE);
        let stream = collection.stream();
        collection.commit();
        log.committed_version = collection_committed(log);
        debug!(
            aggregate_type = Self::AGGREGATE_TYPE,
            aggregate_id = %id,
            events = stream.len(),
            "extracted recorded events"
        );
        stream
    }

    /// The version committed by the last extraction or reconstitution.
    fn committed_version(&self) -> Option<u64> {
        let log = self.event_log();
        log.committed_version.or_else(|| collection_committed(log))
    }

    /// Whether events were recorded since the last extraction.
    fn has_recorded_events(&self) -> bool {
        !self.event_log().pending().is_empty()
    }
}

fn collection_committed(log: &EventLog) -> Option<u64> {
    log.collection
        .as_ref()
        .and_then(EventCollection::committed_sequence)
}

/// An aggregate root that can be rebuilt from its history.
pub trait EventSourcedAggregateRoot: AggregateRoot + Default {
    /// Rebuilds an aggregate by replaying `records` in order.
    ///
    /// Replayed events are applied but not recorded, and the committed
    /// version becomes the last replayed sequence number.
    fn reconstitute<'a>(records: impl IntoIterator<Item = &'a EventRecord>) -> Self {
        let mut aggregate = Self::default();
        let mut last_sequence = None;
        for record in records {
            aggregate.apply_event(record.event());
            last_sequence = Some(record.sequence_number());
        }
        if let Some(last_sequence) = last_sequence {
            aggregate.initialize_committed_version(last_sequence);
        }
        aggregate
    }

    /// Sets the committed version and resumes numbering after it.
    ///
    /// Must be called before anything is recorded.
    fn initialize_committed_version(&mut self, version: u64) {
        let id = self.id().clone();
        let log = self.event_log_mut();
        log.collection_mut(&id, Self::AGGREGATE_TYPE)
            .initialize_sequence(version);
        log.committed_version = Some(version);
    }
}
