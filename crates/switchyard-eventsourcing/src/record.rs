//! Event records: an event message placed in one aggregate's history.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde_json::Value;
use sha2::{Digest, Sha256};
use switchyard_core::error::DomainError;
use switchyard_core::message::{EventMessage, MessageData, PayloadRegistry};
use switchyard_core::payload::Event;
use switchyard_core::type_tag::TypeTag;

use crate::aggregate_id::AggregateId;

/// An event message with the aggregate it belongs to and its position in
/// that aggregate's history.
///
/// Records of one aggregate order by sequence number, then event id; two
/// records compare equal exactly when they are `==`. Comparing records of
/// different aggregates is a programming error.
#[derive(Debug, Clone)]
pub struct EventRecord {
    event_message: EventMessage,
    aggregate_id: String,
    aggregate_id_type: TypeTag,
    aggregate_type: TypeTag,
    sequence_number: u64,
}

impl EventRecord {
    /// Places `event_message` at `sequence_number` in the history of the
    /// `aggregate_type` aggregate identified by `aggregate_id`.
    #[must_use]
    pub fn new<I: AggregateId>(
        event_message: EventMessage,
        aggregate_id: &I,
        aggregate_type: &str,
        sequence_number: u64,
    ) -> Self {
        Self::from_parts(
            event_message,
            aggregate_id.to_string(),
            I::type_tag(),
            TypeTag::new(aggregate_type),
            sequence_number,
        )
    }

    pub(crate) fn from_parts(
        event_message: EventMessage,
        aggregate_id: String,
        aggregate_id_type: TypeTag,
        aggregate_type: TypeTag,
        sequence_number: u64,
    ) -> Self {
        Self {
            event_message,
            aggregate_id,
            aggregate_id_type,
            aggregate_type,
            sequence_number,
        }
    }

    /// The wrapped event message.
    #[must_use]
    pub fn event_message(&self) -> &EventMessage {
        &self.event_message
    }

    /// The event payload.
    #[must_use]
    pub fn event(&self) -> &dyn Event {
        self.event_message.payload()
    }

    /// The aggregate id in display form.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// The aggregate id parsed as `I`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the stored id is not an `I`.
    pub fn aggregate_id_as<I: AggregateId>(&self) -> Result<I, DomainError> {
        I::parse_id(&self.aggregate_id)
    }

    /// Type of the aggregate id.
    #[must_use]
    pub fn aggregate_id_type(&self) -> &TypeTag {
        &self.aggregate_id_type
    }

    /// Type of the aggregate.
    #[must_use]
    pub fn aggregate_type(&self) -> &TypeTag {
        &self.aggregate_type
    }

    /// Position in the aggregate's history, starting at 0.
    #[must_use]
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Whether `other` belongs to the same aggregate instance.
    #[must_use]
    pub fn same_aggregate(&self, other: &Self) -> bool {
        self.aggregate_type == other.aggregate_type && self.aggregate_id == other.aggregate_id
    }

    /// SHA-256 hex digest of aggregate type, aggregate id, sequence number
    /// and event id.
    #[must_use]
    pub fn hash_value(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.aggregate_type.as_str());
        hasher.update(b"|");
        hasher.update(&self.aggregate_id);
        hasher.update(b"|");
        hasher.update(self.sequence_number.to_string());
        hasher.update(b"|");
        hasher.update(self.event_message.id().to_string());
        hex::encode(hasher.finalize())
    }

    /// Map form for storage.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the event cannot be converted.
    pub fn to_array(&self) -> Result<MessageData, DomainError> {
        let mut data = MessageData::new();
        data.insert(
            "event_message".to_owned(),
            Value::Object(self.event_message.to_array()?),
        );
        data.insert("aggregate_id".to_owned(), Value::from(self.aggregate_id.clone()));
        data.insert(
            "aggregate_id_type".to_owned(),
            Value::from(self.aggregate_id_type.to_string()),
        );
        data.insert(
            "aggregate_type".to_owned(),
            Value::from(self.aggregate_type.to_string()),
        );
        data.insert("sequence_number".to_owned(), Value::from(self.sequence_number));
        Ok(data)
    }

    /// Rebuilds a record from its map form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a field is missing or malformed,
    /// or `DomainError::InvalidPayloadType` if the event type is not in
    /// `registry`.
    pub fn from_array(
        data: &MessageData,
        registry: &PayloadRegistry<dyn Event>,
    ) -> Result<Self, DomainError> {
        let Value::Object(message) = field(data, "event_message")? else {
            return Err(invalid(data));
        };
        let sequence_number = field(data, "sequence_number")?
            .as_u64()
            .ok_or_else(|| invalid(data))?;
        Ok(Self::from_parts(
            EventMessage::deserialize(message, registry)?,
            string_field(data, "aggregate_id")?.to_owned(),
            TypeTag::new(string_field(data, "aggregate_id_type")?),
            TypeTag::new(string_field(data, "aggregate_type")?),
            sequence_number,
        ))
    }
}

fn invalid(data: &MessageData) -> DomainError {
    DomainError::Validation(format!(
        "Invalid event record format: {}",
        Value::Object(data.clone())
    ))
}

fn field<'a>(data: &'a MessageData, key: &str) -> Result<&'a Value, DomainError> {
    data.get(key).ok_or_else(|| invalid(data))
}

fn string_field<'a>(data: &'a MessageData, key: &str) -> Result<&'a str, DomainError> {
    field(data, key)?.as_str().ok_or_else(|| invalid(data))
}

impl PartialEq for EventRecord {
    fn eq(&self, other: &Self) -> bool {
        self.same_aggregate(other)
            && self.sequence_number == other.sequence_number
            && self.event_message.id() == other.event_message.id()
    }
}

impl Eq for EventRecord {}

impl Hash for EventRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.aggregate_type.hash(state);
        self.aggregate_id.hash(state);
        self.sequence_number.hash(state);
        self.event_message.id().hash(state);
    }
}

impl PartialOrd for EventRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert!(
            self.same_aggregate(other),
            "cannot compare records of {} {} and {} {}",
            self.aggregate_type,
            self.aggregate_id,
            other.aggregate_type,
            other.aggregate_id
        );
        self.sequence_number
            .cmp(&other.sequence_number)
            .then_with(|| self.event_message.id().cmp(&other.event_message.id()))
            .then_with(|| self.aggregate_type.cmp(&other.aggregate_type))
            .then_with(|| self.aggregate_id.cmp(&other.aggregate_id))
    }
}
