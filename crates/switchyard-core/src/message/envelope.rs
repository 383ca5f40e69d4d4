use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::serialized::{MessageData, SerializedMessage};
use super::{MessageId, MessageType, MetaData, PayloadRegistry, timestamp};
use crate::clock::{Clock, SystemClock};
use crate::error::DomainError;
use crate::payload::{Command, Event, IntoPayload, Payload, PayloadKind, Query};
use crate::type_tag::TypeTag;

const REQUIRED_KEYS: [&str; 6] = ["id", "type", "timestamp", "meta_data", "payload_type", "payload"];

/// An immutable message wrapping a payload with identity, time and metadata.
///
/// `P` is the erased payload kind, so the concrete envelopes are
/// [`CommandMessage`], [`EventMessage`] and [`QueryMessage`]. Two envelopes
/// are equal when their ids are equal, and they order by id.
pub struct Envelope<P: ?Sized> {
    id: MessageId,
    timestamp: DateTime<Utc>,
    payload: Arc<P>,
    meta_data: MetaData,
}

/// Envelope for commands.
pub type CommandMessage = Envelope<dyn Command>;

/// Envelope for events.
pub type EventMessage = Envelope<dyn Event>;

/// Envelope for queries.
pub type QueryMessage = Envelope<dyn Query>;

impl<P> Envelope<P>
where
    P: ?Sized + Payload + PayloadKind,
{
    /// Wraps `payload` with a fresh id, the current time and empty metadata.
    pub fn create<T: IntoPayload<P>>(payload: T) -> Self {
        Self::create_at(payload, &SystemClock)
    }

    /// Like [`Envelope::create`], taking the time from `clock`.
    pub fn create_at<T: IntoPayload<P>>(payload: T, clock: &dyn Clock) -> Self {
        Self::from_parts(
            MessageId::generate(),
            timestamp::truncate(clock.now()),
            payload.into_payload(),
            MetaData::new(),
        )
    }

    /// Assembles an envelope from existing parts.
    #[must_use]
    pub fn from_parts(
        id: MessageId,
        timestamp: DateTime<Utc>,
        payload: Arc<P>,
        meta_data: MetaData,
    ) -> Self {
        Self {
            id,
            timestamp,
            payload,
            meta_data,
        }
    }

    /// The message identifier.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The envelope kind; fixed per payload kind.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        P::MESSAGE_TYPE
    }

    /// When the message was created.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The erased payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The shared payload handle.
    #[must_use]
    pub fn shared_payload(&self) -> &Arc<P> {
        &self.payload
    }

    /// Canonical type tag of the payload.
    #[must_use]
    pub fn payload_type(&self) -> TypeTag {
        self.payload.payload_type()
    }

    /// Downcasts the payload to its concrete type.
    #[must_use]
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// The attached metadata.
    #[must_use]
    pub fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }

    /// Returns a copy with `meta_data` replacing the current metadata.
    #[must_use]
    pub fn with_meta_data(&self, meta_data: MetaData) -> Self {
        Self::from_parts(self.id, self.timestamp, Arc::clone(&self.payload), meta_data)
    }

    /// Returns a copy with `meta_data` merged over the current metadata.
    #[must_use]
    pub fn merge_meta_data(&self, meta_data: &MetaData) -> Self {
        let mut merged = self.meta_data.clone();
        merged.merge(meta_data);
        self.with_meta_data(merged)
    }

    /// Canonical map form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload cannot be converted
    /// to an array.
    pub fn to_array(&self) -> Result<MessageData, DomainError> {
        let mut data = MessageData::new();
        data.insert("id".to_owned(), Value::from(self.id.to_string()));
        data.insert("type".to_owned(), Value::from(P::MESSAGE_TYPE.as_str()));
        data.insert("timestamp".to_owned(), Value::from(timestamp::format(&self.timestamp)));
        data.insert("payload_type".to_owned(), Value::from(self.payload_type().to_string()));
        data.insert("payload".to_owned(), Value::Object(self.payload.to_array()?));
        data.insert("meta_data".to_owned(), Value::Object(self.meta_data.as_map().clone()));
        Ok(data)
    }

    /// Compact JSON text of the canonical map.
    ///
    /// # Errors
    ///
    /// See [`Envelope::to_array`].
    pub fn to_json(&self) -> Result<String, DomainError> {
        Ok(Value::Object(self.to_array()?).to_string())
    }

    /// Serializes into the form queues and stores carry.
    ///
    /// # Errors
    ///
    /// See [`Envelope::to_array`].
    pub fn serialize(&self) -> Result<SerializedMessage, DomainError> {
        SerializedMessage::from_map(self.to_array()?)
    }

    /// Rebuilds an envelope from its canonical map.
    ///
    /// # Errors
    ///
    /// * `DomainError::Validation` if a required key is missing, the `type`
    ///   does not match this envelope kind, or a field is malformed.
    /// * `DomainError::InvalidPayloadType` if `payload_type` is not in
    ///   `registry`.
    pub fn deserialize(data: &MessageData, registry: &PayloadRegistry<P>) -> Result<Self, DomainError> {
        if !REQUIRED_KEYS.iter().all(|key| data.contains_key(*key)) {
            return Err(DomainError::Validation(format!(
                "Invalid serialization format: {}",
                Value::Object(data.clone())
            )));
        }

        let message_type = data["type"].as_str().unwrap_or_default();
        if message_type != P::MESSAGE_TYPE.as_str() {
            return Err(DomainError::Validation(format!(
                "Invalid message type: expected {}, found {}",
                P::MESSAGE_TYPE,
                data["type"]
            )));
        }

        let id = MessageId::parse(string_field(data, "id")?)?;
        let timestamp = timestamp::parse(string_field(data, "timestamp")?)?;
        let payload_type = TypeTag::new(string_field(data, "payload_type")?);
        let payload_data = data["payload"].as_object().ok_or_else(|| {
            DomainError::Validation(format!("payload must be a map, got {}", data["payload"]))
        })?;
        let meta_data = match &data["meta_data"] {
            Value::Object(map) => MetaData::from_map(map.clone())?,
            // An empty list stands in for an empty map.
            Value::Array(items) if items.is_empty() => MetaData::new(),
            other => {
                return Err(DomainError::Validation(format!(
                    "meta_data must be a map, got {other}"
                )));
            }
        };

        let payload = registry.build(&payload_type, payload_data)?;
        Ok(Self::from_parts(id, timestamp, payload, meta_data))
    }

    /// Rebuilds an envelope from a queued message.
    ///
    /// # Errors
    ///
    /// See [`Envelope::deserialize`].
    pub fn from_serialized(
        message: &SerializedMessage,
        registry: &PayloadRegistry<P>,
    ) -> Result<Self, DomainError> {
        Self::deserialize(message.as_map(), registry)
    }
}

fn string_field<'a>(data: &'a MessageData, key: &str) -> Result<&'a str, DomainError> {
    data[key]
        .as_str()
        .ok_or_else(|| DomainError::Validation(format!("{key} must be a string, got {}", data[key])))
}

impl<P: ?Sized> Clone for Envelope<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            timestamp: self.timestamp,
            payload: Arc::clone(&self.payload),
            meta_data: self.meta_data.clone(),
        }
    }
}

impl<P: ?Sized + fmt::Debug> fmt::Debug for Envelope<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .field("payload", &self.payload)
            .field("meta_data", &self.meta_data)
            .finish()
    }
}

impl<P: ?Sized> PartialEq for Envelope<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P: ?Sized> Eq for Envelope<P> {}

impl<P: ?Sized> Hash for Envelope<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<P: ?Sized> PartialOrd for Envelope<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: ?Sized> Ord for Envelope<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
