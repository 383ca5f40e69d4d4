use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{MessageId, MessageType};
use crate::error::DomainError;

/// Canonical map form of an envelope.
pub type MessageData = Map<String, Value>;

/// An envelope in canonical map form, as carried by queues and stores.
///
/// Only `id` and `type` are checked here; the full shape is checked when the
/// message is deserialized back into an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageData", into = "MessageData")]
pub struct SerializedMessage {
    id: MessageId,
    message_type: MessageType,
    data: MessageData,
}

impl SerializedMessage {
    /// Wraps a canonical map.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `id` or `type` is missing or
    /// malformed.
    pub fn from_map(data: MessageData) -> Result<Self, DomainError> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::Validation(format!("message without id: {}", Value::Object(data.clone()))))?
            .parse::<MessageId>()?;
        let message_type = data
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::Validation(format!("message without type: {}", Value::Object(data.clone()))))?
            .parse::<MessageType>()?;
        Ok(Self {
            id,
            message_type,
            data,
        })
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for invalid JSON or a document that
    /// is not a message map.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => Self::from_map(map),
            Ok(other) => Err(DomainError::Validation(format!("message must be a map, got {other}"))),
            Err(e) => Err(DomainError::Validation(format!("invalid message JSON: {e}"))),
        }
    }

    /// The message identifier.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The envelope kind.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// The canonical map.
    #[must_use]
    pub fn as_map(&self) -> &MessageData {
        &self.data
    }

    /// Consumes `self`, returning the canonical map.
    #[must_use]
    pub fn into_map(self) -> MessageData {
        self.data
    }

    /// Compact JSON text of the canonical map.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.data.clone()).to_string()
    }
}

impl TryFrom<MessageData> for SerializedMessage {
    type Error = DomainError;

    fn try_from(data: MessageData) -> Result<Self, Self::Error> {
        Self::from_map(data)
    }
}

impl From<SerializedMessage> for MessageData {
    fn from(message: SerializedMessage) -> Self {
        message.data
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> MessageData {
        match json!({
            "id": "0150deae-68df-40ca-aea1-6b4b06aadfc3",
            "type": "event",
            "timestamp": "2015-11-06T15:23:03.000000[UTC]",
            "payload_type": "Accounts.UserRegistered",
            "payload": {},
            "meta_data": {}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_from_map_extracts_id_and_type() {
        let message = SerializedMessage::from_map(sample()).unwrap();
        assert_eq!(message.id().to_string(), "0150deae-68df-40ca-aea1-6b4b06aadfc3");
        assert_eq!(message.message_type(), MessageType::Event);
    }

    #[test]
    fn test_from_map_rejects_missing_id_and_unknown_type() {
        let mut no_id = sample();
        no_id.remove("id");
        assert!(SerializedMessage::from_map(no_id).is_err());

        let mut bad_type = sample();
        bad_type.insert("type".to_owned(), json!("notification"));
        assert!(SerializedMessage::from_map(bad_type).is_err());
    }

    #[test]
    fn test_into_map_returns_the_canonical_map() {
        let message = SerializedMessage::from_map(sample()).unwrap();

        let map = message.into_map();

        assert_eq!(map, sample());
        assert_eq!(map.keys().next().map(String::as_str), Some("id"));
    }

    #[test]
    fn test_json_round_trip_keeps_key_order() {
        let message = SerializedMessage::from_map(sample()).unwrap();
        let json = message.to_json();
        assert!(json.starts_with(r#"{"id":"0150deae-68df-40ca-aea1-6b4b06aadfc3","type":"event""#));
        assert_eq!(SerializedMessage::from_json(&json).unwrap(), message);
        assert!(SerializedMessage::from_json("[1,2]").is_err());
    }
}
