//! Payload contracts for commands, events and queries.
//!
//! Concrete payloads are plain serde types that implement [`PayloadType`]
//! plus one of the [`Command`], [`Event`] or [`Query`] markers. Envelopes
//! carry them type-erased as `Arc<dyn Command>` (and so on); handlers
//! recover the concrete type with [`Payload::as_any`].

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DomainError;
use crate::message::MessageType;
use crate::type_tag::TypeTag;

/// Array form of a payload: a string-keyed JSON map.
pub type PayloadData = serde_json::Map<String, Value>;

/// Object-safe view of a payload.
pub trait Payload: Any + Debug + Send + Sync {
    /// Canonical type tag of the concrete payload.
    fn payload_type(&self) -> TypeTag;

    /// Converts the payload to its array form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload does not serialize to
    /// a map.
    fn to_array(&self) -> Result<PayloadData, DomainError>;

    /// Returns the payload as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Static side of a payload: its type name and array reconstruction.
pub trait PayloadType: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    /// Type name used for routing and serialization.
    const TYPE_NAME: &'static str;

    /// Canonical tag built from [`Self::TYPE_NAME`].
    #[must_use]
    fn type_tag() -> TypeTag {
        TypeTag::new(Self::TYPE_NAME)
    }

    /// Rebuilds the payload from its array form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` listing the offending map when
    /// required keys are missing or have the wrong shape.
    fn from_array(data: &PayloadData) -> Result<Self, DomainError> {
        let value = Value::Object(data.clone());
        serde_json::from_value(value.clone()).map_err(|e| {
            DomainError::Validation(format!(
                "invalid {} data {value}: {e}",
                Self::TYPE_NAME
            ))
        })
    }
}

impl<T: PayloadType> Payload for T {
    fn payload_type(&self) -> TypeTag {
        T::type_tag()
    }

    fn to_array(&self) -> Result<PayloadData, DomainError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(DomainError::Validation(format!(
                "{} must serialize to a map, got {other}",
                T::TYPE_NAME
            ))),
            Err(e) => Err(DomainError::Validation(format!(
                "{} serialization failed: {e}",
                T::TYPE_NAME
            ))),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marker for payloads carried by a `CommandMessage`.
pub trait Command: Payload {}

/// Marker for payloads carried by an `EventMessage`.
pub trait Event: Payload {}

/// Marker for payloads carried by a `QueryMessage`.
pub trait Query: Payload {}

/// Fixes the envelope type tag for each payload kind.
pub trait PayloadKind {
    /// The `type` field written by envelopes of this kind.
    const MESSAGE_TYPE: MessageType;
}

impl PayloadKind for dyn Command {
    const MESSAGE_TYPE: MessageType = MessageType::Command;
}

impl PayloadKind for dyn Event {
    const MESSAGE_TYPE: MessageType = MessageType::Event;
}

impl PayloadKind for dyn Query {
    const MESSAGE_TYPE: MessageType = MessageType::Query;
}

/// Erases a concrete payload into the shared form an envelope carries.
pub trait IntoPayload<P: ?Sized> {
    /// Wraps `self` for envelope `P`.
    fn into_payload(self) -> Arc<P>;
}

impl<C: Command> IntoPayload<dyn Command> for C {
    fn into_payload(self) -> Arc<dyn Command> {
        Arc::new(self)
    }
}

impl<E: Event> IntoPayload<dyn Event> for E {
    fn into_payload(self) -> Arc<dyn Event> {
        Arc::new(self)
    }
}

impl<Q: Query> IntoPayload<dyn Query> for Q {
    fn into_payload(self) -> Arc<dyn Query> {
        Arc::new(self)
    }
}
