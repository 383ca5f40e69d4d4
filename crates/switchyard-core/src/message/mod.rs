//! Message envelopes and their building blocks.

mod envelope;
mod id;
mod meta_data;
mod registry;
mod serialized;
pub mod timestamp;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub use envelope::{CommandMessage, Envelope, EventMessage, QueryMessage};
pub use id::MessageId;
pub use meta_data::MetaData;
pub use registry::PayloadRegistry;
pub use serialized::{MessageData, SerializedMessage};

/// Kind of an envelope, written as its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// A `CommandMessage`.
    Command,
    /// An `EventMessage`.
    Event,
    /// A `QueryMessage`.
    Query,
}

impl MessageType {
    /// Returns the serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Event => "event",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(Self::Command),
            "event" => Ok(Self::Event),
            "query" => Ok(Self::Query),
            other => Err(DomainError::Validation(format!(
                "unknown message type: {other}"
            ))),
        }
    }
}
