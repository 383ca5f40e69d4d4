//! Queue and store collaborator contracts.
//!
//! Queueing buses and dispatchers only ever call
//! [`MessageQueue::enqueue`]; consumers outside the dispatch path use
//! `dequeue` and `acknowledge`. Delivery guarantees belong to the
//! implementation.

use crate::error::DomainError;
use crate::message::{MessageId, SerializedMessage};

/// A channel-addressed message queue.
pub trait MessageQueue: Send + Sync {
    /// Appends `message` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend rejects the
    /// message.
    fn enqueue(&self, channel: &str, message: SerializedMessage) -> Result<(), DomainError>;

    /// Takes the next message from `channel`, if any.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend fails.
    fn dequeue(&self, channel: &str) -> Result<Option<SerializedMessage>, DomainError>;

    /// Confirms that a dequeued message was handled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend fails.
    fn acknowledge(&self, channel: &str, message: &SerializedMessage) -> Result<(), DomainError>;
}

/// Id-keyed storage for serialized messages.
pub trait MessageStore: Send + Sync {
    /// Stores `message`, replacing any message with the same id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend fails.
    fn add(&self, message: SerializedMessage) -> Result<(), DomainError>;

    /// Returns the message with `id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend fails.
    fn get(&self, id: MessageId) -> Result<Option<SerializedMessage>, DomainError>;

    /// Returns every stored message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend fails.
    fn get_all(&self) -> Result<Vec<SerializedMessage>, DomainError>;

    /// Removes the message with `id`; missing ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backend fails.
    fn remove(&self, id: MessageId) -> Result<(), DomainError>;
}
