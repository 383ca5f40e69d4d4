//! In-memory queue and store.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use switchyard_core::error::DomainError;
use switchyard_core::message::{MessageId, SerializedMessage};
use switchyard_core::queue::{MessageQueue, MessageStore};

#[derive(Debug, Default)]
struct Channel {
    pending: VecDeque<SerializedMessage>,
    in_flight: HashMap<MessageId, SerializedMessage>,
}

/// FIFO queue per channel. Dequeued messages stay in flight until
/// acknowledged.
#[derive(Debug, Default)]
pub struct InMemoryMessageQueue {
    channels: Mutex<HashMap<String, Channel>>,
}

impl InMemoryMessageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting on `channel`.
    #[must_use]
    pub fn pending_len(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map_or(0, |state| state.pending.len())
    }

    /// Messages dequeued from `channel` but not yet acknowledged.
    #[must_use]
    pub fn in_flight_len(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map_or(0, |state| state.in_flight.len())
    }
}

impl MessageQueue for InMemoryMessageQueue {
    fn enqueue(&self, channel: &str, message: SerializedMessage) -> Result<(), DomainError> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel.to_owned())
            .or_default()
            .pending
            .push_back(message);
        Ok(())
    }

    fn dequeue(&self, channel: &str) -> Result<Option<SerializedMessage>, DomainError> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(state) = channels.get_mut(channel) else {
            return Ok(None);
        };
        let message = state.pending.pop_front();
        if let Some(message) = &message {
            state.in_flight.insert(message.id(), message.clone());
        }
        Ok(message)
    }

    fn acknowledge(&self, channel: &str, message: &SerializedMessage) -> Result<(), DomainError> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(channel)
            .and_then(|state| state.in_flight.remove(&message.id()))
            .map(|_| ())
            .ok_or_else(|| {
                DomainError::Infrastructure(format!(
                    "message {} is not in flight on {channel}",
                    message.id()
                ))
            })
    }
}

/// Message store ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<BTreeMap<MessageId, SerializedMessage>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for InMemoryMessageStore {
    fn add(&self, message: SerializedMessage) -> Result<(), DomainError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message.id(), message);
        Ok(())
    }

    fn get(&self, id: MessageId) -> Result<Option<SerializedMessage>, DomainError> {
        Ok(self
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<SerializedMessage>, DomainError> {
        Ok(self
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    fn remove(&self, id: MessageId) -> Result<(), DomainError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::message::CommandMessage;
    use switchyard_test_support::RegisterUserCommand;

    use super::*;

    fn serialized() -> SerializedMessage {
        CommandMessage::create(RegisterUserCommand::jsmith())
            .serialize()
            .unwrap()
    }

    #[test]
    fn test_queue_is_fifo_per_channel() {
        // Arrange
        let queue = InMemoryMessageQueue::new();
        let (first, second, other) = (serialized(), serialized(), serialized());
        queue.enqueue("commands", first.clone()).unwrap();
        queue.enqueue("audit", other.clone()).unwrap();
        queue.enqueue("commands", second.clone()).unwrap();

        // Act
        let dequeued = [
            queue.dequeue("commands").unwrap(),
            queue.dequeue("commands").unwrap(),
            queue.dequeue("commands").unwrap(),
        ];

        // Assert
        assert_eq!(dequeued, [Some(first), Some(second), None]);
        assert_eq!(queue.pending_len("audit"), 1);
        assert_eq!(queue.in_flight_len("commands"), 2);
    }

    #[test]
    fn test_acknowledge_clears_in_flight() {
        let queue = InMemoryMessageQueue::new();
        queue.enqueue("commands", serialized()).unwrap();
        let message = queue.dequeue("commands").unwrap().unwrap();

        queue.acknowledge("commands", &message).unwrap();

        assert_eq!(queue.in_flight_len("commands"), 0);
        assert!(matches!(
            queue.acknowledge("commands", &message),
            Err(DomainError::Infrastructure(_))
        ));
    }

    #[test]
    fn test_dequeue_unknown_channel_is_empty() {
        let queue = InMemoryMessageQueue::new();

        assert_eq!(queue.dequeue("nowhere").unwrap(), None);
        assert_eq!(queue.pending_len("nowhere"), 0);
    }

    #[test]
    fn test_store_keeps_messages_by_id() {
        // Arrange
        let store = InMemoryMessageStore::new();
        let (first, second) = (serialized(), serialized());

        // Act
        store.add(second.clone()).unwrap();
        store.add(first.clone()).unwrap();
        store.remove(second.id()).unwrap();

        // Assert
        assert_eq!(store.get(first.id()).unwrap(), Some(first.clone()));
        assert_eq!(store.get(second.id()).unwrap(), None);
        assert_eq!(store.get_all().unwrap(), vec![first]);
        store.remove(second.id()).unwrap();
    }
}
