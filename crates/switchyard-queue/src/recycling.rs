//! Queue wrapper that can redeliver unacknowledged messages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use switchyard_core::error::DomainError;
use switchyard_core::message::SerializedMessage;
use switchyard_core::queue::{MessageQueue, MessageStore};
use tracing::info;

use crate::memory::InMemoryMessageStore;

type StoreFactory = Box<dyn Fn(&str) -> Arc<dyn MessageStore> + Send + Sync>;

/// Wraps a queue and remembers every dequeued message in a per-channel
/// store until it is acknowledged. [`RecyclingMessageQueue::recycle`] puts
/// the remembered messages back on their channel, for example after a
/// consumer crashed mid-batch.
pub struct RecyclingMessageQueue {
    queue: Arc<dyn MessageQueue>,
    stores: Mutex<HashMap<String, Arc<dyn MessageStore>>>,
    store_factory: StoreFactory,
}

impl RecyclingMessageQueue {
    /// Wraps `queue`, creating each channel's store with `store_factory`.
    #[must_use]
    pub fn new<F>(queue: Arc<dyn MessageQueue>, store_factory: F) -> Self
    where
        F: Fn(&str) -> Arc<dyn MessageStore> + Send + Sync + 'static,
    {
        Self {
            queue,
            stores: Mutex::new(HashMap::new()),
            store_factory: Box::new(store_factory),
        }
    }

    /// Wraps `queue` with in-memory stores.
    #[must_use]
    pub fn in_memory(queue: Arc<dyn MessageQueue>) -> Self {
        Self::new(queue, |_| Arc::new(InMemoryMessageStore::new()))
    }

    fn store(&self, channel: &str) -> Arc<dyn MessageStore> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            stores
                .entry(channel.to_owned())
                .or_insert_with(|| (self.store_factory)(channel)),
        )
    }

    /// Messages dequeued from `channel` and not yet acknowledged.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub fn unacknowledged(&self, channel: &str) -> Result<Vec<SerializedMessage>, DomainError> {
        self.store(channel).get_all()
    }

    /// Re-enqueues every unacknowledged message of `channel` and returns how
    /// many were recycled.
    ///
    /// # Errors
    ///
    /// Returns the first store or queue error. A message leaves the store
    /// only after it is back on the queue, so a failed enqueue keeps it
    /// unacknowledged.
    pub fn recycle(&self, channel: &str) -> Result<usize, DomainError> {
        let store = self.store(channel);
        let messages = store.get_all()?;
        for message in &messages {
            self.queue.enqueue(channel, message.clone())?;
            store.remove(message.id())?;
        }
        if !messages.is_empty() {
            info!(channel, recycled = messages.len(), "recycled unacknowledged messages");
        }
        Ok(messages.len())
    }
}

impl MessageQueue for RecyclingMessageQueue {
    fn enqueue(&self, channel: &str, message: SerializedMessage) -> Result<(), DomainError> {
        self.queue.enqueue(channel, message)
    }

    fn dequeue(&self, channel: &str) -> Result<Option<SerializedMessage>, DomainError> {
        let message = self.queue.dequeue(channel)?;
        if let Some(message) = &message {
            self.store(channel).add(message.clone())?;
        }
        Ok(message)
    }

    fn acknowledge(&self, channel: &str, message: &SerializedMessage) -> Result<(), DomainError> {
        self.queue.acknowledge(channel, message)?;
        self.store(channel).remove(message.id())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use switchyard_core::message::CommandMessage;
    use switchyard_test_support::RegisterUserCommand;

    use super::*;
    use crate::memory::InMemoryMessageQueue;

    fn serialized() -> SerializedMessage {
        CommandMessage::create(RegisterUserCommand::jsmith())
            .serialize()
            .unwrap()
    }

    #[test]
    fn test_unacknowledged_messages_are_recycled() {
        // Arrange
        let inner = Arc::new(InMemoryMessageQueue::new());
        let queue = RecyclingMessageQueue::in_memory(inner.clone());
        let (acked, lost) = (serialized(), serialized());
        queue.enqueue("commands", acked.clone()).unwrap();
        queue.enqueue("commands", lost.clone()).unwrap();
        let first = queue.dequeue("commands").unwrap().unwrap();
        queue.acknowledge("commands", &first).unwrap();
        queue.dequeue("commands").unwrap().unwrap();

        // Act
        let recycled = queue.recycle("commands").unwrap();

        // Assert
        assert_eq!(recycled, 1);
        assert!(queue.unacknowledged("commands").unwrap().is_empty());
        assert_eq!(inner.pending_len("commands"), 1);
        assert_eq!(queue.dequeue("commands").unwrap(), Some(lost));
    }

    #[derive(Default)]
    struct FailingEnqueue {
        inner: InMemoryMessageQueue,
        broken: AtomicBool,
    }

    impl MessageQueue for FailingEnqueue {
        fn enqueue(&self, channel: &str, message: SerializedMessage) -> Result<(), DomainError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(DomainError::Infrastructure("queue unavailable".to_owned()));
            }
            self.inner.enqueue(channel, message)
        }

        fn dequeue(&self, channel: &str) -> Result<Option<SerializedMessage>, DomainError> {
            self.inner.dequeue(channel)
        }

        fn acknowledge(&self, channel: &str, message: &SerializedMessage) -> Result<(), DomainError> {
            self.inner.acknowledge(channel, message)
        }
    }

    #[test]
    fn test_failed_enqueue_keeps_message_unacknowledged() {
        // Arrange
        let inner = Arc::new(FailingEnqueue::default());
        let queue = RecyclingMessageQueue::in_memory(inner.clone());
        let message = serialized();
        queue.enqueue("commands", message.clone()).unwrap();
        queue.dequeue("commands").unwrap().unwrap();
        inner.broken.store(true, Ordering::SeqCst);

        // Act
        let result = queue.recycle("commands");

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert_eq!(queue.unacknowledged("commands").unwrap(), vec![message.clone()]);
        inner.broken.store(false, Ordering::SeqCst);
        assert_eq!(queue.recycle("commands").unwrap(), 1);
        assert_eq!(queue.dequeue("commands").unwrap(), Some(message));
    }

    #[test]
    fn test_recycle_with_nothing_outstanding() {
        let queue = RecyclingMessageQueue::in_memory(Arc::new(InMemoryMessageQueue::new()));

        assert_eq!(queue.recycle("commands").unwrap(), 0);
    }

    #[test]
    fn test_dequeued_message_is_remembered_until_acknowledged() {
        let queue = RecyclingMessageQueue::in_memory(Arc::new(InMemoryMessageQueue::new()));
        let message = serialized();
        queue.enqueue("events", message.clone()).unwrap();

        let dequeued = queue.dequeue("events").unwrap().unwrap();

        assert_eq!(queue.unacknowledged("events").unwrap(), vec![message]);
        queue.acknowledge("events", &dequeued).unwrap();
        assert!(queue.unacknowledged("events").unwrap().is_empty());
    }
}
