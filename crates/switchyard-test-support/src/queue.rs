//! Test queues — mock `MessageQueue` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use switchyard_core::error::DomainError;
use switchyard_core::message::SerializedMessage;
use switchyard_core::queue::MessageQueue;

/// A queue that records every call. `dequeue` hands enqueued messages back
/// in FIFO order regardless of channel.
#[derive(Debug, Default)]
pub struct RecordingMessageQueue {
    enqueued: Mutex<Vec<(String, SerializedMessage)>>,
    pending: Mutex<VecDeque<SerializedMessage>>,
    acknowledged: Mutex<Vec<(String, SerializedMessage)>>,
}

impl RecordingMessageQueue {
    /// Creates an empty recording queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every `(channel, message)` enqueued.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn enqueued(&self) -> Vec<(String, SerializedMessage)> {
        self.enqueued.lock().unwrap().clone()
    }

    /// Returns a snapshot of every `(channel, message)` acknowledged.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn acknowledged(&self) -> Vec<(String, SerializedMessage)> {
        self.acknowledged.lock().unwrap().clone()
    }
}

impl MessageQueue for RecordingMessageQueue {
    fn enqueue(&self, channel: &str, message: SerializedMessage) -> Result<(), DomainError> {
        self.enqueued
            .lock()
            .unwrap()
            .push((channel.to_owned(), message.clone()));
        self.pending.lock().unwrap().push_back(message);
        Ok(())
    }

    fn dequeue(&self, _channel: &str) -> Result<Option<SerializedMessage>, DomainError> {
        Ok(self.pending.lock().unwrap().pop_front())
    }

    fn acknowledge(&self, channel: &str, message: &SerializedMessage) -> Result<(), DomainError> {
        self.acknowledged
            .lock()
            .unwrap()
            .push((channel.to_owned(), message.clone()));
        Ok(())
    }
}

/// A queue that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingMessageQueue;

impl MessageQueue for FailingMessageQueue {
    fn enqueue(&self, _channel: &str, _message: SerializedMessage) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    fn dequeue(&self, _channel: &str) -> Result<Option<SerializedMessage>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    fn acknowledge(&self, _channel: &str, _message: &SerializedMessage) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
