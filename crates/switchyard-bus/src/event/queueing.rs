//! Event dispatcher that hands events to a queue.

use std::sync::Arc;

use switchyard_core::config::MessagingConfig;
use switchyard_core::error::DomainError;
use switchyard_core::message::EventMessage;
use switchyard_core::queue::MessageQueue;
use tracing::debug;

use super::{EventDispatcher, EventHandler, EventKey, SubscribedHandler, SubscriberId};

/// Dispatcher that serialises every event onto a queue channel. Fan-out
/// happens wherever the channel is consumed, so this dispatcher keeps no
/// handlers and ignores registration calls.
pub struct QueueingEventDispatcher {
    queue: Arc<dyn MessageQueue>,
    channel: String,
}

impl QueueingEventDispatcher {
    /// Creates a dispatcher writing to `channel` of `queue`.
    #[must_use]
    pub fn new(queue: Arc<dyn MessageQueue>, channel: impl Into<String>) -> Self {
        Self {
            queue,
            channel: channel.into(),
        }
    }

    /// Creates a dispatcher writing to the configured event channel.
    #[must_use]
    pub fn from_config(queue: Arc<dyn MessageQueue>, config: &MessagingConfig) -> Self {
        Self::new(queue, config.event_channel.clone())
    }

    /// The target channel.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl EventDispatcher for QueueingEventDispatcher {
    fn dispatch(&self, message: &EventMessage) -> Result<(), DomainError> {
        let serialized = message.serialize()?;
        debug!(
            message_id = %message.id(),
            payload_type = %message.payload_type(),
            channel = %self.channel,
            "enqueueing event"
        );
        self.queue.enqueue(&self.channel, serialized)
    }

    fn add_handler(&self, _key: EventKey, _handler: Arc<dyn EventHandler>, _priority: i32) {}

    fn remove_handler(&self, _key: &EventKey, _handler: &Arc<dyn EventHandler>) {}

    fn add_subscriber_handlers(&self, _owner: SubscriberId, _handlers: Vec<SubscribedHandler>) {}

    fn remove_subscriber_handlers(&self, _owner: &SubscriberId) {}

    fn handlers(&self, _key: &EventKey) -> Vec<Arc<dyn EventHandler>> {
        Vec::new()
    }

    fn all_handlers(&self) -> Vec<(EventKey, Vec<Arc<dyn EventHandler>>)> {
        Vec::new()
    }
}
