//! In-process event dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use switchyard_core::error::DomainError;
use switchyard_core::message::EventMessage;
use tracing::{debug, trace};

use super::{EventDispatcher, EventHandler, EventKey, SubscribedHandler, SubscriberId};

#[derive(Clone)]
struct HandlerEntry {
    handler: Arc<dyn EventHandler>,
    priority: i32,
    owner: Option<SubscriberId>,
}

/// Dispatcher holding handler instances in per-key priority lists.
///
/// Every list is an immutable snapshot replaced on change, so a dispatch in
/// progress keeps running the handlers it started with even if one of them
/// registers or unregisters handlers.
#[derive(Default)]
pub struct SimpleEventDispatcher {
    handlers: RwLock<HashMap<EventKey, Arc<[HandlerEntry]>>>,
}

impl SimpleEventDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, key: &EventKey) -> Option<Arc<[HandlerEntry]>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn update(&self, key: &EventKey, change: impl FnOnce(&mut Vec<HandlerEntry>)) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let mut list = handlers.get(key).map(|list| list.to_vec()).unwrap_or_default();
        change(&mut list);
        if list.is_empty() {
            handlers.remove(key);
        } else {
            handlers.insert(key.clone(), Arc::from(list));
        }
    }

    fn insert(&self, key: EventKey, entry: HandlerEntry) {
        self.update(&key, |list| {
            let position = list
                .iter()
                .position(|existing| existing.priority < entry.priority)
                .unwrap_or(list.len());
            list.insert(position, entry);
        });
    }

    fn run(&self, key: &EventKey, message: &EventMessage) -> Result<usize, DomainError> {
        let Some(list) = self.snapshot(key) else {
            return Ok(0);
        };
        for entry in list.iter() {
            trace!(
                message_id = %message.id(),
                key = %key,
                priority = entry.priority,
                "invoking event handler"
            );
            entry.handler.handle(message)?;
        }
        Ok(list.len())
    }
}

impl EventDispatcher for SimpleEventDispatcher {
    fn dispatch(&self, message: &EventMessage) -> Result<(), DomainError> {
        let typed = self.run(&EventKey::Type(message.payload_type()), message)?;
        let any = self.run(&EventKey::AllEvents, message)?;
        debug!(
            message_id = %message.id(),
            payload_type = %message.payload_type(),
            handlers = typed + any,
            "dispatched event"
        );
        Ok(())
    }

    fn add_handler(&self, key: EventKey, handler: Arc<dyn EventHandler>, priority: i32) {
        self.insert(
            key,
            HandlerEntry {
                handler,
                priority,
                owner: None,
            },
        );
    }

    fn remove_handler(&self, key: &EventKey, handler: &Arc<dyn EventHandler>) {
        self.update(key, |list| {
            list.retain(|entry| !Arc::ptr_eq(&entry.handler, handler));
        });
    }

    fn add_subscriber_handlers(&self, owner: SubscriberId, handlers: Vec<SubscribedHandler>) {
        for subscribed in handlers {
            self.insert(
                subscribed.key,
                HandlerEntry {
                    handler: subscribed.handler,
                    priority: subscribed.priority,
                    owner: Some(owner.clone()),
                },
            );
        }
    }

    fn remove_subscriber_handlers(&self, owner: &SubscriberId) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.retain(|_, list| {
            if list.iter().any(|entry| entry.owner.as_ref() == Some(owner)) {
                let kept: Vec<HandlerEntry> = list
                    .iter()
                    .filter(|entry| entry.owner.as_ref() != Some(owner))
                    .cloned()
                    .collect();
                *list = Arc::from(kept);
            }
            !list.is_empty()
        });
    }

    fn handlers(&self, key: &EventKey) -> Vec<Arc<dyn EventHandler>> {
        self.snapshot(key)
            .map(|list| list.iter().map(|entry| Arc::clone(&entry.handler)).collect())
            .unwrap_or_default()
    }

    fn all_handlers(&self) -> Vec<(EventKey, Vec<Arc<dyn EventHandler>>)> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, list)| {
                let handlers = list.iter().map(|entry| Arc::clone(&entry.handler)).collect();
                (key.clone(), handlers)
            })
            .collect()
    }

    fn has_handlers(&self, key: &EventKey) -> bool {
        self.snapshot(key).is_some()
    }
}
