//! Event subscribers for the accounts context.

use std::sync::{Mutex, PoisonError};

use switchyard_bus::event::{EventSubscriber, Subscription};
use switchyard_core::error::DomainError;
use switchyard_core::message::EventMessage;
use switchyard_core::payload::PayloadType;
use tracing::info;

use crate::domain::events::{EmailChanged, UserRegistered};

fn payload<'a, E: PayloadType>(message: &'a EventMessage) -> Result<&'a E, DomainError> {
    message.payload_as::<E>().ok_or_else(|| {
        DomainError::InvalidPayloadType(format!(
            "expected {}, got {}",
            E::TYPE_NAME,
            message.payload_type()
        ))
    })
}

/// Sends a welcome note to new users and a confirmation when their email
/// changes. Notes are kept in an outbox instead of being mailed.
#[derive(Debug, Default)]
pub struct WelcomeNotifier {
    outbox: Mutex<Vec<String>>,
}

impl WelcomeNotifier {
    /// Creates a notifier with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn send(&self, note: String) {
        info!(note = %note, "notification queued");
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(note);
    }

    fn welcome(&self, message: &EventMessage) -> Result<(), DomainError> {
        let event = payload::<UserRegistered>(message)?;
        self.send(format!("welcome {} <{}>", event.first_name, event.email));
        Ok(())
    }

    fn confirm_email_change(&self, message: &EventMessage) -> Result<(), DomainError> {
        let event = payload::<EmailChanged>(message)?;
        self.send(format!(
            "email changed from {} to {}",
            event.previous_email, event.email
        ));
        Ok(())
    }
}

impl EventSubscriber for WelcomeNotifier {
    fn subscriptions() -> Vec<Subscription<Self>> {
        vec![
            Subscription::on::<UserRegistered>(Self::welcome),
            Subscription::on::<EmailChanged>(Self::confirm_email_change),
        ]
    }
}
