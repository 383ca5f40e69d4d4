//! Switchyard Core — message envelopes and shared abstractions.
//!
//! This crate defines the payload contracts, the command/event/query
//! envelopes and the queue collaborator traits that the bus, event-sourcing
//! and queue crates build on. It contains no dispatch logic.

pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod payload;
pub mod queue;
pub mod type_tag;
