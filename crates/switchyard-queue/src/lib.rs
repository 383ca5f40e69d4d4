//! Switchyard Queue — adapters for the queue and store contracts.
//!
//! The in-memory queue and store back tests and single-process setups. The
//! recycling queue adds redelivery of unacknowledged messages on top of any
//! queue. Consumers turn serialized messages back into envelopes for a bus
//! or dispatcher, and the worker polls a channel and feeds a consumer.

pub mod consumer;
pub mod memory;
pub mod recycling;
pub mod worker;
