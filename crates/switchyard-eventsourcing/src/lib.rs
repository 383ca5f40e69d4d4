//! Switchyard Event Sourcing — records, streams and aggregate roots.
//!
//! Aggregates record events instead of mutating state directly. Each
//! recorded event is applied to the aggregate, wrapped in an
//! [`record::EventRecord`] with the next sequence number, and buffered in an
//! [`collection::EventCollection`] until the caller extracts it as an
//! [`stream::EventStream`]. Replaying a stream rebuilds the aggregate.

pub mod aggregate;
pub mod aggregate_id;
pub mod appliers;
pub mod collection;
pub mod record;
pub mod root_ref;
pub mod stream;
