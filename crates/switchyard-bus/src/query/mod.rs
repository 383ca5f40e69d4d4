//! Query side: handlers, routers, buses and the filter pipeline.
//!
//! Queries mirror commands except that the handler returns a value. Results
//! travel type-erased as [`QueryResult`]; [`QueryBus::fetch_as`] recovers
//! the concrete type.

mod bus;
mod handler;
mod pipeline;
mod router;

pub use bus::{QueryBus, RoutingQueryBus, SynchronousQueryBus};
pub use handler::{QueryHandler, QueryResult, handler_fn, handler_for};
pub use pipeline::{QueryFilter, QueryNext, QueryPipeline, filter_fn};
pub use router::{InMemoryQueryRouter, QueryRouter, ServiceAwareQueryRouter};
