//! Command side: handlers, routers, buses and the filter pipeline.
//!
//! A command has exactly one handler. Routers find it, buses invoke it (or
//! hand the message to a queue), and a [`CommandPipeline`] wraps any bus
//! with an ordered onion of [`CommandFilter`]s.

mod bus;
mod handler;
mod pipeline;
mod router;

pub use bus::{CommandBus, QueueingCommandBus, RoutingCommandBus, SynchronousCommandBus};
pub use handler::{CommandHandler, handler_fn, handler_for};
pub use pipeline::{CommandFilter, CommandNext, CommandPipeline, filter_fn};
pub use router::{CommandRouter, InMemoryCommandRouter, ServiceAwareCommandRouter};
