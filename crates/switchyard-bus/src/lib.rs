//! Switchyard Bus — routing and dispatch for commands, queries and events.
//!
//! Commands go to exactly one handler through a router, optionally wrapped
//! in a filter pipeline. Queries do the same and return a value. Events fan
//! out to every registered handler in priority order.

pub mod command;
pub mod event;
pub mod handler_map;
pub mod pipeline;
pub mod query;
pub mod router;
pub mod service;
