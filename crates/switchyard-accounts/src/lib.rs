//! Switchyard Accounts — user accounts bounded context.
//!
//! Registers users and changes their email through the command bus, keeps
//! each account as an event-sourced aggregate, and answers profile queries
//! through the query bus.

pub mod application;
pub mod domain;
pub mod wiring;
