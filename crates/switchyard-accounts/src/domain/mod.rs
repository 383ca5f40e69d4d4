//! Domain layer for the accounts context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod queries;
