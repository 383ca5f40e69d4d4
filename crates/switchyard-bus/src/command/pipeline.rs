//! Command filter pipeline.
//!
//! Filters wrap the inner bus like layers of an onion: the first filter
//! added runs its pre-processing first and its post-processing last. A
//! filter may replace the message before passing it on, or return without
//! calling `next` to stop the command.

use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::CommandMessage;
use tracing::trace;

use super::bus::CommandBus;
use crate::pipeline::FilterChain;

/// One layer of a [`CommandPipeline`].
pub trait CommandFilter: Send + Sync {
    /// Processes `message`, calling `next` to continue down the pipeline.
    ///
    /// # Errors
    ///
    /// Returns its own error or the one produced further down.
    fn process(&self, message: CommandMessage, next: CommandNext<'_>) -> Result<(), DomainError>;
}

/// The remainder of the pipeline below the current filter.
pub struct CommandNext<'a> {
    filters: &'a [Arc<dyn CommandFilter>],
    bus: &'a dyn CommandBus,
}

impl CommandNext<'_> {
    /// Runs the next filter, or the inner bus once no filters remain.
    ///
    /// # Errors
    ///
    /// Returns whatever the remaining filters or the bus return.
    pub fn call(self, message: CommandMessage) -> Result<(), DomainError> {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.process(
                message,
                CommandNext {
                    filters: rest,
                    bus: self.bus,
                },
            ),
            None => self.bus.dispatch(message),
        }
    }
}

struct FnFilter<F>(F);

impl<F> CommandFilter for FnFilter<F>
where
    F: Fn(CommandMessage, CommandNext<'_>) -> Result<(), DomainError> + Send + Sync,
{
    fn process(&self, message: CommandMessage, next: CommandNext<'_>) -> Result<(), DomainError> {
        (self.0)(message, next)
    }
}

/// Wraps a closure as a command filter.
pub fn filter_fn<F>(f: F) -> Arc<dyn CommandFilter>
where
    F: Fn(CommandMessage, CommandNext<'_>) -> Result<(), DomainError> + Send + Sync + 'static,
{
    Arc::new(FnFilter(f))
}

/// A command bus wrapped in an ordered list of filters.
///
/// Each dispatch works on a snapshot of the filter list, so filters added
/// while a command is in flight apply from the next dispatch on.
pub struct CommandPipeline {
    bus: Arc<dyn CommandBus>,
    filters: FilterChain<dyn CommandFilter>,
}

impl CommandPipeline {
    /// Wraps `bus` with an empty filter list.
    #[must_use]
    pub fn new(bus: Arc<dyn CommandBus>) -> Self {
        Self {
            bus,
            filters: FilterChain::new(),
        }
    }

    /// Appends `filter` as the innermost layer so far.
    pub fn add_filter(&self, filter: Arc<dyn CommandFilter>) {
        self.filters.push(filter);
    }

    /// Number of filters.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }
}

impl CommandBus for CommandPipeline {
    fn dispatch(&self, message: CommandMessage) -> Result<(), DomainError> {
        let filters = self.filters.snapshot();
        trace!(
            message_id = %message.id(),
            filters = filters.len(),
            "entering command pipeline"
        );
        CommandNext {
            filters: &filters,
            bus: self.bus.as_ref(),
        }
        .call(message)
    }
}
