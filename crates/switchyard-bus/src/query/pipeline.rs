//! Query filter pipeline, the query-side twin of the command pipeline.

use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::QueryMessage;
use tracing::trace;

use super::bus::QueryBus;
use super::handler::QueryResult;
use crate::pipeline::FilterChain;

/// One layer of a [`QueryPipeline`].
pub trait QueryFilter: Send + Sync {
    /// Processes `message`, calling `next` to continue down the pipeline.
    ///
    /// # Errors
    ///
    /// Returns its own error or the one produced further down.
    fn process(&self, message: QueryMessage, next: QueryNext<'_>) -> Result<QueryResult, DomainError>;
}

/// The remainder of the pipeline below the current filter.
pub struct QueryNext<'a> {
    filters: &'a [Arc<dyn QueryFilter>],
    bus: &'a dyn QueryBus,
}

impl QueryNext<'_> {
    /// Runs the next filter, or the inner bus once no filters remain.
    ///
    /// # Errors
    ///
    /// Returns whatever the remaining filters or the bus return.
    pub fn call(self, message: QueryMessage) -> Result<QueryResult, DomainError> {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.process(
                message,
                QueryNext {
                    filters: rest,
                    bus: self.bus,
                },
            ),
            None => self.bus.fetch(message),
        }
    }
}

struct FnFilter<F>(F);

impl<F> QueryFilter for FnFilter<F>
where
    F: Fn(QueryMessage, QueryNext<'_>) -> Result<QueryResult, DomainError> + Send + Sync,
{
    fn process(&self, message: QueryMessage, next: QueryNext<'_>) -> Result<QueryResult, DomainError> {
        (self.0)(message, next)
    }
}

/// Wraps a closure as a query filter.
pub fn filter_fn<F>(f: F) -> Arc<dyn QueryFilter>
where
    F: Fn(QueryMessage, QueryNext<'_>) -> Result<QueryResult, DomainError> + Send + Sync + 'static,
{
    Arc::new(FnFilter(f))
}

/// A query bus wrapped in an ordered list of filters.
pub struct QueryPipeline {
    bus: Arc<dyn QueryBus>,
    filters: FilterChain<dyn QueryFilter>,
}

impl QueryPipeline {
    /// Wraps `bus` with an empty filter list.
    #[must_use]
    pub fn new(bus: Arc<dyn QueryBus>) -> Self {
        Self {
            bus,
            filters: FilterChain::new(),
        }
    }

    /// Appends `filter` as the innermost layer so far.
    pub fn add_filter(&self, filter: Arc<dyn QueryFilter>) {
        self.filters.push(filter);
    }

    /// Number of filters.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }
}

impl QueryBus for QueryPipeline {
    fn fetch(&self, message: QueryMessage) -> Result<QueryResult, DomainError> {
        let filters = self.filters.snapshot();
        trace!(
            message_id = %message.id(),
            filters = filters.len(),
            "entering query pipeline"
        );
        QueryNext {
            filters: &filters,
            bus: self.bus.as_ref(),
        }
        .call(message)
    }
}

#[cfg(test)]
mod tests {
    use switchyard_test_support::{GetUserQuery, TraceLog};

    use super::*;
    use crate::query::{SynchronousQueryBus, handler_for};

    #[test]
    fn test_filters_wrap_query_bus_like_an_onion() {
        // Arrange
        let log = TraceLog::new();
        let handler_log = log.clone();
        let mut bus = SynchronousQueryBus::default();
        bus.register_handler::<GetUserQuery>(handler_for(move |query: &GetUserQuery, _| {
            handler_log.push("handler");
            Ok(query.email.len())
        }));
        let pipeline = QueryPipeline::new(Arc::new(bus));
        for name in ["outer", "inner"] {
            let log = log.clone();
            pipeline.add_filter(filter_fn(move |message, next| {
                log.push(format!("{name} before"));
                let result = next.call(message);
                log.push(format!("{name} after"));
                result
            }));
        }

        // Act
        let length: usize = pipeline
            .fetch_as(GetUserQuery {
                email: "jsmith@example.com".to_owned(),
            })
            .unwrap();

        // Assert
        assert_eq!(length, 18);
        assert_eq!(
            log.entries(),
            vec!["outer before", "inner before", "handler", "inner after", "outer after"]
        );
    }

    #[test]
    fn test_filter_can_answer_from_cache() {
        // Arrange
        let pipeline = QueryPipeline::new(Arc::new(SynchronousQueryBus::default()));
        pipeline.add_filter(filter_fn(|_, _| {
            let cached: QueryResult = Box::new(7_usize);
            Ok(cached)
        }));

        // Act
        let value: usize = pipeline
            .fetch_as(GetUserQuery {
                email: "jsmith@example.com".to_owned(),
            })
            .unwrap();

        // Assert
        assert_eq!(value, 7);
        assert_eq!(pipeline.filter_count(), 1);
    }
}
