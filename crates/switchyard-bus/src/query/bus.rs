//! Query buses.

use std::any::{Any, type_name};
use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::QueryMessage;
use switchyard_core::payload::{IntoPayload, PayloadType, Query};
use tracing::debug;

use super::handler::{QueryHandler, QueryResult};
use super::router::{InMemoryQueryRouter, QueryRouter};

/// Delivers queries to their handler and returns the answer.
pub trait QueryBus: Send + Sync {
    /// Fetches the result of a query message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if nothing answers the query,
    /// or the handler's own error unchanged.
    fn fetch(&self, message: QueryMessage) -> Result<QueryResult, DomainError>;

    /// Wraps `query` in a fresh envelope and fetches its result.
    ///
    /// # Errors
    ///
    /// See [`QueryBus::fetch`].
    fn execute<Q>(&self, query: Q) -> Result<QueryResult, DomainError>
    where
        Q: IntoPayload<dyn Query>,
        Self: Sized,
    {
        self.fetch(QueryMessage::create(query))
    }

    /// Like [`QueryBus::execute`], downcasting the result to `R`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the handler answered with another
    /// type, otherwise see [`QueryBus::fetch`].
    fn fetch_as<R, Q>(&self, query: Q) -> Result<R, DomainError>
    where
        R: Any,
        Q: IntoPayload<dyn Query>,
        Self: Sized,
    {
        self.execute(query)?
            .downcast::<R>()
            .map(|result| *result)
            .map_err(|_| {
                DomainError::Validation(format!("query result is not a {}", type_name::<R>()))
            })
    }
}

impl<B: QueryBus + ?Sized> QueryBus for Arc<B> {
    fn fetch(&self, message: QueryMessage) -> Result<QueryResult, DomainError> {
        (**self).fetch(message)
    }
}

fn invoke(router: &dyn QueryRouter, message: &QueryMessage) -> Result<QueryResult, DomainError> {
    let handler = router.route(message.payload())?;
    debug!(
        message_id = %message.id(),
        payload_type = %message.payload_type(),
        "fetching query"
    );
    handler.handle(message)
}

/// Bus that owns an in-memory router and answers inline.
#[derive(Debug, Default)]
pub struct SynchronousQueryBus {
    router: InMemoryQueryRouter,
}

impl SynchronousQueryBus {
    /// Creates a bus over `router`.
    #[must_use]
    pub fn new(router: InMemoryQueryRouter) -> Self {
        Self { router }
    }

    /// Registers `handler` for queries of type `Q`.
    pub fn register_handler<Q>(&mut self, handler: Arc<dyn QueryHandler>) -> &mut Self
    where
        Q: Query + PayloadType,
    {
        self.router.register_handler::<Q>(handler);
        self
    }

    /// The underlying router.
    #[must_use]
    pub fn router(&self) -> &InMemoryQueryRouter {
        &self.router
    }
}

impl QueryBus for SynchronousQueryBus {
    fn fetch(&self, message: QueryMessage) -> Result<QueryResult, DomainError> {
        invoke(&self.router, &message)
    }
}

/// Bus that delegates handler lookup to any [`QueryRouter`].
pub struct RoutingQueryBus {
    router: Arc<dyn QueryRouter>,
}

impl RoutingQueryBus {
    /// Creates a bus over `router`.
    #[must_use]
    pub fn new(router: Arc<dyn QueryRouter>) -> Self {
        Self { router }
    }
}

impl QueryBus for RoutingQueryBus {
    fn fetch(&self, message: QueryMessage) -> Result<QueryResult, DomainError> {
        invoke(self.router.as_ref(), &message)
    }
}

#[cfg(test)]
mod tests {
    use switchyard_test_support::GetUserQuery;

    use super::*;
    use crate::query::{ServiceAwareQueryRouter, handler_fn, handler_for};
    use crate::service::ServiceContainer;

    #[derive(Debug, PartialEq)]
    struct UserView {
        email: String,
        display_name: String,
    }

    fn lookup_bus() -> SynchronousQueryBus {
        let mut bus = SynchronousQueryBus::default();
        bus.register_handler::<GetUserQuery>(handler_for(|query: &GetUserQuery, _| {
            Ok(UserView {
                email: query.email.clone(),
                display_name: "James D. Smith".to_owned(),
            })
        }));
        bus
    }

    #[test]
    fn test_fetch_as_returns_concrete_result() {
        // Arrange
        let bus = lookup_bus();

        // Act
        let view: UserView = bus
            .fetch_as(GetUserQuery {
                email: "jsmith@example.com".to_owned(),
            })
            .unwrap();

        // Assert
        assert_eq!(
            view,
            UserView {
                email: "jsmith@example.com".to_owned(),
                display_name: "James D. Smith".to_owned(),
            }
        );
    }

    #[test]
    fn test_fetch_as_wrong_type_is_validation_error() {
        let bus = lookup_bus();

        let result = bus.fetch_as::<String, _>(GetUserQuery {
            email: "jsmith@example.com".to_owned(),
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_fetch_without_handler_fails() {
        let bus = SynchronousQueryBus::default();

        let result = bus.execute(GetUserQuery {
            email: "jsmith@example.com".to_owned(),
        });

        assert!(matches!(result, Err(DomainError::HandlerNotFound(_))));
    }

    #[test]
    fn test_handler_error_propagates_unchanged() {
        let mut bus = SynchronousQueryBus::default();
        bus.register_handler::<GetUserQuery>(handler_fn(|_| {
            Err(DomainError::Validation("no such user".into()))
        }));

        let result = bus.execute(GetUserQuery {
            email: "nobody@example.com".to_owned(),
        });

        assert!(matches!(result, Err(DomainError::Validation(msg)) if msg == "no such user"));
    }

    struct CountingHandler;

    impl QueryHandler for CountingHandler {
        fn handle(&self, _message: &QueryMessage) -> Result<QueryResult, DomainError> {
            Ok(Box::new(42_usize))
        }
    }

    #[test]
    fn test_routing_bus_with_service_aware_router() {
        // Arrange
        let container = Arc::new(ServiceContainer::new());
        container.set_instance("query.count", Arc::new(CountingHandler));
        let mut router = ServiceAwareQueryRouter::new(Arc::clone(&container));
        router.register_handler::<GetUserQuery, CountingHandler>("query.count");
        router.validate().unwrap();
        let bus: Arc<dyn QueryBus> = Arc::new(RoutingQueryBus::new(Arc::new(router)));

        // Act
        let count: usize = bus
            .fetch_as(GetUserQuery {
                email: "jsmith@example.com".to_owned(),
            })
            .unwrap();

        // Assert
        assert_eq!(count, 42);
    }
}
