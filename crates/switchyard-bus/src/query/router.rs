//! Query routers: find the single handler for a query.

use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::payload::{PayloadType, Query};

use super::handler::QueryHandler;
use crate::router::{InMemoryRouter, ServiceAwareRouter};
use crate::service::{ServiceBinding, ServiceContainer};

/// Resolves the handler responsible for a query.
pub trait QueryRouter: Send + Sync {
    /// Returns the handler for `query`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if no handler is registered for
    /// the query's type, or `DomainError::ServiceNotFound` if a lazily
    /// resolved handler cannot be built.
    fn route(&self, query: &dyn Query) -> Result<Arc<dyn QueryHandler>, DomainError>;
}

/// Router holding query handler instances directly.
pub type InMemoryQueryRouter = InMemoryRouter<dyn QueryHandler>;

/// Router that builds query handlers from a [`ServiceContainer`] on demand.
pub type ServiceAwareQueryRouter = ServiceAwareRouter<dyn QueryHandler>;

impl InMemoryRouter<dyn QueryHandler> {
    /// Registers `handler` for queries of type `Q`, replacing any previous
    /// registration.
    pub fn register_handler<Q>(&mut self, handler: Arc<dyn QueryHandler>) -> &mut Self
    where
        Q: Query + PayloadType,
    {
        self.insert(Q::type_tag(), handler);
        self
    }
}

impl QueryRouter for InMemoryRouter<dyn QueryHandler> {
    fn route(&self, query: &dyn Query) -> Result<Arc<dyn QueryHandler>, DomainError> {
        self.get_handler(&query.payload_type())
    }
}

fn resolve_handler<H>(
    container: &ServiceContainer,
    service_id: &str,
) -> Result<Arc<dyn QueryHandler>, DomainError>
where
    H: QueryHandler + 'static,
{
    let handler: Arc<dyn QueryHandler> = container.get::<H>(service_id)?;
    Ok(handler)
}

impl ServiceAwareRouter<dyn QueryHandler> {
    /// Routes queries of type `Q` to the service `service_id`.
    pub fn register_handler<Q, H>(&mut self, service_id: impl Into<String>) -> &mut Self
    where
        Q: Query + PayloadType,
        H: QueryHandler + 'static,
    {
        self.bind(
            Q::type_tag(),
            ServiceBinding::new(service_id, resolve_handler::<H>),
        );
        self
    }
}

impl QueryRouter for ServiceAwareRouter<dyn QueryHandler> {
    fn route(&self, query: &dyn Query) -> Result<Arc<dyn QueryHandler>, DomainError> {
        self.get_handler(&query.payload_type())
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::message::QueryMessage;
    use switchyard_test_support::{GetUserQuery, RegisterUserCommand, TraceLog};

    use super::*;
    use crate::query::QueryResult;

    struct Lookup {
        name: &'static str,
        log: TraceLog,
    }

    impl QueryHandler for Lookup {
        fn handle(&self, message: &QueryMessage) -> Result<QueryResult, DomainError> {
            self.log.push(format!("{}:{}", self.name, message.payload_type()));
            Ok(Box::new(self.name))
        }
    }

    fn get_user() -> GetUserQuery {
        GetUserQuery {
            email: "jsmith@example.com".to_owned(),
        }
    }

    #[test]
    fn test_in_memory_router_routes_by_payload_type() {
        // Arrange
        let log = TraceLog::new();
        let mut router = InMemoryQueryRouter::new();
        router.register_handler::<GetUserQuery>(Arc::new(Lookup {
            name: "users",
            log: log.clone(),
        }));
        let message = QueryMessage::create(get_user());

        // Act
        let result = router.route(message.payload()).unwrap().handle(&message).unwrap();

        // Assert
        assert_eq!(result.downcast_ref::<&str>(), Some(&"users"));
        assert_eq!(log.entries(), vec!["users:Tests.User.GetUserQuery"]);
        assert!(router.has_handler(&GetUserQuery::type_tag()));
        assert_eq!(router.handled_types(), vec![GetUserQuery::type_tag()]);
    }

    #[test]
    fn test_in_memory_router_unknown_type_is_handler_not_found() {
        let router = InMemoryQueryRouter::new();

        let result = router.route(&get_user());

        assert!(matches!(result, Err(DomainError::HandlerNotFound(tag)) if tag == GetUserQuery::type_tag()));
        assert!(!router.has_handler(&GetUserQuery::type_tag()));
    }

    #[test]
    fn test_in_memory_router_second_registration_wins() {
        // Arrange
        let log = TraceLog::new();
        let mut router = InMemoryQueryRouter::new();
        router
            .register_handler::<GetUserQuery>(Arc::new(Lookup {
                name: "first",
                log: log.clone(),
            }))
            .register_handler::<GetUserQuery>(Arc::new(Lookup {
                name: "second",
                log: log.clone(),
            }));
        let message = QueryMessage::create(get_user());

        // Act
        router.route(message.payload()).unwrap().handle(&message).unwrap();

        // Assert
        assert_eq!(log.entries(), vec!["second:Tests.User.GetUserQuery"]);
    }

    #[test]
    fn test_service_aware_router_resolves_at_route_time() {
        // Arrange
        let log = TraceLog::new();
        let container = Arc::new(ServiceContainer::new());
        let mut router = ServiceAwareQueryRouter::new(Arc::clone(&container));
        router.register_handler::<GetUserQuery, Lookup>("handler.users");
        assert!(!router.has_handler(&GetUserQuery::type_tag()));

        // Act
        let factory_log = log.clone();
        container.set("handler.users", move || {
            Arc::new(Lookup {
                name: "lazy",
                log: factory_log.clone(),
            })
        });
        let message = QueryMessage::create(get_user());
        router.route(message.payload()).unwrap().handle(&message).unwrap();

        // Assert
        assert!(router.has_handler(&GetUserQuery::type_tag()));
        assert!(router.validate().is_ok());
        assert_eq!(log.entries(), vec!["lazy:Tests.User.GetUserQuery"]);
    }

    #[test]
    fn test_service_aware_router_missing_service() {
        let mut router = ServiceAwareQueryRouter::new(Arc::new(ServiceContainer::new()));
        router.register_handler::<GetUserQuery, Lookup>("handler.users");

        let routed = router.route(&get_user());
        let validated = router.validate();

        assert!(matches!(routed, Err(DomainError::ServiceNotFound(id)) if id == "handler.users"));
        assert!(!router.has_handler(&GetUserQuery::type_tag()));
        assert_eq!(
            validated.unwrap_err().to_string(),
            "service not found: Tests.User.GetUserQuery -> handler.users"
        );
    }

    #[test]
    fn test_service_aware_router_service_of_another_type() {
        let container = Arc::new(ServiceContainer::new());
        container.set_instance("handler.users", Arc::new(RegisterUserCommand::jsmith()));
        let mut router = ServiceAwareQueryRouter::new(Arc::clone(&container));
        router.register_handler::<GetUserQuery, Lookup>("handler.users");

        let result = router.route(&get_user());

        assert!(matches!(result, Err(DomainError::ServiceNotFound(msg)) if msg.starts_with("handler.users is not a")));
    }

    #[test]
    fn test_service_aware_router_unbound_type_is_handler_not_found() {
        let router = ServiceAwareQueryRouter::new(Arc::new(ServiceContainer::new()));

        let result = router.route(&get_user());

        assert!(matches!(result, Err(DomainError::HandlerNotFound(_))));
        assert!(router.validate().is_ok());
    }
}
