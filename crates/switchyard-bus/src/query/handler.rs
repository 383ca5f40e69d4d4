//! Query handler contract.

use std::any::Any;
use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::message::QueryMessage;
use switchyard_core::payload::{PayloadType, Query};

/// Type-erased query result.
pub type QueryResult = Box<dyn Any + Send>;

/// Answers one kind of query.
pub trait QueryHandler: Send + Sync {
    /// Answers `message`.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler fails with; buses propagate it unchanged.
    fn handle(&self, message: &QueryMessage) -> Result<QueryResult, DomainError>;
}

struct FnHandler<F>(F);

impl<F> QueryHandler for FnHandler<F>
where
    F: Fn(&QueryMessage) -> Result<QueryResult, DomainError> + Send + Sync,
{
    fn handle(&self, message: &QueryMessage) -> Result<QueryResult, DomainError> {
        (self.0)(message)
    }
}

/// Wraps a closure as a query handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn QueryHandler>
where
    F: Fn(&QueryMessage) -> Result<QueryResult, DomainError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wraps a closure taking the concrete query and returning a concrete
/// result as a query handler.
pub fn handler_for<Q, R, F>(f: F) -> Arc<dyn QueryHandler>
where
    Q: Query + PayloadType,
    R: Any + Send,
    F: Fn(&Q, &QueryMessage) -> Result<R, DomainError> + Send + Sync + 'static,
{
    handler_fn(move |message: &QueryMessage| {
        let query = message.payload_as::<Q>().ok_or_else(|| {
            DomainError::InvalidPayloadType(format!(
                "expected {}, got {}",
                Q::TYPE_NAME,
                message.payload_type()
            ))
        })?;
        let result: QueryResult = Box::new(f(query, message)?);
        Ok(result)
    })
}
