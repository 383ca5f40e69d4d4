//! Domain error types.

use thiserror::Error;

use crate::type_tag::TypeTag;

/// Top-level error type shared by every Switchyard crate.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No handler is registered for a payload type.
    #[error("Handler not defined for {0}")]
    HandlerNotFound(TypeTag),

    /// Malformed data: envelope maps, metadata values, payload shapes.
    #[error("validation error: {0}")]
    Validation(String),

    /// A serialized payload type that cannot be rebuilt from an array.
    #[error("invalid payload type: {0}")]
    InvalidPayloadType(String),

    /// A named service is missing from the container or has another type.
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    /// A handler or filter failed with an error of its own.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A queue or store collaborator failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Wraps an arbitrary handler error.
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_not_found_names_the_type() {
        let err = DomainError::HandlerNotFound(TypeTag::new("Accounts.RegisterUser"));
        assert_eq!(err.to_string(), "Handler not defined for Accounts.RegisterUser");
    }

    #[test]
    fn test_handler_wraps_source_error() {
        let io = std::io::Error::other("disk full");
        let err = DomainError::handler(io);
        assert!(matches!(err, DomainError::Handler(_)));
        assert_eq!(err.to_string(), "handler failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
    }
}
