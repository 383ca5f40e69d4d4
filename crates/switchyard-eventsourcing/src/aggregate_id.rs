//! Aggregate identifiers.

use std::fmt;
use std::str::FromStr;

use switchyard_core::error::DomainError;
use switchyard_core::type_tag::TypeTag;
use uuid::Uuid;

/// An identifier that can be written into an event record and read back.
pub trait AggregateId:
    fmt::Display + FromStr + Clone + fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// Type name stored alongside the id.
    const TYPE_NAME: &'static str;

    /// Canonical tag built from [`Self::TYPE_NAME`].
    #[must_use]
    fn type_tag() -> TypeTag {
        TypeTag::new(Self::TYPE_NAME)
    }

    /// Parses an id from its display form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `value` is not a valid id.
    fn parse_id(value: &str) -> Result<Self, DomainError> {
        value.parse::<Self>().map_err(|_| {
            DomainError::Validation(format!("invalid {} aggregate id: {value:?}", Self::TYPE_NAME))
        })
    }
}

impl AggregateId for Uuid {
    const TYPE_NAME: &'static str = "Uuid";
}
