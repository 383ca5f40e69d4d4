use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DomainError;
use crate::payload::{IntoPayload, PayloadData, PayloadType};
use crate::type_tag::TypeTag;

type PayloadFactory<P> = fn(&PayloadData) -> Result<Arc<P>, DomainError>;

/// Resolves serialized `payload_type` tags to payload constructors.
///
/// One registry exists per envelope kind, e.g.
/// `PayloadRegistry<dyn Command>`. Only registered types can be
/// deserialized.
pub struct PayloadRegistry<P: ?Sized> {
    factories: HashMap<TypeTag, PayloadFactory<P>>,
}

impl<P: ?Sized> PayloadRegistry<P> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `T` under its type tag.
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: PayloadType + IntoPayload<P>,
    {
        let factory: PayloadFactory<P> = |data| Ok(T::from_array(data)?.into_payload());
        self.factories.insert(T::type_tag(), factory);
        self
    }

    /// Returns `true` if `tag` can be deserialized.
    #[must_use]
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.factories.contains_key(tag)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Rebuilds a payload of type `tag` from `data`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayloadType` for unregistered tags and
    /// the payload's own validation error for bad data.
    pub fn build(&self, tag: &TypeTag, data: &PayloadData) -> Result<Arc<P>, DomainError> {
        let factory = self.factories.get(tag).ok_or_else(|| {
            DomainError::InvalidPayloadType(format!("{tag} does not support array reconstruction"))
        })?;
        factory(data)
    }
}

impl<P: ?Sized> Default for PayloadRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized> fmt::Debug for PayloadRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&TypeTag> = self.factories.keys().collect();
        types.sort();
        f.debug_struct("PayloadRegistry").field("types", &types).finish()
    }
}
