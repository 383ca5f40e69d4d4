//! Type-tag keyed handler table shared by the routers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use switchyard_core::error::DomainError;
use switchyard_core::type_tag::TypeTag;

/// Maps payload types to the single handler responsible for them.
pub struct HandlerMap<H: ?Sized> {
    handlers: HashMap<TypeTag, Arc<H>>,
}

impl<H: ?Sized> HandlerMap<H> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Maps `tag` to `handler`, replacing any previous mapping.
    pub fn insert(&mut self, tag: TypeTag, handler: Arc<H>) {
        self.handlers.insert(tag, handler);
    }

    /// Returns the handler mapped to `tag`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if nothing is mapped.
    pub fn get(&self, tag: &TypeTag) -> Result<Arc<H>, DomainError> {
        self.handlers
            .get(tag)
            .cloned()
            .ok_or_else(|| DomainError::HandlerNotFound(tag.clone()))
    }

    /// Like [`HandlerMap::get`], normalising `name` first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotFound` if nothing is mapped.
    pub fn get_by_name(&self, name: &str) -> Result<Arc<H>, DomainError> {
        self.get(&TypeTag::new(name))
    }

    /// Whether `tag` has a handler.
    #[must_use]
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Number of mapped types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The mapped types, in no particular order.
    pub fn types(&self) -> impl Iterator<Item = &TypeTag> {
        self.handlers.keys()
    }

    /// Every mapping, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeTag, &Arc<H>)> {
        self.handlers.iter()
    }
}

impl<H: ?Sized> Default for HandlerMap<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for HandlerMap<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.handlers.keys().map(TypeTag::as_str).collect();
        types.sort_unstable();
        f.debug_struct("HandlerMap").field("types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_mapped_handler() {
        // Arrange
        let mut map: HandlerMap<str> = HandlerMap::new();
        map.insert(TypeTag::new("Accounts.RegisterUser"), Arc::from("register"));

        // Act
        let handler = map.get(&TypeTag::new("Accounts.RegisterUser")).unwrap();

        // Assert
        assert_eq!(&*handler, "register");
    }

    #[test]
    fn test_get_unmapped_type_is_handler_not_found() {
        let map: HandlerMap<str> = HandlerMap::new();

        let err = map.get(&TypeTag::new("Accounts.Unknown")).unwrap_err();

        assert_eq!(err.to_string(), "Handler not defined for Accounts.Unknown");
    }

    #[test]
    fn test_insert_overwrites_previous_mapping() {
        // Arrange
        let mut map: HandlerMap<str> = HandlerMap::new();
        let tag = TypeTag::new("Accounts.RegisterUser");
        map.insert(tag.clone(), Arc::from("first"));

        // Act
        map.insert(tag.clone(), Arc::from("second"));

        // Assert
        assert_eq!(map.len(), 1);
        assert_eq!(&*map.get(&tag).unwrap(), "second");
    }

    #[test]
    fn test_get_by_name_normalises_separators() {
        let mut map: HandlerMap<str> = HandlerMap::new();
        map.insert(TypeTag::new("Accounts.RegisterUser"), Arc::from("register"));

        let handler = map.get_by_name("Accounts::RegisterUser").unwrap();

        assert_eq!(&*handler, "register");
        assert!(map.contains(&TypeTag::new("Accounts\\RegisterUser")));
    }
}
