//! Link from a child entity to the aggregate root that owns it.

use crate::aggregate_id::AggregateId;

/// Holds the id of the aggregate root a child entity belongs to.
///
/// An entity joins one root for its whole life. Registering it under a
/// different root is a programming error.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRootRef<I> {
    root: Option<I>,
}

impl<I: AggregateId> AggregateRootRef<I> {
    /// Creates an unattached reference.
    #[must_use]
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Attaches the entity to `root`. Re-registering the same root is
    /// allowed.
    pub fn register(&mut self, root: &I) {
        if let Some(existing) = &self.root {
            debug_assert!(
                existing == root,
                "entity already belongs to aggregate root {existing}, cannot register {root}"
            );
            return;
        }
        self.root = Some(root.clone());
    }

    /// The owning root, if registered.
    #[must_use]
    pub fn root(&self) -> Option<&I> {
        self.root.as_ref()
    }

    /// Whether a root is registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.root.is_some()
    }
}

impl<I: AggregateId> Default for AggregateRootRef<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_register_attaches_root_once() {
        let root = Uuid::new_v4();
        let mut link = AggregateRootRef::new();

        link.register(&root);
        link.register(&root);

        assert_eq!(link.root(), Some(&root));
        assert!(link.is_registered());
    }

    #[test]
    #[should_panic(expected = "entity already belongs to aggregate root")]
    #[cfg(debug_assertions)]
    fn test_register_different_root_asserts() {
        let mut link = AggregateRootRef::new();
        link.register(&Uuid::new_v4());

        link.register(&Uuid::new_v4());
    }
}
