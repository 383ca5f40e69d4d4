//! Filter list shared by the command and query pipelines.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Copy-on-write list of filters.
///
/// Readers take a cheap snapshot; adding a filter builds a new list, so a
/// dispatch in flight keeps the list it started with.
pub struct FilterChain<F: ?Sized> {
    filters: RwLock<Arc<[Arc<F>]>>,
}

impl<F: ?Sized> FilterChain<F> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Appends `filter` as the innermost layer so far.
    pub fn push(&self, filter: Arc<F>) {
        let mut filters = self.filters.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = filters.to_vec();
        next.push(filter);
        *filters = Arc::from(next);
    }

    /// The current filters, outermost first.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[Arc<F>]> {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the chain has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<F: ?Sized> Default for FilterChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for FilterChain<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.len())
            .finish()
    }
}
