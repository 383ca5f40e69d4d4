//! Explicit event-type to apply-function tables.

use std::collections::HashMap;
use std::fmt;

use switchyard_core::payload::{Event, PayloadType};
use switchyard_core::type_tag::TypeTag;

type ApplyFn<A> = Box<dyn Fn(&mut A, &dyn Event) + Send + Sync>;

/// Maps event types to the functions that fold them into an aggregate `A`.
///
/// Build one per aggregate type, typically in a `LazyLock` static, and call
/// [`EventAppliers::apply`] from `AggregateRoot::apply_event`. Event types
/// without an entry are ignored.
pub struct EventAppliers<A> {
    appliers: HashMap<TypeTag, ApplyFn<A>>,
}

impl<A: 'static> EventAppliers<A> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            appliers: HashMap::new(),
        }
    }

    /// Adds `apply` for events of type `E`.
    #[must_use]
    pub fn on<E: Event + PayloadType>(mut self, apply: fn(&mut A, &E)) -> Self {
        self.appliers.insert(
            E::type_tag(),
            Box::new(move |aggregate: &mut A, event: &dyn Event| {
                if let Some(event) = event.as_any().downcast_ref::<E>() {
                    apply(aggregate, event);
                }
            }),
        );
        self
    }

    /// Applies `event` to `aggregate`. Returns whether an entry existed.
    pub fn apply(&self, aggregate: &mut A, event: &dyn Event) -> bool {
        match self.appliers.get(&event.payload_type()) {
            Some(apply) => {
                apply(aggregate, event);
                true
            }
            None => false,
        }
    }

    /// Whether events tagged `tag` have an entry.
    #[must_use]
    pub fn handles(&self, tag: &TypeTag) -> bool {
        self.appliers.contains_key(tag)
    }
}

impl<A: 'static> Default for EventAppliers<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventAppliers<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.appliers.keys().map(TypeTag::as_str).collect();
        types.sort_unstable();
        f.debug_struct("EventAppliers").field("types", &types).finish()
    }
}
