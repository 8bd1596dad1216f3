//! Shareable context cells

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a context cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A shareable cell of type `T`.
///
/// Components read it with [`RenderCx::use_context`](crate::host::RenderCx::use_context)
/// and see the value published by the nearest enclosing provider, or the
/// default value when no provider encloses them. Cloning a context yields
/// the same cell.
pub struct Context<T: 'static> {
    id: ContextId,
    default: Rc<T>,
}

impl<T: 'static> Context<T> {
    /// Create a new cell seeded with a default value.
    pub fn new(default: T) -> Self {
        Self {
            id: ContextId::next(),
            default: Rc::new(default),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Value visible when no provider is mounted
    pub fn default_value(&self) -> Rc<T> {
        Rc::clone(&self.default)
    }
}

impl<T: 'static> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            default: Rc::clone(&self.default),
        }
    }
}

impl<T: 'static> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_have_distinct_ids() {
        let a = Context::new(1);
        let b = Context::new(1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(*a.default_value(), 1);
    }
}
