//! Conflict hook: the caller's say in how a duplicate link is reconciled.
//!
//! When [`EdgeStore::link`](crate::store::EdgeStore::link) hits an existing
//! relationship it builds a candidate row (the stored row with a fresh
//! timestamp and, unless [`Weight::Keep`](crate::Weight::Keep) was passed,
//! the new weight) and hands it to the hook before writing it back. Whatever
//! the hook leaves in the candidate is the update payload, except the
//! identity columns, which the store never rewrites.
//!
//! The hook runs synchronously on the calling thread and must not write to
//! the same row itself.

use std::fmt;

use crate::types::{EdgeType, Row};

/// Identity of the store raising a duplicate-link event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreIdentity {
    pub table: String,
    pub default_type: Option<EdgeType>,
}

/// Strategy invoked with the candidate row of a duplicate link.
pub trait ConflictHook: Send + Sync {
    fn on_duplicate(&self, store: &StoreIdentity, candidate: &mut Row);
}

impl<F> ConflictHook for F
where
    F: Fn(&StoreIdentity, &mut Row) + Send + Sync,
{
    fn on_duplicate(&self, store: &StoreIdentity, candidate: &mut Row) {
        self(store, candidate)
    }
}

/// Owned, type-erased hook as held by the store.
pub struct BoxedHook(Box<dyn ConflictHook>);

impl BoxedHook {
    pub fn new(hook: impl ConflictHook + 'static) -> Self {
        BoxedHook(Box::new(hook))
    }

    pub(crate) fn call(&self, store: &StoreIdentity, candidate: &mut Row) {
        self.0.on_duplicate(store, candidate)
    }
}

impl fmt::Debug for BoxedHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConflictHook")
    }
}
