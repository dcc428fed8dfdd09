use std::ptr;
use std::sync::atomic::{
    AtomicBool, AtomicPtr,
    Ordering::{Acquire, Release},
};

use parking_lot::{Mutex, MutexGuard};

/// Value held by the permanent sentinel at the front of every chain.
/// Reserved: `i64::MIN` is never a member of a `SortedIntSet`.
pub(crate) const SENTINEL_VALUE: i64 = i64::MIN;

/// One element of the intrusive sorted chain.
///
/// `next` and `deleted` are only ever accessed atomically so that
/// traversals can walk the chain without taking `mu`. The mutex
/// serializes structural changes to this node's neighborhood and is
/// never held across a traversal.
pub(crate) struct Node {
    pub(crate) value: i64,
    deleted: AtomicBool,
    next: AtomicPtr<Node>,
    mu: Mutex<()>,
}

impl Node {
    /// Allocates a linked node and leaks it into the chain. Ownership
    /// returns to a `Box` either at physical unlink (deferred through
    /// the ebr domain) or when the whole set is dropped.
    pub(crate) fn link(value: i64, next: *mut Node) -> *mut Node {
        Box::into_raw(Box::new(Node {
            value,
            deleted: AtomicBool::new(false),
            next: AtomicPtr::new(next),
            mu: Mutex::new(()),
        }))
    }

    pub(crate) fn sentinel() -> Box<Node> {
        Box::new(Node {
            value: SENTINEL_VALUE,
            deleted: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            mu: Mutex::new(()),
        })
    }

    pub(crate) fn next(&self) -> *mut Node {
        self.next.load(Acquire)
    }

    /// Release pairs with the Acquire in `next`: a traversal that
    /// observes the new pointer observes a fully constructed node.
    pub(crate) fn store_next(&self, next: *mut Node) {
        self.next.store(next, Release);
    }

    pub(crate) fn is_deleted(&self) -> bool {
        self.deleted.load(Acquire)
    }

    /// Transitions false -> true exactly once, under this node's lock.
    pub(crate) fn mark_deleted(&self) {
        self.deleted.store(true, Release);
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.mu.lock()
    }
}
