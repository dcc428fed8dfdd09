#![allow(unsafe_code)]

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicU64, AtomicUsize,
    Ordering::{Acquire, Relaxed},
};

use ebr::Ebr;

use crate::debug_delay;
use crate::iter::Iter;
use crate::node::{Node, SENTINEL_VALUE};

/// A thread-safe sorted set of `i64`.
///
/// Membership tests and traversals are wait-free: they walk the chain
/// with atomic loads and never take a lock. Insertion and removal walk
/// the same way, then lock at most two adjacent nodes to validate and
/// commit the structural change, retrying when a concurrent writer got
/// there first. Removal marks a node deleted before unlinking it, so a
/// traversal that still reaches the node treats it as absent.
///
/// This is a cheaply cloneable handle in the manner of a database
/// handle: clone it into each thread that needs access, and all clones
/// operate on the same set.
///
/// `i64::MIN` is reserved for the internal sentinel that anchors the
/// chain. It is never a member, and `insert(i64::MIN)` returns `false`
/// without changing the set.
#[derive(Clone)]
pub struct SortedIntSet {
    inner: Arc<SetInner>,
    ebr: Ebr<Box<Node>>,
}

struct SetInner {
    head: Box<Node>,
    len: AtomicUsize,
    insert_retries: AtomicU64,
    remove_retries: AtomicU64,
}

/// Retry counters, snapshotted by [`SortedIntSet::stats`].
///
/// Each counter increments once per validation failure in the
/// corresponding operation's retry loop. Under contention these grow
/// without bound, which makes writer livelock observable rather than
/// silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub insert_retries: u64,
    pub remove_retries: u64,
}

impl Default for SortedIntSet {
    fn default() -> SortedIntSet {
        SortedIntSet {
            inner: Arc::new(SetInner {
                head: Node::sentinel(),
                len: AtomicUsize::new(0),
                insert_retries: AtomicU64::new(0),
                remove_retries: AtomicU64::new(0),
            }),
            ebr: Ebr::default(),
        }
    }
}

impl SortedIntSet {
    pub fn new() -> SortedIntSet {
        SortedIntSet::default()
    }

    /// Returns whether `value` is currently a live member.
    ///
    /// Takes no locks and has no side effects. The chain is strictly
    /// sorted, so the walk gives up as soon as it passes a larger
    /// value.
    pub fn contains(&self, value: i64) -> bool {
        let _guard = self.ebr.pin();

        let mut cursor = self.inner.head.next();
        while !cursor.is_null() {
            let node = unsafe { &*cursor };

            if value < node.value {
                return false;
            }

            if value == node.value {
                return !node.is_deleted();
            }

            cursor = node.next();
        }

        false
    }

    /// Adds `value` to the set. Returns `true` iff this call is the
    /// one that added it; `false` means the value was already present
    /// and nothing changed.
    pub fn insert(&self, value: i64) -> bool {
        if value == SENTINEL_VALUE {
            return false;
        }

        let _guard = self.ebr.pin();

        loop {
            debug_delay();
            let (a, b) = self.find_position(value);

            // pre-lock presence check. may be stale, but staleness in
            // the other direction is caught by the validation below
            if !b.is_null() && unsafe { &*b }.value == value {
                return false;
            }

            let a_ref = unsafe { &*a };
            let _a_lock = a_ref.lock();

            let adjacent = a_ref.next() == b;
            let b_live = b.is_null() || !unsafe { &*b }.is_deleted();
            if !adjacent || a_ref.is_deleted() || !b_live {
                self.inner.insert_retries.fetch_add(1, Relaxed);
                log::trace!("insert({value}): validation failed, retrying");
                continue;
            }

            debug_delay();

            // linearization point. the Release store publishes the
            // fully constructed node
            a_ref.store_next(Node::link(value, b));
            self.inner.len.fetch_add(1, Relaxed);
            log::trace!("insert({value}): linked");

            return true;
        }
    }

    /// Removes `value` from the set. Returns `true` iff this call is
    /// the one that removed it; `false` means no live element equals
    /// `value`.
    pub fn remove(&self, value: i64) -> bool {
        let mut guard = self.ebr.pin();

        loop {
            debug_delay();
            let (a, b) = self.find_position(value);

            if b.is_null() || unsafe { &*b }.value != value {
                return false;
            }

            let b_ref = unsafe { &*b };
            let b_lock = b_ref.lock();
            if b_ref.is_deleted() {
                // another remover won this value
                drop(b_lock);
                self.inner.remove_retries.fetch_add(1, Relaxed);
                log::trace!("remove({value}): lost deletion race, retrying");
                continue;
            }

            let a_ref = unsafe { &*a };
            let a_lock = a_ref.lock();
            if a_ref.next() != b || a_ref.is_deleted() {
                drop(a_lock);
                drop(b_lock);
                self.inner.remove_retries.fetch_add(1, Relaxed);
                log::trace!("remove({value}): neighborhood changed, retrying");
                continue;
            }

            // linearization point. traversals that reach the node
            // after this treat it as absent, reachable or not
            b_ref.mark_deleted();

            debug_delay();
            a_ref.store_next(b_ref.next());
            self.inner.len.fetch_sub(1, Relaxed);

            drop(a_lock);
            drop(b_lock);

            // an in-flight traversal may have loaded a pointer to the
            // node before the unlink. the drop waits in the epoch
            // domain until every guard pinned at unlink time is gone
            guard.defer_drop(unsafe { Box::from_raw(b) });
            log::trace!("remove({value}): unlinked");

            return true;
        }
    }

    /// Calls `visit` once per live element in ascending order, until
    /// the chain ends or `visit` returns `false`.
    ///
    /// No snapshot isolation: elements inserted or removed while the
    /// walk runs may or may not be observed. What is guaranteed is
    /// that every node inspected with its deletion flag clear is
    /// reported, strictly ascending, with no duplicates.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(i64) -> bool,
    {
        let _guard = self.ebr.pin();

        let mut cursor = self.inner.head.next();
        while !cursor.is_null() {
            let node = unsafe { &*cursor };
            if !node.is_deleted() && !visit(node.value) {
                break;
            }
            cursor = node.next();
        }
    }

    /// An iterator over the live values in ascending order, with the
    /// same consistency contract as [`range`](SortedIntSet::range).
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.ebr.pin(), self.inner.head.next())
    }

    /// Number of live elements. Exact when no writers are running,
    /// otherwise a snapshot that may not agree with any single
    /// traversal.
    pub fn len(&self) -> usize {
        self.inner.len.load(Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest live value observed by a traversal.
    pub fn first(&self) -> Option<i64> {
        let mut ret = None;
        self.range(|value| {
            ret = Some(value);
            false
        });
        ret
    }

    /// Largest live value observed by a traversal. Walks the whole
    /// chain.
    pub fn last(&self) -> Option<i64> {
        let mut ret = None;
        self.range(|value| {
            ret = Some(value);
            true
        });
        ret
    }

    /// Returns the counters for insert and remove retries.
    pub fn stats(&self) -> Stats {
        Stats {
            insert_retries: self.inner.insert_retries.load(Acquire),
            remove_retries: self.inner.remove_retries.load(Acquire),
        }
    }

    /// Lock-free positioning: the unique adjacent pair `(a, b)` with
    /// `a.value < value` and `value <= b.value`, `b` null when `value`
    /// is past the end. Callers must hold an epoch guard.
    fn find_position(&self, value: i64) -> (*mut Node, *mut Node) {
        let mut a = &*self.inner.head as *const Node as *mut Node;
        let mut b = self.inner.head.next();

        while !b.is_null() {
            let b_ref = unsafe { &*b };
            if b_ref.value >= value {
                break;
            }
            a = b;
            b = b_ref.next();
        }

        (a, b)
    }
}

impl Drop for SetInner {
    fn drop(&mut self) {
        // nodes handed to the epoch domain are already unlinked and
        // are dropped by it; everything still in the chain is freed
        // here
        let mut cursor = self.head.next();
        while !cursor.is_null() {
            let node = unsafe { Box::from_raw(cursor) };
            cursor = node.next();
        }
    }
}

impl fmt::Debug for SortedIntSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SortedIntSet [")?;
        let mut res = Ok(());
        let mut written = false;
        self.range(|value| {
            if written {
                res = formatter.write_str(", ");
            }
            res = res.and_then(|()| write!(formatter, "{value}"));
            written = true;
            res.is_ok()
        });
        res?;
        formatter.write_str("]")
    }
}

impl FromIterator<i64> for SortedIntSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> SortedIntSet {
        let set = SortedIntSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl Extend<i64> for SortedIntSet {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[test]
fn basic_functionality() {
    let set = SortedIntSet::new();
    assert_eq!(set.len(), 0);
    assert_eq!(set.iter().count(), 0);

    assert!(set.insert(5));
    assert!(set.insert(3));
    assert!(set.insert(8));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 5, 8]);
    assert_eq!(set.len(), 3);

    assert!(!set.insert(5));
    assert_eq!(set.len(), 3);

    assert!(set.remove(3));
    assert_eq!(set.len(), 2);
    assert!(!set.contains(3));

    assert!(!set.remove(3));
    assert_eq!(set.len(), 2);

    assert!(set.contains(8));
    assert!(!set.contains(100));
}

#[test]
fn sentinel_value_is_reserved() {
    let set = SortedIntSet::new();
    assert!(!set.insert(i64::MIN));
    assert!(!set.contains(i64::MIN));
    assert!(!set.remove(i64::MIN));
    assert_eq!(set.len(), 0);
    assert!(set.insert(i64::MIN + 1));
    assert_eq!(set.first(), Some(i64::MIN + 1));
}

#[test]
fn range_short_circuits() {
    let set: SortedIntSet = [1, 2, 3, 4, 5].into_iter().collect();
    let mut seen = vec![];
    set.range(|value| {
        seen.push(value);
        value < 3
    });
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn first_and_last() {
    let set = SortedIntSet::new();
    assert_eq!(set.first(), None);
    assert_eq!(set.last(), None);

    set.insert(10);
    set.insert(-10);
    set.insert(0);
    assert_eq!(set.first(), Some(-10));
    assert_eq!(set.last(), Some(10));

    set.remove(-10);
    assert_eq!(set.first(), Some(0));
}

#[test]
fn debug_rendering() {
    let set: SortedIntSet = [2, 1].into_iter().collect();
    assert_eq!(format!("{set:?}"), "SortedIntSet [1, 2]");
}
