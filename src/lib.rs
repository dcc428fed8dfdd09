//! A thread-safe sorted set of `i64` with wait-free readers and
//! per-node lock coupling for writers.
//!
//! Readers (`contains`, `range`, `iter`, `len`) never block: they walk
//! an intrusive sorted chain using atomic loads only. Writers
//! (`insert`, `remove`) locate their neighborhood with the same
//! lock-free walk, then take at most two per-node locks to validate
//! and commit the structural change, retrying from scratch when a
//! concurrent writer invalidated the neighborhood. Removal is lazy: a
//! node is marked deleted before it is unlinked, so traversals that
//! still reach it simply treat it as absent. Unlinked nodes are
//! reclaimed through an epoch domain once no in-flight traversal can
//! still hold a reference to them.
//!
//! [`SortedIntSet`] is a cheap handle: clone it into each thread that
//! needs access, and all clones share the same set.
//!
//! ```
//! use lazyset::SortedIntSet;
//!
//! let set = SortedIntSet::new();
//! assert!(set.insert(5));
//! assert!(set.insert(3));
//! assert!(!set.insert(5));
//! assert!(set.contains(3));
//! assert!(set.remove(3));
//! assert_eq!(set.iter().collect::<Vec<_>>(), vec![5]);
//! ```
//!
//! `i64::MIN` is reserved for the internal sentinel that anchors the
//! chain; it is never a member, and inserting it returns `false`.

#![deny(unsafe_code)]

#[cfg(any(test, feature = "lock_free_delays"))]
mod debug_delay;

#[cfg(any(test, feature = "lock_free_delays"))]
pub(crate) use debug_delay::debug_delay;

/// This function is useful for inducing random jitter into our atomic
/// operations, shaking out more possible interleavings quickly. It gets
/// fully eliminated by the compiler in non-test code.
#[cfg(not(any(test, feature = "lock_free_delays")))]
pub(crate) fn debug_delay() {}

mod iter;
mod node;
mod set;

pub use iter::Iter;
pub use set::{SortedIntSet, Stats};
