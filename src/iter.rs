#![allow(unsafe_code)]

use ebr::Guard;

use crate::node::Node;

/// Iterator over the live values of a
/// [`SortedIntSet`](crate::SortedIntSet), ascending.
///
/// Holds an epoch guard for its whole lifetime, so nodes reached by
/// the walk cannot be freed underneath it, even after they have been
/// removed and unlinked by concurrent writers.
pub struct Iter<'a> {
    _guard: Guard<'a, Box<Node>>,
    cursor: *const Node,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(
        guard: Guard<'a, Box<Node>>,
        cursor: *const Node,
    ) -> Iter<'a> {
        Iter { _guard: guard, cursor }
    }
}

impl Iterator for Iter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        while !self.cursor.is_null() {
            let node = unsafe { &*self.cursor };
            self.cursor = node.next();
            if !node.is_deleted() {
                return Some(node.value);
            }
        }

        None
    }
}
