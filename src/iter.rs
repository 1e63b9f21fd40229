//! Forward traversal over the published values of a [`SpscQueue`].
//!
//! [`SpscQueue`]: crate::SpscQueue

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::alloc::NodeAllocator;
use crate::chain::Chain;
use crate::node::Node;

/// A forward-only cursor that wraps around.
///
/// The cursor starts on the oldest value. [`advance`](Cursor::advance) steps
/// to the next published value; stepping past the last one puts the cursor
/// back on its starting node and marks it invalid. This lets the caller walk
/// the ready values without a null terminator: loop while
/// [`is_valid`](Cursor::is_valid) holds.
///
/// A cursor created on an empty queue is invalid from the start. Values the
/// producer publishes while the cursor is alive become reachable through
/// [`advance`](Cursor::advance) as long as the cursor has not wrapped yet.
///
/// ```
/// use spsc_chain::SpscQueue;
///
/// let queue: SpscQueue<i32> = (1..=3).collect();
/// let mut cursor = queue.cursor();
/// let mut seen = Vec::new();
/// while let Some(value) = cursor.get() {
///     seen.push(*value);
///     cursor.advance();
/// }
/// assert_eq!(seen, [1, 2, 3]);
/// assert!(!cursor.is_valid());
/// ```
pub struct Cursor<'a, T> {
    start: NonNull<Node<T>>,
    current: NonNull<Node<T>>,
    wrapped: bool,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Cursor<'a, T> {
    /// # Safety
    ///
    /// Must be called by the consumer side, and the chain must not be consumed
    /// from for `'a`.
    pub(crate) unsafe fn new<A: NodeAllocator>(chain: &'a Chain<T, A>) -> Self {
        let start = chain.head();
        Cursor {
            start,
            current: start,
            wrapped: !start.as_ref().is_ready(),
            _marker: PhantomData,
        }
    }

    /// Whether the cursor sits on a published value.
    pub fn is_valid(&self) -> bool {
        // SAFETY: nodes stay alive for 'a.
        !self.wrapped && unsafe { self.current.as_ref().is_ready() }
    }

    /// Whether [`advance`](Cursor::advance) would move onto another value
    /// instead of wrapping.
    pub fn has_next(&self) -> bool {
        if !self.is_valid() {
            return false;
        }
        // SAFETY: the current node is ready, so its link is final.
        unsafe { self.current.as_ref().successor().as_ref().is_ready() }
    }

    /// Steps to the next published value, or wraps to the start and becomes
    /// invalid.
    pub fn advance(&mut self) {
        if self.has_next() {
            // SAFETY: checked by `has_next`.
            self.current = unsafe { self.current.as_ref().successor() };
        } else {
            self.current = self.start;
            self.wrapped = true;
        }
    }

    /// The value under the cursor, if valid.
    pub fn get(&self) -> Option<&'a T> {
        if self.is_valid() {
            // SAFETY: ready nodes are neither written nor freed for 'a.
            Some(unsafe { self.current.as_ref().payload() })
        } else {
            None
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("current", &self.get())
            .field("wrapped", &self.wrapped)
            .finish()
    }
}

/// Borrowing iterator over the published values, oldest first.
///
/// Created by [`SpscQueue::iter`](crate::SpscQueue::iter) and
/// [`Consumer::iter`](crate::Consumer::iter).
pub struct Iter<'a, T> {
    next: Option<NonNull<Node<T>>>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iter<'a, T> {
    /// # Safety
    ///
    /// Same contract as [`Cursor::new`].
    pub(crate) unsafe fn new<A: NodeAllocator>(chain: &'a Chain<T, A>) -> Self {
        Iter {
            next: Some(chain.head()),
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.next?;
        // SAFETY: nodes stay alive for 'a and ready payloads are immutable.
        unsafe {
            if !node.as_ref().is_ready() {
                self.next = None;
                return None;
            }
            self.next = Some(node.as_ref().successor());
            Some(node.as_ref().payload())
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            next: self.next,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}
