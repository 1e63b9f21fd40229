//! Value-owning queue with container ergonomics.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use crate::alloc::{Global, NodeAllocator};
use crate::chain::Chain;
use crate::error::{AllocationError, EmptyQueueError};
use crate::iter::{Cursor, Iter};
use crate::sync::Arc;

/// Unbounded single-producer/single-consumer FIFO of owned values.
///
/// Owned by one thread it behaves like a sequential container: push at the
/// back, take from the front, peek, iterate, clear, copy. To use it between
/// two threads, [`into_split`](SpscQueue::into_split) it into a [`Producer`]
/// and a [`Consumer`]. Appending and removing never lock and never wait; the
/// only shared state is a per-node ready flag.
///
/// [`len`](SpscQueue::len) walks the whole chain and is O(n).
///
/// ```
/// use spsc_chain::SpscQueue;
///
/// let mut queue = SpscQueue::new();
/// queue.push_back("a").unwrap();
/// queue.push_back("b").unwrap();
/// assert_eq!(queue.len(), 2);
/// assert_eq!(queue.take_front(), Ok("a"));
/// assert_eq!(queue.front(), Ok(&"b"));
/// ```
pub struct SpscQueue<T, A: NodeAllocator = Global> {
    chain: Chain<T, A>,
    _not_sync: PhantomData<Cell<()>>,
}

// SAFETY: a shared queue hands out `&T`, so sharing it needs `T: Sync`.
unsafe impl<T: Send + Sync, A: NodeAllocator + Send + Sync> Sync for SpscQueue<T, A> {}

impl<T> SpscQueue<T> {
    /// Creates an empty queue backed by the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty queue, reporting allocation failure instead of aborting.
    pub fn try_new() -> Result<Self, AllocationError> {
        Self::try_new_in(Global)
    }

    /// Creates a queue holding `n` clones of `value`.
    pub fn from_elem(n: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut queue = Self::new();
        queue.extend(std::iter::repeat(value).take(n));
        queue
    }
}

impl<T, A: NodeAllocator> SpscQueue<T, A> {
    /// Creates an empty queue whose nodes come from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        match Self::try_new_in(alloc) {
            Ok(queue) => queue,
            Err(err) => std::alloc::handle_alloc_error(err.layout()),
        }
    }

    /// Fallible version of [`new_in`](SpscQueue::new_in).
    pub fn try_new_in(alloc: A) -> Result<Self, AllocationError> {
        let chain = Chain::new_in(alloc)?;
        tracing::trace!(value_size = std::mem::size_of::<T>(), "created spsc queue");
        Ok(SpscQueue {
            chain,
            _not_sync: PhantomData,
        })
    }

    /// The allocator nodes come from.
    pub fn allocator(&self) -> &A {
        self.chain.allocator()
    }

    /// Appends `value` at the back.
    ///
    /// If no node can be allocated the queue is left unchanged and `value`
    /// is dropped.
    #[inline]
    pub fn push_back(&mut self, value: T) -> Result<(), AllocationError> {
        // SAFETY: `&mut self` gives exclusive access to both roles.
        unsafe { self.chain.append(value) }
    }

    /// Removes and returns the front value.
    #[inline]
    pub fn take_front(&mut self) -> Result<T, EmptyQueueError> {
        // SAFETY: as above.
        unsafe { self.chain.take() }.ok_or(EmptyQueueError)
    }

    /// Drops the front value. Returns `false` if the queue was empty.
    #[inline]
    pub fn pop_front(&mut self) -> bool {
        // SAFETY: as above.
        unsafe { self.chain.pop() }
    }

    /// The front value, without removing it.
    #[inline]
    pub fn front(&self) -> Result<&T, EmptyQueueError> {
        // SAFETY: nothing can consume while `self` is borrowed.
        unsafe { self.chain.peek() }.ok_or(EmptyQueueError)
    }

    /// Mutable access to the front value.
    #[inline]
    pub fn front_mut(&mut self) -> Result<&mut T, EmptyQueueError> {
        // SAFETY: `&mut self` rules out any other reference into the head.
        unsafe { self.chain.peek_mut() }.ok_or(EmptyQueueError)
    }

    /// Whether the queue holds no value. O(1).
    #[inline]
    pub fn is_empty(&self) -> bool {
        // SAFETY: consumer-side read under a shared borrow.
        unsafe { self.chain.is_empty() }
    }

    /// Number of values, counted by walking the chain. O(n).
    pub fn len(&self) -> usize {
        // SAFETY: consumer-side read under a shared borrow.
        unsafe { self.chain.len() }
    }

    /// Drops every value, leaving the queue empty with a single placeholder
    /// node.
    pub fn clear(&mut self) {
        // SAFETY: `&mut self` gives exclusive access to the whole chain.
        let dropped = unsafe { self.chain.drain() };
        tracing::debug!(dropped, "cleared spsc queue");
    }

    /// Pops until the queue is empty. Returns how many values were dropped.
    ///
    /// Removal only ever happens at the head, so on a [`Consumer`] this is
    /// safe while the producer keeps appending.
    pub fn extract_all(&mut self) -> usize {
        // SAFETY: `&mut self` makes this the only consumer.
        let dropped = unsafe { self.chain.drain() };
        tracing::debug!(dropped, "extracted all values");
        dropped
    }

    /// Iterates over the values from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        // SAFETY: the shared borrow keeps consumers out for the iterator's life.
        unsafe { Iter::new(&self.chain) }
    }

    /// A wrapping cursor positioned on the front value.
    pub fn cursor(&self) -> Cursor<'_, T> {
        // SAFETY: as for `iter`.
        unsafe { Cursor::new(&self.chain) }
    }

    /// Splits the queue into a producer half and a consumer half that may
    /// live on different threads. Values already queued stay queued.
    pub fn into_split(self) -> (Producer<T, A>, Consumer<T, A>) {
        tracing::trace!("splitting spsc queue");
        let chain = Arc::new(self.chain);
        (
            Producer {
                chain: Arc::clone(&chain),
            },
            Consumer {
                chain,
                _not_sync: PhantomData,
            },
        )
    }

    /// Appends clones of every value in `other`, in order.
    fn copy_from(&mut self, other: &Self)
    where
        T: Clone,
    {
        for value in other.iter() {
            // the clone runs before a node is linked, so a panicking
            // `Clone` leaves nothing half-published
            let value = value.clone();
            if let Err(err) = self.push_back(value) {
                std::alloc::handle_alloc_error(err.layout());
            }
        }
    }
}

impl<T> Default for SpscQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: NodeAllocator + Clone> Clone for SpscQueue<T, A> {
    fn clone(&self) -> Self {
        let mut copy = Self::new_in(self.allocator().clone());
        copy.copy_from(self);
        copy
    }

    /// Assignment: drops the current values, then copies `source` in order.
    /// The allocator of `self` is kept.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.copy_from(source);
    }
}

impl<T, A: NodeAllocator> Extend<T> for SpscQueue<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push_back(value) {
                std::alloc::handle_alloc_error(err.layout());
            }
        }
    }
}

impl<'a, T: Copy + 'a, A: NodeAllocator> Extend<&'a T> for SpscQueue<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for SpscQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

impl<'a, T, A: NodeAllocator> IntoIterator for &'a SpscQueue<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: PartialEq, A: NodeAllocator, B: NodeAllocator> PartialEq<SpscQueue<T, B>>
    for SpscQueue<T, A>
{
    fn eq(&self, other: &SpscQueue<T, B>) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: NodeAllocator> Eq for SpscQueue<T, A> {}

impl<T: fmt::Debug, A: NodeAllocator> fmt::Debug for SpscQueue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Producing half of a split [`SpscQueue`].
///
/// There is exactly one producer per queue and it is not `Clone`.
pub struct Producer<T, A: NodeAllocator = Global> {
    chain: Arc<Chain<T, A>>,
}

impl<T, A: NodeAllocator> Producer<T, A> {
    /// See [`SpscQueue::push_back`].
    #[inline]
    pub fn push_back(&mut self, value: T) -> Result<(), AllocationError> {
        // SAFETY: the producer half is unique and `&mut self` serialises calls.
        unsafe { self.chain.append(value) }
    }

    /// The allocator nodes come from.
    pub fn allocator(&self) -> &A {
        self.chain.allocator()
    }
}

impl<T, A: NodeAllocator> fmt::Debug for Producer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

/// Consuming half of a split [`SpscQueue`].
///
/// Every read reflects the values published so far; the producer may add
/// more at any moment.
pub struct Consumer<T, A: NodeAllocator = Global> {
    chain: Arc<Chain<T, A>>,
    _not_sync: PhantomData<Cell<()>>,
}

// SAFETY: as for `SpscQueue`.
unsafe impl<T: Send + Sync, A: NodeAllocator + Send + Sync> Sync for Consumer<T, A> {}

impl<T, A: NodeAllocator> Consumer<T, A> {
    /// See [`SpscQueue::take_front`].
    #[inline]
    pub fn take_front(&mut self) -> Result<T, EmptyQueueError> {
        // SAFETY: the consumer half is unique and `&mut self` serialises calls.
        unsafe { self.chain.take() }.ok_or(EmptyQueueError)
    }

    /// See [`SpscQueue::pop_front`].
    #[inline]
    pub fn pop_front(&mut self) -> bool {
        // SAFETY: as above.
        unsafe { self.chain.pop() }
    }

    /// See [`SpscQueue::front`].
    #[inline]
    pub fn front(&self) -> Result<&T, EmptyQueueError> {
        // SAFETY: the shared borrow keeps `take_front` out.
        unsafe { self.chain.peek() }.ok_or(EmptyQueueError)
    }

    /// See [`SpscQueue::front_mut`].
    #[inline]
    pub fn front_mut(&mut self) -> Result<&mut T, EmptyQueueError> {
        // SAFETY: the producer never touches a published node.
        unsafe { self.chain.peek_mut() }.ok_or(EmptyQueueError)
    }

    /// See [`SpscQueue::is_empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        // SAFETY: consumer side.
        unsafe { self.chain.is_empty() }
    }

    /// Values published so far, counted by walking the chain. O(n).
    ///
    /// The count is a snapshot: the producer may publish more before it
    /// returns.
    pub fn len(&self) -> usize {
        // SAFETY: consumer side.
        unsafe { self.chain.len() }
    }

    /// See [`SpscQueue::extract_all`].
    pub fn extract_all(&mut self) -> usize {
        // SAFETY: consumer side.
        let dropped = unsafe { self.chain.drain() };
        tracing::debug!(dropped, "extracted all values");
        dropped
    }

    /// See [`SpscQueue::iter`].
    pub fn iter(&self) -> Iter<'_, T> {
        // SAFETY: the shared borrow keeps consumer calls out.
        unsafe { Iter::new(&self.chain) }
    }

    /// See [`SpscQueue::cursor`].
    pub fn cursor(&self) -> Cursor<'_, T> {
        // SAFETY: as for `iter`.
        unsafe { Cursor::new(&self.chain) }
    }
}

impl<T: fmt::Debug, A: NodeAllocator> fmt::Debug for Consumer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
