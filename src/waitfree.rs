//! Minimal wait-free queue of borrowed pointers.
//!
//! [`WaitFreeQueue`] passes addresses of caller-owned values from one thread to
//! another. It never dereferences, copies or frees a pointee: ownership of the
//! pointed-to value stays with the caller, and so does the responsibility of
//! keeping it alive until the consumer is done with it. Every operation is a
//! bounded number of steps; there are no spin loops and no blocking waits.
//!
//! There is deliberately no `len`: the queue does not track its size.
//!
//! ```
//! use std::ptr::NonNull;
//! use spsc_chain::waitfree::WaitFreeQueue;
//!
//! let values = [1u64, 2, 3];
//! let mut queue = WaitFreeQueue::new();
//! for value in &values {
//!     queue.produce(NonNull::from(value)).unwrap();
//! }
//! let first = queue.consume().unwrap();
//! assert_eq!(unsafe { *first.as_ref() }, 1);
//! ```

use std::fmt;
use std::ptr::NonNull;

use crate::alloc::{Global, NodeAllocator};
use crate::chain::Chain;
use crate::error::AllocationError;
use crate::sync::Arc;

/// A pointer the queue carries but never dereferences.
struct Opaque<T>(NonNull<T>);

// SAFETY: the queue only moves the address between threads; dereferencing it
// is the caller's responsibility and requires `unsafe` on their side.
unsafe impl<T: Send> Send for Opaque<T> {}

/// Wait-free single-producer/single-consumer queue of `NonNull<T>`.
///
/// Used directly it is a plain FIFO owned by one thread. Call
/// [`into_split`](WaitFreeQueue::into_split) to hand the producing and
/// consuming roles to two threads.
pub struct WaitFreeQueue<T, A: NodeAllocator = Global> {
    chain: Chain<Opaque<T>, A>,
}

impl<T> WaitFreeQueue<T> {
    /// Creates an empty queue backed by the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty queue, reporting allocation failure instead of aborting.
    pub fn try_new() -> Result<Self, AllocationError> {
        Self::try_new_in(Global)
    }
}

impl<T, A: NodeAllocator> WaitFreeQueue<T, A> {
    /// Creates an empty queue whose nodes come from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        match Self::try_new_in(alloc) {
            Ok(queue) => queue,
            Err(err) => std::alloc::handle_alloc_error(err.layout()),
        }
    }

    /// Fallible version of [`new_in`](WaitFreeQueue::new_in).
    pub fn try_new_in(alloc: A) -> Result<Self, AllocationError> {
        Ok(WaitFreeQueue {
            chain: Chain::new_in(alloc)?,
        })
    }

    /// Appends `ptr`. Fails only when a node cannot be allocated, in which
    /// case the queue is unchanged.
    #[inline]
    pub fn produce(&mut self, ptr: NonNull<T>) -> Result<(), AllocationError> {
        // SAFETY: `&mut self` makes this the only producer.
        unsafe { self.chain.append(Opaque(ptr)) }
    }

    /// Removes the oldest pointer, or returns `None` if nothing is published.
    #[inline]
    pub fn consume(&mut self) -> Option<NonNull<T>> {
        // SAFETY: `&mut self` makes this the only consumer.
        unsafe { self.chain.take() }.map(|opaque| opaque.0)
    }

    /// Whether no pointer is waiting to be consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        // SAFETY: no consumer call can run while `self` is borrowed.
        unsafe { self.chain.is_empty() }
    }

    /// The allocator nodes come from.
    pub fn allocator(&self) -> &A {
        self.chain.allocator()
    }

    /// Splits the queue into a producer half and a consumer half that may
    /// live on different threads.
    pub fn into_split(self) -> (Producer<T, A>, Consumer<T, A>) {
        tracing::trace!("splitting wait-free queue");
        let chain = Arc::new(self.chain);
        (
            Producer {
                chain: Arc::clone(&chain),
            },
            Consumer { chain },
        )
    }
}

impl<T> Default for WaitFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the pointers published at the time of the call.
impl<T, A: NodeAllocator + Clone> Clone for WaitFreeQueue<T, A> {
    fn clone(&self) -> Self {
        let mut copy = Self::new_in(self.chain.allocator().clone());
        // SAFETY: `&self` keeps every consumer call out while we walk.
        let mut node = unsafe { self.chain.head() };
        unsafe {
            while node.as_ref().is_ready() {
                if let Err(err) = copy.produce(node.as_ref().payload().0) {
                    std::alloc::handle_alloc_error(err.layout());
                }
                node = node.as_ref().successor();
            }
        }
        copy
    }
}

impl<T, A: NodeAllocator> fmt::Debug for WaitFreeQueue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFreeQueue")
            .field("is_empty", &self.is_empty())
            .finish_non_exhaustive()
    }
}

/// Producing half of a split [`WaitFreeQueue`].
pub struct Producer<T, A: NodeAllocator = Global> {
    chain: Arc<Chain<Opaque<T>, A>>,
}

impl<T, A: NodeAllocator> Producer<T, A> {
    /// See [`WaitFreeQueue::produce`].
    #[inline]
    pub fn produce(&mut self, ptr: NonNull<T>) -> Result<(), AllocationError> {
        // SAFETY: the producer half is unique and `&mut self` serialises calls.
        unsafe { self.chain.append(Opaque(ptr)) }
    }
}

impl<T, A: NodeAllocator> fmt::Debug for Producer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

/// Consuming half of a split [`WaitFreeQueue`].
pub struct Consumer<T, A: NodeAllocator = Global> {
    chain: Arc<Chain<Opaque<T>, A>>,
}

impl<T, A: NodeAllocator> Consumer<T, A> {
    /// See [`WaitFreeQueue::consume`].
    #[inline]
    pub fn consume(&mut self) -> Option<NonNull<T>> {
        // SAFETY: the consumer half is unique and `&mut self` serialises calls.
        unsafe { self.chain.take() }.map(|opaque| opaque.0)
    }

    /// Whether nothing is published right now. The producer may publish the
    /// moment this returns, so treat `true` as a hint.
    #[inline]
    pub fn is_empty(&self) -> bool {
        // SAFETY: consumer side; `&self` excludes a concurrent `consume`.
        unsafe { self.chain.is_empty() }
    }
}

impl<T, A: NodeAllocator> fmt::Debug for Consumer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("is_empty", &self.is_empty())
            .finish_non_exhaustive()
    }
}
