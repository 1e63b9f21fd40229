//! The singly linked chain both queue variants are built on.
//!
//! ```text
//!          head (consumer)                    tail (producer)
//!              |                                   |
//!   anchor -> [Ready] -> [Ready] -> ... -> [Unready placeholder] -> anchor
//! ```
//!
//! The chain always holds the anchor and one `Unready` placeholder, so no link
//! inside it is ever null. The queue is empty exactly when the head is the
//! placeholder. The producer only writes the placeholder and the node it
//! allocates next; the consumer only reads and frees nodes it has observed as
//! `Ready`, plus the anchor's link, which is its head reference.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crossbeam_utils::CachePadded;

use crate::alloc::NodeAllocator;
use crate::error::AllocationError;
use crate::node::Node;

pub(crate) struct Chain<P, A: NodeAllocator> {
    /// Permanently `Unready`. Its link is the head of the chain.
    anchor: NonNull<Node<P>>,
    /// Current placeholder. Producer only.
    tail: CachePadded<UnsafeCell<NonNull<Node<P>>>>,
    alloc: A,
    _marker: PhantomData<P>,
}

// SAFETY: values cross from the producer thread to the consumer thread, and
// both threads use the allocator at the same time.
unsafe impl<P: Send, A: NodeAllocator + Send + Sync> Send for Chain<P, A> {}
unsafe impl<P: Send, A: NodeAllocator + Send + Sync> Sync for Chain<P, A> {}

impl<P, A: NodeAllocator> Chain<P, A> {
    pub(crate) fn new_in(alloc: A) -> Result<Self, AllocationError> {
        let anchor = Node::<P>::allocate_unready(&alloc)?;
        let placeholder = match Node::<P>::allocate_unready(&alloc) {
            Ok(node) => node,
            Err(err) => {
                // SAFETY: the anchor was never linked or shared.
                unsafe { Node::release(anchor, &alloc) };
                return Err(err);
            }
        };
        // SAFETY: both nodes are freshly allocated and exclusively ours.
        unsafe {
            placeholder.as_ref().set_next(anchor);
            anchor.as_ref().set_next(placeholder);
        }

        Ok(Chain {
            anchor,
            tail: CachePadded::new(UnsafeCell::new(placeholder)),
            alloc,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Appends `value` to the chain.
    ///
    /// On allocation failure nothing has been linked and `value` is dropped.
    ///
    /// # Safety
    ///
    /// Producer only: never called concurrently with itself.
    pub(crate) unsafe fn append(&self, value: P) -> Result<(), AllocationError> {
        let placeholder = Node::allocate_unready(&self.alloc)?;
        placeholder.as_ref().set_next(self.anchor);

        let tail = *self.tail.get();
        tail.as_ref().set_next(placeholder);
        tail.as_ref().publish(value);
        // The consumer may free `tail` from here on.
        *self.tail.get() = placeholder;
        Ok(())
    }

    /// Oldest node not yet consumed. May be the placeholder.
    ///
    /// # Safety
    ///
    /// Consumer only.
    #[inline]
    pub(crate) unsafe fn head(&self) -> NonNull<Node<P>> {
        // SAFETY: the anchor link is set at construction and only ever moved
        // forward onto non-null successors.
        NonNull::new_unchecked(self.anchor.as_ref().next())
    }

    /// # Safety
    ///
    /// Consumer only.
    #[inline]
    pub(crate) unsafe fn is_empty(&self) -> bool {
        !self.head().as_ref().is_ready()
    }

    /// Unlinks the head node if it is `Ready`.
    ///
    /// # Safety
    ///
    /// Consumer only. The caller becomes the sole owner of the returned node.
    #[inline]
    unsafe fn unlink_head(&self) -> Option<NonNull<Node<P>>> {
        let head = self.head();
        if !head.as_ref().is_ready() {
            return None;
        }
        self.anchor.as_ref().set_next(head.as_ref().successor());
        Some(head)
    }

    /// # Safety
    ///
    /// Consumer only.
    pub(crate) unsafe fn take(&self) -> Option<P> {
        let head = self.unlink_head()?;
        Some(Node::take(head, &self.alloc))
    }

    /// Drops the head value. Returns `false` if there was none.
    ///
    /// # Safety
    ///
    /// Consumer only.
    pub(crate) unsafe fn pop(&self) -> bool {
        match self.unlink_head() {
            Some(head) => {
                Node::retire(head, &self.alloc);
                true
            }
            None => false,
        }
    }

    /// # Safety
    ///
    /// Consumer only; the reference must not outlive the next consumer call.
    #[inline]
    pub(crate) unsafe fn peek(&self) -> Option<&P> {
        let head = self.head();
        if head.as_ref().is_ready() {
            Some(head.as_ref().payload())
        } else {
            None
        }
    }

    /// # Safety
    ///
    /// Consumer only, with no other outstanding reference into the head.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn peek_mut(&self) -> Option<&mut P> {
        let head = self.head();
        if head.as_ref().is_ready() {
            Some(head.as_ref().payload_mut())
        } else {
            None
        }
    }

    /// Counts `Ready` nodes by walking from the head. O(n).
    ///
    /// # Safety
    ///
    /// Consumer only. A concurrent producer only makes the count stale.
    pub(crate) unsafe fn len(&self) -> usize {
        let mut count = 0;
        let mut node = self.head();
        while node.as_ref().is_ready() {
            count += 1;
            node = node.as_ref().successor();
        }
        count
    }

    /// Drops every published value. Returns how many were dropped.
    ///
    /// # Safety
    ///
    /// Consumer only.
    pub(crate) unsafe fn drain(&self) -> usize {
        let mut dropped = 0;
        while self.pop() {
            dropped += 1;
        }
        dropped
    }
}

impl<P, A: NodeAllocator> Drop for Chain<P, A> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means neither role is active any more.
        unsafe {
            self.drain();
            Node::release(self.head(), &self.alloc);
            Node::release(self.anchor, &self.alloc);
        }
    }
}
