//! Chain nodes and the publication protocol.
//!
//! A node is allocated `Unready`, filled exactly once by the producer and then
//! flipped to `Ready` with a release store. The consumer only reads a payload
//! after observing `Ready` through an acquire load, which makes the payload
//! write visible to it. That release/acquire pair is the only synchronisation
//! between the two sides.
//!
//! ```text
//! producer: write payload -> state.store(Ready, Release)
//! consumer: state.load(Acquire) == Ready -> read payload -> free node
//! ```

use std::alloc::Layout;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

use crate::alloc::NodeAllocator;
use crate::error::AllocationError;
use crate::sync::{AtomicPtr, AtomicU8, Ordering};

/// Publication state of a node.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Allocated, payload not yet visible.
    Unready = 0,
    /// Payload written and safe to read.
    Ready = 1,
}

impl State {
    #[inline]
    fn from_raw(raw: u8) -> State {
        if raw == State::Ready as u8 {
            State::Ready
        } else {
            State::Unready
        }
    }
}

pub(crate) struct Node<P> {
    state: AtomicU8,
    next: AtomicPtr<Node<P>>,
    payload: UnsafeCell<MaybeUninit<P>>,
}

impl<P> Node<P> {
    const LAYOUT: Layout = Layout::new::<Node<P>>();

    /// Allocates a node in the `Unready` state with no successor and no payload.
    pub(crate) fn allocate_unready<A: NodeAllocator>(
        alloc: &A,
    ) -> Result<NonNull<Node<P>>, AllocationError> {
        let node = match alloc.allocate(Self::LAYOUT) {
            Ok(raw) => raw.cast::<Node<P>>(),
            Err(err) => {
                tracing::debug!(size = Self::LAYOUT.size(), "node allocation failed");
                return Err(err);
            }
        };
        // SAFETY: the allocator handed us a fresh block sized and aligned for `Node<P>`.
        unsafe {
            node.as_ptr().write(Node {
                state: AtomicU8::new(State::Unready as u8),
                next: AtomicPtr::new(ptr::null_mut()),
                payload: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }
        Ok(node)
    }

    /// Writes `value` and makes it visible to the consumer.
    ///
    /// # Safety
    ///
    /// Only the producer may call this, at most once per node, and only while
    /// the node is `Unready`.
    #[inline]
    pub(crate) unsafe fn publish(&self, value: P) {
        debug_assert_eq!(self.state(), State::Unready, "node published twice");
        (*self.payload.get()).write(value);
        self.state.store(State::Ready as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == State::Ready as u8
    }

    #[inline]
    pub(crate) fn state(&self) -> State {
        State::from_raw(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn next(&self) -> *mut Node<P> {
        self.next.load(Ordering::Acquire)
    }

    /// Successor of a linked node.
    ///
    /// # Safety
    ///
    /// The node must be `Ready`, or otherwise already linked, and not retired.
    #[inline]
    pub(crate) unsafe fn successor(&self) -> NonNull<Node<P>> {
        // SAFETY: a node is linked to its successor before it is published.
        NonNull::new_unchecked(self.next())
    }

    #[inline]
    pub(crate) fn set_next(&self, next: NonNull<Node<P>>) {
        self.next.store(next.as_ptr(), Ordering::Release);
    }

    /// # Safety
    ///
    /// The node must be `Ready` and must not be retired while the reference lives.
    #[inline]
    pub(crate) unsafe fn payload(&self) -> &P {
        (*self.payload.get()).assume_init_ref()
    }

    /// # Safety
    ///
    /// The node must be `Ready` and the caller must be the only party reading
    /// or writing its payload for the lifetime of the reference.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn payload_mut(&self) -> &mut P {
        (*self.payload.get()).assume_init_mut()
    }

    /// Moves the payload out and frees the node.
    ///
    /// # Safety
    ///
    /// Consumer only. `node` must be `Ready`, unreachable from the chain, and
    /// allocated by `alloc`.
    pub(crate) unsafe fn take<A: NodeAllocator>(node: NonNull<Node<P>>, alloc: &A) -> P {
        let value = (*node.as_ref().payload.get()).assume_init_read();
        Self::release(node, alloc);
        value
    }

    /// Drops the payload in place and frees the node.
    ///
    /// # Safety
    ///
    /// Same contract as [`Node::take`].
    pub(crate) unsafe fn retire<A: NodeAllocator>(node: NonNull<Node<P>>, alloc: &A) {
        (*node.as_ref().payload.get()).assume_init_drop();
        Self::release(node, alloc);
    }

    /// Frees a node without touching its payload.
    ///
    /// # Safety
    ///
    /// The payload must be uninitialised or already moved out, no other
    /// reference to the node may survive, and it must come from `alloc`.
    pub(crate) unsafe fn release<A: NodeAllocator>(node: NonNull<Node<P>>, alloc: &A) {
        ptr::drop_in_place(node.as_ptr());
        alloc.deallocate(node.cast(), Self::LAYOUT);
    }
}
