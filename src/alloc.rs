//! Pluggable node allocation.
//!
//! Queues never call the global allocator directly. Every node goes through a
//! [`NodeAllocator`], which lets callers bound memory, count allocations or
//! inject failures. The producer side is the only caller of
//! [`allocate`](NodeAllocator::allocate) and the consumer side the only caller
//! of [`deallocate`](NodeAllocator::deallocate), but the two may run on
//! different threads at the same time, so implementations take `&self`.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocationError;

/// Source of node memory for a queue.
///
/// # Safety
///
/// `allocate` must return memory that is valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not aliased by any
/// other live allocation. The memory must stay valid until it is passed back
/// to `deallocate` on the same allocator (or a clone of it).
pub unsafe trait NodeAllocator {
    /// Obtain a block for one node.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError>;

    /// Return a block obtained from [`allocate`](NodeAllocator::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator with the
    /// same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: NodeAllocator + ?Sized> NodeAllocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}

/// The process-wide Rust allocator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

unsafe impl NodeAllocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
        debug_assert!(layout.size() > 0);
        // SAFETY: nodes always contain at least the state byte and a link.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocationError::new(layout))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }
}
