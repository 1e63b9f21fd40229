use std::alloc::Layout;

/// A node could not be allocated.
///
/// Returned by every operation that appends to a queue. The queue is left
/// exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to allocate a queue node of {} bytes", .layout.size())]
pub struct AllocationError {
    layout: Layout,
}

impl AllocationError {
    /// Reports that `layout` could not be satisfied. For use by
    /// [`NodeAllocator`](crate::NodeAllocator) implementations.
    pub const fn new(layout: Layout) -> Self {
        AllocationError { layout }
    }

    /// Layout of the node that could not be allocated.
    pub const fn layout(&self) -> Layout {
        self.layout
    }
}

/// The queue holds no published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("queue is empty")]
pub struct EmptyQueueError;
