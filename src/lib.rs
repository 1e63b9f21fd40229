//! spsc_chain - lock-free single-producer/single-consumer queues
//!
//! Both queues are a singly linked chain of nodes. Each node carries a
//! two-state flag, `Unready` then `Ready`, which the producer flips with a
//! release store after writing the payload and the consumer checks with an
//! acquire load before reading it. That flag is the only synchronisation: no
//! locks, no compare-and-swap, no spinning inside the queue.
//!
//! The chain always ends in an `Unready` placeholder, so the producer appends
//! in O(1) without ever racing the consumer on a null link, and the queue is
//! empty exactly when its head is that placeholder. Only the consumer frees
//! nodes, and only nodes it has consumed.
//!
//! - [`SpscQueue`] owns its values and behaves like a sequential container
//!   (push, take, peek, iterate, clear, copy).
//! - [`waitfree::WaitFreeQueue`] carries pointers to caller-owned values and
//!   nothing else.
//!
//! Each splits into a producer half and a consumer half for use on two
//! threads. The halves are not `Clone` and their role methods take
//! `&mut self`, so a second producer or consumer cannot exist.
//!
//! ```
//! use spsc_chain::SpscQueue;
//! use std::thread;
//!
//! let (mut tx, mut rx) = SpscQueue::new().into_split();
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..100 {
//!         tx.push_back(i).unwrap();
//!     }
//! });
//!
//! let mut received = Vec::new();
//! while received.len() < 100 {
//!     match rx.take_front() {
//!         Ok(value) => received.push(value),
//!         Err(_) => std::hint::spin_loop(),
//!     }
//! }
//! producer.join().unwrap();
//! assert_eq!(received, (0..100).collect::<Vec<_>>());
//! ```
#![warn(missing_docs)]

pub mod alloc;
mod chain;
mod error;
mod iter;
mod node;
mod queue;
mod sync;
pub mod waitfree;

pub use crate::alloc::{Global, NodeAllocator};
pub use error::{AllocationError, EmptyQueueError};
pub use iter::{Cursor, Iter};
pub use queue::{Consumer, Producer, SpscQueue};
