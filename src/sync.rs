//! Synchronisation primitives used by the chain, swapped for `loom`'s
//! model-checked versions when built with `RUSTFLAGS="--cfg loom"`.

#[cfg(not(loom))]
pub(crate) use std::sync::{
    atomic::{AtomicPtr, AtomicU8, Ordering},
    Arc,
};

#[cfg(loom)]
pub(crate) use loom::sync::{
    atomic::{AtomicPtr, AtomicU8, Ordering},
    Arc,
};
