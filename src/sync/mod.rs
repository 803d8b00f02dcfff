//! Sync primitives: oneshot event + condition registry
//!
//! Atomics di-re-export dari sini supaya model checker (loom) bisa
//! menggantikan std tanpa mengubah kode ring buffer.

mod condition;
mod event;

pub use condition::{Condition, ConditionRegistry};
pub use event::OneshotEvent;

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering};
