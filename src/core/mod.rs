//! Core module: Ring Store dengan Mmap backing
//!
//! Prinsip desain:
//! - Lock-Free: Cursor hanya atomic, tidak ada Mutex/RwLock
//! - No-Allocation: Semua slot pre-allocated saat init
//! - In-Place: Packet tidak pernah di-copy, di-move, atau di-free per slot

mod ring_buffer;
mod slot_storage;

pub use ring_buffer::{CursorSnapshot, RingBuffer};
pub use slot_storage::{SlotStorage, MIN_SLOTS};
