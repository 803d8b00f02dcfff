//! # cmdring - Lock-Free SPSC Command Queue
//!
//! Queue untuk mengirim packet fixed-size dari satu thread (misalnya game
//! logic) ke thread lain (misalnya renderer) tanpa lock di hot path.
//!
//! Arsitektur:
//! - Ring Store: mmap-backed slot array + dua atomic cursor
//! - Two-Phase Publish: `reserve_slot` lalu `commit`, isi slot ditulis in-place
//! - Waitable Conditions: NonEmpty, Empty, AlmostEmpty, AllocOk
//!
//! ## Producer dan Consumer
//!
//! ```rust
//! use cmdring::{CommandQueue, Condition};
//! use std::time::Duration;
//!
//! let queue = CommandQueue::<[u32; 4]>::new(64 * 1024)?;
//! let (mut producer, mut consumer) = queue.split();
//!
//! if let Some(mut slot) = producer.reserve_slot() {
//!     *slot = [1, 2, 3, 4];
//!     slot.commit();
//! }
//!
//! if consumer.wait(Condition::NonEmpty, Duration::from_millis(10)) {
//!     while let Some(packet) = consumer.dequeue() {
//!         assert_eq!(*packet, [1, 2, 3, 4]);
//!         // Slot dilepas saat `packet` di-drop
//!     }
//! }
//! # Ok::<(), cmdring::QueueError>(())
//! ```
//!
//! ## Backpressure
//!
//! Queue penuh bukan error. Producer memilih sendiri: drop packet,
//! retry, atau tunggu sampai cukup slot bebas:
//!
//! ```rust
//! # use cmdring::{CommandQueue, Condition, QueueConfig};
//! # use std::time::Duration;
//! # let config = QueueConfig::with_slots::<u64>(256);
//! # let (mut producer, _consumer) = CommandQueue::<u64>::with_config(&config)?.split();
//! if producer.is_full() && !producer.wait(Condition::AllocOk, Duration::from_millis(5)) {
//!     // Masih penuh setelah timeout: drop packet
//! } else if let Some(mut slot) = producer.reserve_slot() {
//!     *slot = 7;
//!     slot.commit();
//! }
//! # Ok::<(), cmdring::QueueError>(())
//! ```
//!
//! ## Kontrak Wait
//!
//! Maksimal satu thread menunggu satu kondisi pada satu waktu. Secara
//! natural consumer menunggu `NonEmpty`, producer menunggu `Empty`,
//! `AlmostEmpty`, atau `AllocOk`.

pub mod config;
pub mod core;
pub mod diag;
pub mod error;
#[cfg(all(test, feature = "loom"))]
pub(crate) mod loom;
pub mod queue;
pub mod sync;

pub use config::QueueConfig;
pub use diag::{HexDump, MemoryDump, Monitor};
pub use error::QueueError;
pub use queue::{CommandQueue, Consumer, Packet, Producer, ReadSlot, WriteSlot};
pub use sync::Condition;
