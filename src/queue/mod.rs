//! Command Queue: RingBuffer + ConditionRegistry dalam satu objek
//!
//! Tidak ada global state. Queue dibuat eksplisit lalu di-`split` menjadi
//! tepat satu `Producer` dan satu `Consumer`, masing-masing dipindah ke
//! thread-nya sendiri.

mod consumer;
mod producer;

pub use consumer::{Consumer, ReadSlot};
pub use producer::{Producer, WriteSlot};

use std::sync::Arc;
use std::time::Duration;

use bytemuck::NoUninit;
use tracing::debug;

use crate::config::QueueConfig;
use crate::core::RingBuffer;
use crate::diag::Monitor;
use crate::error::QueueError;
use crate::sync::{AtomicUsize, Condition, ConditionRegistry, Ordering};

/// Packet yang bisa diangkut queue: fixed-size, plain data tanpa padding.
///
/// `NoUninit` (sudah termasuk `Copy + 'static`) menjamin setiap slot bisa
/// dibaca sebagai bytes untuk dump. Struct sendiri cukup
/// `#[derive(NoUninit)]` dengan `#[repr(C)]`.
pub trait Packet: NoUninit + Default + Send {}

impl<T: NoUninit + Default + Send> Packet for T {}

/// State yang dibagi producer, consumer, dan monitor
pub(crate) struct Shared<P> {
    pub(crate) ring: RingBuffer<P>,
    pub(crate) conditions: ConditionRegistry,
    pub(crate) allocations: AtomicUsize,
}

impl<P: Packet> Shared<P> {
    pub(crate) fn wait(&self, condition: Condition, timeout: Duration) -> bool {
        self.conditions.wait(condition, &self.ring, timeout)
    }
}

impl<P> Shared<P> {
    pub(crate) fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }
}

/// Single-producer single-consumer command queue.
pub struct CommandQueue<P> {
    shared: Arc<Shared<P>>,
}

impl<P: Packet> CommandQueue<P> {
    /// Membuat queue dengan threshold default
    pub fn new(capacity_bytes: usize) -> Result<Self, QueueError> {
        Self::with_config(&QueueConfig::default().capacity_bytes(capacity_bytes))
    }

    pub fn with_config(config: &QueueConfig) -> Result<Self, QueueError> {
        let ring = RingBuffer::new(config.capacity_bytes, config.prefault)?;

        // Ring kecil tetap valid, AllocOk saja yang tidak pernah terpenuhi
        if config.alloc_ok_threshold > ring.capacity() {
            debug!(
                threshold = config.alloc_ok_threshold,
                slots = ring.capacity(),
                "alloc-ok threshold unreachable, wait(AllocOk) will only time out"
            );
        }

        debug!(
            slots = ring.capacity(),
            packet_size = std::mem::size_of::<P>(),
            almost_empty = config.almost_empty_threshold,
            alloc_ok = config.alloc_ok_threshold,
            "command queue created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                ring,
                conditions: ConditionRegistry::new(
                    config.almost_empty_threshold,
                    config.alloc_ok_threshold,
                ),
                allocations: AtomicUsize::new(0),
            }),
        })
    }

    /// Pecah queue menjadi satu producer dan satu consumer.
    pub fn split(self) -> (Producer<P>, Consumer<P>) {
        (
            Producer::new(self.shared.clone()),
            Consumer::new(self.shared),
        )
    }

    pub fn monitor(&self) -> Monitor<P> {
        Monitor::new(self.shared.clone())
    }

    /// Kapasitas dalam slot (N)
    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }
}
