//! Konfigurasi queue
//!
//! Semua nilai dibaca sekali saat `CommandQueue::with_config`.
//! Setelah itu tidak ada yang bisa diubah.

use std::mem;

/// Jumlah slot default (32K packet)
pub const DEFAULT_SLOTS: usize = 32 * 1024;

/// Ukuran packet referensi untuk menghitung `capacity_bytes` default
pub const DEFAULT_PACKET_SIZE: usize = 64;

/// AlmostEmpty terpenuhi jika occupancy <= nilai ini
pub const DEFAULT_ALMOST_EMPTY_THRESHOLD: usize = 10;

/// AllocOk terpenuhi jika free space >= nilai ini
pub const DEFAULT_ALLOC_OK_THRESHOLD: usize = 100;

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Ukuran backing storage dalam bytes
    pub capacity_bytes: usize,
    pub almost_empty_threshold: usize,
    pub alloc_ok_threshold: usize,
    /// Pre-fault seluruh mapping saat init (MAP_POPULATE di Linux)
    pub prefault: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_SLOTS * DEFAULT_PACKET_SIZE,
            almost_empty_threshold: DEFAULT_ALMOST_EMPTY_THRESHOLD,
            alloc_ok_threshold: DEFAULT_ALLOC_OK_THRESHOLD,
            prefault: false,
        }
    }
}

impl QueueConfig {
    /// Config dengan kapasitas tepat `slots` packet bertipe `P`.
    ///
    /// Overflow di-saturate ke `usize::MAX`, lalu ditolak saat alokasi
    /// sebagai `QueueError::CapacityOverflow`.
    pub fn with_slots<P>(slots: usize) -> Self {
        Self {
            capacity_bytes: slots.saturating_mul(mem::size_of::<P>()),
            ..Self::default()
        }
    }

    pub fn capacity_bytes(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    pub fn almost_empty_threshold(mut self, threshold: usize) -> Self {
        self.almost_empty_threshold = threshold;
        self
    }

    pub fn alloc_ok_threshold(mut self, threshold: usize) -> Self {
        self.alloc_ok_threshold = threshold;
        self
    }

    pub fn prefault(mut self, prefault: bool) -> Self {
        self.prefault = prefault;
        self
    }
}
