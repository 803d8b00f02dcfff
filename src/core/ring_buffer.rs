//! Lock-Free Single-Producer Single-Consumer (SPSC) Ring Buffer
//!
//! Cursor selalu di range [0, N). Satu slot dikorbankan supaya
//! full dan empty bisa dibedakan tanpa counter tambahan:
//! - Empty: W == R
//! - Full:  (W + 1) mod N == R
//!
//! W hanya ditulis producer, R hanya ditulis consumer. Tidak ada Mutex.

use crate::core::SlotStorage;
use crate::error::QueueError;
use crate::sync::{fence, AtomicUsize, Ordering};

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Posisi kedua cursor pada satu titik waktu.
///
/// Semua predikat kondisi dihitung dari snapshot ini, bukan dari
/// load terpisah, supaya satu evaluasi selalu konsisten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSnapshot {
    pub write: usize,
    pub read: usize,
    pub capacity: usize,
}

impl CursorSnapshot {
    /// Slot terpakai: (W - R) mod N
    #[inline(always)]
    pub fn occupancy(&self) -> usize {
        if self.write >= self.read {
            self.write - self.read
        } else {
            self.capacity - self.read + self.write
        }
    }

    /// Slot bebas: N - occupancy (termasuk slot yang dikorbankan)
    #[inline(always)]
    pub fn free_space(&self) -> usize {
        self.capacity - self.occupancy()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.write == self.read
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        (self.write + 1) % self.capacity == self.read
    }

    /// occupancy / capacity, selalu di [0, 1)
    #[inline(always)]
    pub fn usage_ratio(&self) -> f64 {
        self.occupancy() as f64 / self.capacity as f64
    }
}

/// Lock-Free SPSC Ring Buffer
///
/// Menggunakan separate cache lines untuk write dan read cursor
/// untuk menghindari false sharing antara producer dan consumer.
#[repr(C)]
pub struct RingBuffer<P> {
    // Producer side - cache line aligned
    write: CacheLinePadded<AtomicUsize>,
    // Consumer side - cache line aligned
    read: CacheLinePadded<AtomicUsize>,
    // Pre-allocated storage - tidak ada alokasi setelah init
    storage: SlotStorage<P>,
    capacity: usize,
}

impl<P: Copy + Default> RingBuffer<P> {
    /// Membuat ring buffer dengan `capacity_bytes / size_of::<P>()` slot.
    ///
    /// Alokasi hanya terjadi sekali saat inisialisasi.
    pub fn new(capacity_bytes: usize, prefault: bool) -> Result<Self, QueueError> {
        let storage = SlotStorage::allocate(capacity_bytes, prefault)?;
        let capacity = storage.slots();

        let ring = Self {
            write: CacheLinePadded::new(AtomicUsize::new(0)),
            read: CacheLinePadded::new(AtomicUsize::new(0)),
            storage,
            capacity,
        };

        // Cursor dan isi slot harus visible sebelum ring dibagi ke thread lain
        fence(Ordering::SeqCst);

        Ok(ring)
    }
}

impl<P> RingBuffer<P> {
    /// Pasangan (W, R) yang konsisten.
    ///
    /// W dibaca ulang setelah R dan diulang kalau berubah; tanpa itu thread
    /// ketiga bisa melihat R yang sudah melewati W basi, dan occupancy
    /// terbaca hampir N. Dari thread producer W tidak pernah berubah, jadi
    /// cukup satu putaran.
    #[inline(always)]
    pub fn snapshot(&self) -> CursorSnapshot {
        let mut write = self.write.value.load(Ordering::Acquire);
        loop {
            let read = self.read.value.load(Ordering::Acquire);
            let recheck = self.write.value.load(Ordering::Acquire);
            if recheck == write {
                return CursorSnapshot {
                    write,
                    read,
                    capacity: self.capacity,
                };
            }
            write = recheck;
        }
    }

    /// Producer side: index slot di write cursor, atau `None` jika penuh.
    ///
    /// Cursor tidak digeser. Slot baru visible ke consumer setelah `publish`.
    #[inline(always)]
    pub fn reservable(&self) -> Option<usize> {
        let write = self.write.value.load(Ordering::Relaxed);
        let read = self.read.value.load(Ordering::Acquire);

        if (write + 1) % self.capacity == read {
            return None;
        }
        Some(write)
    }

    /// Producer side: geser write cursor melewati slot `index`.
    ///
    /// Release store memastikan isi slot visible sebelum cursor baru;
    /// fence SeqCst setelahnya mengurutkan store ini terhadap load
    /// interest flag berikutnya.
    #[inline(always)]
    pub fn publish(&self, index: usize) {
        let write = self.write.value.load(Ordering::Relaxed);
        debug_assert_eq!(index, write, "commit of a slot that is not at the write cursor");

        self.write
            .value
            .store((write + 1) % self.capacity, Ordering::Release);
        fence(Ordering::SeqCst);
    }

    /// Consumer side: index slot di read cursor, atau `None` jika kosong.
    #[inline(always)]
    pub fn readable(&self) -> Option<usize> {
        let read = self.read.value.load(Ordering::Relaxed);
        let write = self.write.value.load(Ordering::Acquire);

        if read == write {
            return None;
        }
        Some(read)
    }

    /// Consumer side: geser read cursor melewati slot `index`.
    ///
    /// Setelah store ini producer boleh menulis ulang slot tersebut.
    #[inline(always)]
    pub fn release(&self, index: usize) {
        let read = self.read.value.load(Ordering::Relaxed);
        debug_assert_eq!(index, read, "release of a slot that is not at the read cursor");

        self.read
            .value
            .store((read + 1) % self.capacity, Ordering::Release);
        fence(Ordering::SeqCst);
    }

    #[inline(always)]
    pub fn slot_ptr(&self, index: usize) -> *mut P {
        self.storage.slot_ptr(index)
    }

    #[inline(always)]
    pub fn storage(&self) -> &SlotStorage<P> {
        &self.storage
    }

    #[inline(always)]
    pub fn occupancy(&self) -> usize {
        self.snapshot().occupancy()
    }

    #[inline(always)]
    pub fn free_space(&self) -> usize {
        self.snapshot().free_space()
    }

    #[inline(always)]
    pub fn usage_ratio(&self) -> f64 {
        self.snapshot().usage_ratio()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.snapshot().is_full()
    }

    /// Kapasitas dalam slot (N); yang bisa dipakai N - 1
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
