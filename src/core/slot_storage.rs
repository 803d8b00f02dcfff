//! Slot Storage - backing memory untuk ring buffer
//!
//! Storage adalah anonymous mmap yang dialokasikan sekali saat init:
//! - Page-aligned: setiap slot otomatis ter-align untuk tipe packet
//! - Tidak pernah di-free per slot, hanya saat storage di-drop
//! - Slot dipakai ulang in-place, tidak ada copy atau move

use std::io;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use memmap2::{MmapMut, MmapOptions};

use crate::error::QueueError;

/// Minimal slot: satu slot selalu dikorbankan untuk membedakan full dan empty
pub const MIN_SLOTS: usize = 2;

/// Alignment minimum yang dijamin oleh mmap (satu page)
const MAP_ALIGN: usize = 4096;

/// Fixed-capacity array of packet slots backed by an anonymous mapping.
pub struct SlotStorage<P> {
    // Mapping harus tetap hidup selama `base` dipakai
    _mmap: MmapMut,
    base: NonNull<P>,
    slots: usize,
    _marker: PhantomData<P>,
}

// SAFETY: Storage hanya memberi raw pointer. Aturan siapa boleh menulis
// slot mana ditegakkan oleh cursor di RingBuffer (SPSC).
unsafe impl<P: Send> Send for SlotStorage<P> {}
unsafe impl<P: Send> Sync for SlotStorage<P> {}

impl<P: Copy + Default> SlotStorage<P> {
    /// Alokasi storage untuk `capacity_bytes / size_of::<P>()` slot.
    ///
    /// Setiap slot diisi `P::default()` supaya `&mut P` yang diberikan ke
    /// producer selalu menunjuk nilai yang valid.
    pub fn allocate(capacity_bytes: usize, prefault: bool) -> Result<Self, QueueError> {
        let packet_size = mem::size_of::<P>();
        if packet_size == 0 {
            return Err(QueueError::ZeroSizedPacket);
        }

        let align = mem::align_of::<P>();
        if align > MAP_ALIGN {
            return Err(QueueError::UnsupportedAlignment { align });
        }

        let slots = capacity_bytes / packet_size;
        if slots < MIN_SLOTS {
            return Err(QueueError::CapacityTooSmall {
                capacity_bytes,
                packet_size,
            });
        }

        // slots * packet_size <= capacity_bytes, tidak bisa overflow
        let len = slots * packet_size;
        if len > isize::MAX as usize {
            return Err(QueueError::CapacityOverflow { capacity_bytes });
        }

        let mut options = MmapOptions::new();
        options.len(len);
        if prefault {
            options.populate();
        }
        let mut mmap = options.map_anon()?;

        let base = NonNull::new(mmap.as_mut_ptr() as *mut P).ok_or_else(|| {
            QueueError::Allocation(io::Error::new(
                io::ErrorKind::Other,
                "anonymous mapping returned null",
            ))
        })?;

        for i in 0..slots {
            // SAFETY: i < slots, region berukuran slots * size_of::<P>()
            // dan base ter-align page
            unsafe { base.as_ptr().add(i).write(P::default()) };
        }

        Ok(Self {
            _mmap: mmap,
            base,
            slots,
            _marker: PhantomData,
        })
    }
}

impl<P> SlotStorage<P> {
    /// Jumlah slot (N)
    #[inline(always)]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Ukuran region dalam bytes
    #[inline(always)]
    pub fn byte_len(&self) -> usize {
        self.slots * mem::size_of::<P>()
    }

    /// Pointer ke slot `index`.
    ///
    /// # Panics
    /// Panic jika `index >= slots`
    #[inline(always)]
    pub fn slot_ptr(&self, index: usize) -> *mut P {
        assert!(index < self.slots, "slot index out of range");
        // SAFETY: index sudah di-cek terhadap jumlah slot
        unsafe { self.base.as_ptr().add(index) }
    }

    /// Volatile snapshot dari satu slot (forensik).
    ///
    /// Caller menjamin tidak ada yang sedang menulis slot ini.
    pub fn read_volatile(&self, index: usize) -> P
    where
        P: Copy,
    {
        // SAFETY: slot_ptr memvalidasi index, semua slot sudah di-init
        unsafe { ptr::read_volatile(self.slot_ptr(index)) }
    }
}
