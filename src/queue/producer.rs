use std::io;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::{Packet, Shared};
use crate::diag::{self, MemoryDump, Monitor};
use crate::sync::{Condition, Ordering};

/// Producer side: reserve lalu commit, hanya menyentuh write cursor.
pub struct Producer<P> {
    shared: Arc<Shared<P>>,
}

impl<P: Packet> Producer<P> {
    pub(super) fn new(shared: Arc<Shared<P>>) -> Self {
        Self { shared }
    }

    /// Reserve slot di write cursor tanpa menggeser cursor.
    ///
    /// Returns `None` jika queue penuh; producer harus drop packet,
    /// retry, atau `wait(Condition::AllocOk, ..)`.
    #[inline]
    pub fn reserve_slot(&mut self) -> Option<WriteSlot<'_, P>> {
        let Some(index) = self.shared.ring.reservable() else {
            trace!(
                occupancy = self.shared.ring.occupancy(),
                "reserve rejected: queue full"
            );
            return None;
        };

        self.shared.allocations.fetch_add(1, Ordering::Relaxed);

        Some(WriteSlot {
            producer: self,
            index,
        })
    }

    fn commit_slot(&mut self, index: usize) {
        self.shared.ring.publish(index);
        self.shared.conditions.after_commit();
    }

    /// Block sampai `condition` terpenuhi atau timeout. Lihat
    /// [`ConditionRegistry::wait`](crate::sync::ConditionRegistry::wait).
    pub fn wait(&mut self, condition: Condition, timeout: Duration) -> bool {
        self.shared.wait(condition, timeout)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.shared.ring.is_full()
    }

    #[inline]
    pub fn usage_ratio(&self) -> f64 {
        self.shared.ring.usage_ratio()
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    pub fn monitor(&self) -> Monitor<P> {
        Monitor::new(self.shared.clone())
    }

    /// Log kedua cursor dan slot di sekitarnya, lalu kirim seluruh
    /// storage ke `sink`.
    ///
    /// `&mut self` berarti tidak ada `WriteSlot` yang hidup: selama dump
    /// tidak ada slot yang sedang ditulis. Consumer boleh jalan terus.
    pub fn dump(&mut self, sink: &mut dyn MemoryDump) -> io::Result<()> {
        diag::dump_ring(&self.shared.ring, sink)
    }
}

/// Slot yang sudah di-reserve tapi belum visible ke consumer.
///
/// Drop tanpa `commit` membatalkan publikasi; reserve berikutnya
/// mendapat slot yang sama.
pub struct WriteSlot<'a, P: Packet> {
    producer: &'a mut Producer<P>,
    index: usize,
}

impl<'a, P: Packet> WriteSlot<'a, P> {
    /// Index slot di ring (identitas packet)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Publish packet: geser write cursor dan bangunkan waiter NonEmpty.
    pub fn commit(self) {
        let index = self.index;
        self.producer.commit_slot(index);
    }
}

impl<'a, P: Packet> Deref for WriteSlot<'a, P> {
    type Target = P;

    fn deref(&self) -> &P {
        // SAFETY: slot di write cursor bukan milik consumer sampai commit,
        // dan `&mut Producer` menjamin hanya ada satu WriteSlot
        unsafe { &*self.producer.shared.ring.slot_ptr(self.index) }
    }
}

impl<'a, P: Packet> DerefMut for WriteSlot<'a, P> {
    fn deref_mut(&mut self) -> &mut P {
        // SAFETY: lihat `deref`
        unsafe { &mut *self.producer.shared.ring.slot_ptr(self.index) }
    }
}
