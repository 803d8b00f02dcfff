use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use super::{Packet, Shared};
use crate::diag::Monitor;
use crate::sync::Condition;

/// Consumer side: peek lalu consume, hanya menyentuh read cursor.
pub struct Consumer<P> {
    shared: Arc<Shared<P>>,
}

impl<P: Packet> Consumer<P> {
    pub(super) fn new(shared: Arc<Shared<P>>) -> Self {
        Self { shared }
    }

    /// Non-blocking check: W != R
    #[inline]
    pub fn has_ready_packet(&self) -> bool {
        !self.shared.ring.is_empty()
    }

    /// Ambil packet tertua, atau `None` jika queue kosong.
    ///
    /// Read cursor digeser saat `ReadSlot` di-drop, bukan sekarang:
    /// selama guard hidup producer tidak bisa menimpa slot ini.
    #[inline]
    pub fn dequeue(&mut self) -> Option<ReadSlot<'_, P>> {
        let index = self.shared.ring.readable()?;
        Some(ReadSlot {
            consumer: self,
            index,
        })
    }

    fn release_slot(&mut self, index: usize) {
        let ring = &self.shared.ring;
        ring.release(index);
        self.shared.conditions.after_release(&ring.snapshot());
    }

    /// Block sampai `condition` terpenuhi atau timeout.
    pub fn wait(&mut self, condition: Condition, timeout: Duration) -> bool {
        self.shared.wait(condition, timeout)
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
}

/// Packet yang sedang dibaca consumer. Slot dilepas saat drop.
pub struct ReadSlot<'a, P: Packet> {
    consumer: &'a mut Consumer<P>,
    index: usize,
}

impl<'a, P: Packet> ReadSlot<'a, P> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<'a, P: Packet> Deref for ReadSlot<'a, P> {
    type Target = P;

    fn deref(&self) -> &P {
        // SAFETY: slot di read cursor sudah di-publish (Acquire pada W)
        // dan producer tidak menulisnya sampai R digeser di Drop
        unsafe { &*self.consumer.shared.ring.slot_ptr(self.index) }
    }
}

impl<'a, P: Packet> Drop for ReadSlot<'a, P> {
    fn drop(&mut self) {
        self.consumer.release_slot(self.index);
    }
}
