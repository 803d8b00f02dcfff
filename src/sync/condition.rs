//! Condition Registry - empat kondisi yang bisa ditunggu
//!
//! Setiap kondisi = satu `OneshotEvent` + satu interest flag.
//! Waiter set flag sebelum block; siapa pun yang melihat kondisi
//! terpenuhi (producer, consumer, atau waiter lain saat self-check)
//! meng-clear flag dengan `swap` lalu fire event. Karena clear selalu
//! lewat `swap(false)`, setiap signal di-fire tepat satu kali.
//!
//! Kontrak: maksimal satu waiter per kondisi pada satu waktu.

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use super::{fence, AtomicBool, Ordering, OneshotEvent};
use crate::core::{CursorSnapshot, RingBuffer};
use crate::queue::Packet;

/// Kondisi yang bisa ditunggu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Queue berisi minimal satu packet (W != R)
    NonEmpty,
    /// Queue kosong (W == R)
    Empty,
    /// Occupancy <= almost-empty threshold
    AlmostEmpty,
    /// Free space >= alloc-ok threshold
    AllocOk,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::NonEmpty,
        Condition::Empty,
        Condition::AlmostEmpty,
        Condition::AllocOk,
    ];

    #[inline(always)]
    const fn index(self) -> usize {
        match self {
            Condition::NonEmpty => 0,
            Condition::Empty => 1,
            Condition::AlmostEmpty => 2,
            Condition::AllocOk => 3,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::NonEmpty => "non-empty",
            Condition::Empty => "empty",
            Condition::AlmostEmpty => "almost-empty",
            Condition::AllocOk => "alloc-ok",
        };
        f.write_str(name)
    }
}

struct Waitable {
    interest: AtomicBool,
    event: OneshotEvent,
}

impl Waitable {
    fn new() -> Self {
        Self {
            interest: AtomicBool::new(false),
            event: OneshotEvent::new(),
        }
    }
}

pub struct ConditionRegistry {
    waitables: [Waitable; 4],
    almost_empty_threshold: usize,
    alloc_ok_threshold: usize,
}

impl ConditionRegistry {
    pub fn new(almost_empty_threshold: usize, alloc_ok_threshold: usize) -> Self {
        Self {
            waitables: [
                Waitable::new(),
                Waitable::new(),
                Waitable::new(),
                Waitable::new(),
            ],
            almost_empty_threshold,
            alloc_ok_threshold,
        }
    }

    /// Predikat kondisi terhadap satu snapshot cursor
    #[inline(always)]
    pub fn holds(&self, condition: Condition, snap: &CursorSnapshot) -> bool {
        match condition {
            Condition::NonEmpty => !snap.is_empty(),
            Condition::Empty => snap.is_empty(),
            Condition::AlmostEmpty => snap.occupancy() <= self.almost_empty_threshold,
            Condition::AllocOk => snap.free_space() >= self.alloc_ok_threshold,
        }
    }

    #[inline(always)]
    pub fn is_waiting(&self, condition: Condition) -> bool {
        self.waitables[condition.index()]
            .interest
            .load(Ordering::SeqCst)
    }

    /// Claim interest flag dan fire event. Returns `true` jika ada waiter.
    #[inline(always)]
    fn notify(&self, condition: Condition) -> bool {
        let waitable = &self.waitables[condition.index()];
        if waitable.interest.swap(false, Ordering::SeqCst) {
            trace!(%condition, "signal");
            waitable.event.signal();
            return true;
        }
        false
    }

    /// Fire `condition` hanya jika ada waiter dan predikatnya terpenuhi
    #[inline(always)]
    fn notify_if_holds(&self, condition: Condition, snap: &CursorSnapshot) -> bool {
        self.is_waiting(condition) && self.holds(condition, snap) && self.notify(condition)
    }

    /// Dipanggil setelah producer menggeser W.
    ///
    /// Produksi hanya bisa membuat queue lebih penuh, jadi hanya
    /// NonEmpty yang mungkin baru terpenuhi.
    #[inline(always)]
    pub fn after_commit(&self) {
        if self.is_waiting(Condition::NonEmpty) {
            self.notify(Condition::NonEmpty);
        }
    }

    /// Dipanggil setelah consumer menggeser R.
    ///
    /// Rantai either/or: kondisi pertama yang punya waiter yang dievaluasi.
    /// Ketiganya ditunggu oleh thread producer, jadi paling banyak satu
    /// yang terdaftar pada satu waktu.
    #[inline(always)]
    pub fn after_release(&self, snap: &CursorSnapshot) {
        if self.is_waiting(Condition::Empty) {
            self.notify_if_holds(Condition::Empty, snap);
        } else if self.is_waiting(Condition::AlmostEmpty) {
            self.notify_if_holds(Condition::AlmostEmpty, snap);
        } else if self.is_waiting(Condition::AllocOk) {
            self.notify_if_holds(Condition::AllocOk, snap);
        }
    }

    /// Self-wakeup pass: evaluasi ulang keempat kondisi dan bangunkan
    /// setiap waiter yang kondisinya sudah terpenuhi.
    pub fn wake_sleepers(&self, snap: &CursorSnapshot) -> usize {
        Condition::ALL
            .iter()
            .filter(|&&condition| self.notify_if_holds(condition, snap))
            .count()
    }

    /// Block sampai `condition` terpenuhi atau `timeout` habis.
    ///
    /// Returns `true` jika dibangunkan, `false` jika timeout. Setelah
    /// return, interest flag selalu bersih dan tidak ada signal yang
    /// tertinggal di event.
    pub fn wait<P: Packet>(
        &self,
        condition: Condition,
        ring: &RingBuffer<P>,
        timeout: Duration,
    ) -> bool {
        let waitable = &self.waitables[condition.index()];

        if waitable.interest.swap(true, Ordering::SeqCst) {
            crate::diag::misuse(
                ring,
                format_args!("second concurrent waiter on {condition} condition"),
            );
        }

        // Flag harus visible sebelum self-check membaca cursor
        fence(Ordering::SeqCst);

        // Tanpa pass ini, kondisi yang terpenuhi di antara cek terakhir
        // caller dan set flag di atas tidak akan pernah membangunkan kita
        self.wake_sleepers(&ring.snapshot());

        if waitable.event.wait(timeout) {
            return true;
        }

        let woken = self.withdraw(condition);
        if !woken {
            debug!(%condition, ?timeout, "wait timed out");
        }
        woken
    }

    /// Cabut interest setelah timeout.
    ///
    /// Jika flag ternyata sudah di-clear, notifier sudah claim wakeup dan
    /// signal-nya pasti datang: konsumsi signal itu dan return `true`.
    fn withdraw(&self, condition: Condition) -> bool {
        let waitable = &self.waitables[condition.index()];
        if waitable.interest.swap(false, Ordering::SeqCst) {
            return false;
        }
        waitable.event.wait(Duration::MAX)
    }
}
