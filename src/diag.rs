//! Diagnostics: usage, allocation counter, dan raw dump untuk forensik
//!
//! Tidak ada yang di sini dipanggil dari hot path kecuali counter.

use std::fmt;
use std::io::{self, Write};
use std::mem;
use std::sync::Arc;

use tracing::{error, warn};

use crate::core::{CursorSnapshot, RingBuffer};
use crate::queue::{Packet, Shared};
use crate::sync::Ordering;

/// Bytes per chunk yang diserahkan ke `MemoryDump`
const DUMP_CHUNK: usize = 256;

/// Tujuan raw memory dump.
///
/// Dipanggil berurutan per chunk dari offset 0 sampai akhir storage.
pub trait MemoryDump {
    fn dump(&mut self, offset: usize, bytes: &[u8]) -> io::Result<()>;
}

/// Hex dump 16 bytes per baris ke `Write` apa pun
pub struct HexDump<W> {
    out: W,
}

impl<W: Write> HexDump<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MemoryDump for HexDump<W> {
    fn dump(&mut self, offset: usize, bytes: &[u8]) -> io::Result<()> {
        for (i, line) in bytes.chunks(16).enumerate() {
            write!(self.out, "{:08x}:", offset + i * 16)?;
            for byte in line {
                write!(self.out, " {:02x}", byte)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

/// Read-only view ke queue, boleh di-clone dan dipakai dari thread mana pun.
///
/// Angka dari monitor adalah snapshot: W dan R dibaca sebagai pasangan yang
/// konsisten, tapi bisa sudah basi saat dipakai. Isi slot tidak bisa dibaca
/// dari sini, lihat [`Producer::dump`](crate::Producer::dump).
pub struct Monitor<P> {
    shared: Arc<Shared<P>>,
}

impl<P> Clone for Monitor<P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<P> Monitor<P> {
    pub(crate) fn new(shared: Arc<Shared<P>>) -> Self {
        Self { shared }
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        self.shared.ring.snapshot()
    }

    pub fn occupancy(&self) -> usize {
        self.shared.ring.occupancy()
    }

    pub fn free_space(&self) -> usize {
        self.shared.ring.free_space()
    }

    /// occupancy / capacity di [0, 1), untuk keputusan load-shedding
    pub fn usage_ratio(&self) -> f64 {
        self.shared.ring.usage_ratio()
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    /// Jumlah `reserve_slot` yang berhasil sejak reset terakhir
    pub fn allocation_count(&self) -> usize {
        self.shared.allocation_count()
    }

    pub fn reset_allocation_count(&self) {
        self.shared.allocations.store(0, Ordering::Relaxed);
    }
}

impl<P> fmt::Debug for Monitor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("Monitor")
            .field("write", &snap.write)
            .field("read", &snap.read)
            .field("capacity", &snap.capacity)
            .field("allocations", &self.allocation_count())
            .finish()
    }
}

// Semua fungsi di bawah membaca isi slot. Caller menjamin slot yang dibaca
// tidak sedang ditulis producer.

fn slot_hex<P: Packet>(ring: &RingBuffer<P>, index: usize) -> String {
    let packet = ring.storage().read_volatile(index);
    bytemuck::bytes_of(&packet)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Kirim slot `indices` ke `sink`. Slot yang bersebelahan digabung
/// sampai `DUMP_CHUNK` bytes; offset adalah posisi byte di storage.
fn dump_slots<P: Packet>(
    ring: &RingBuffer<P>,
    indices: impl Iterator<Item = usize>,
    sink: &mut dyn MemoryDump,
) -> io::Result<usize> {
    let size = mem::size_of::<P>();
    let mut chunk: Vec<u8> = Vec::with_capacity(DUMP_CHUNK.max(size));
    let mut start = 0;
    let mut total = 0;

    for index in indices {
        let offset = index * size;
        if !chunk.is_empty() && (start + chunk.len() != offset || chunk.len() + size > DUMP_CHUNK)
        {
            sink.dump(start, &chunk)?;
            chunk.clear();
        }
        if chunk.is_empty() {
            start = offset;
        }

        let packet = ring.storage().read_volatile(index);
        chunk.extend_from_slice(bytemuck::bytes_of(&packet));
        total += size;
    }

    if !chunk.is_empty() {
        sink.dump(start, &chunk)?;
    }
    Ok(total)
}

/// Full dump: kedua cursor, slot di W dan R, lalu seluruh storage.
///
/// Hanya aman saat tidak ada `WriteSlot` yang hidup.
pub(crate) fn dump_ring<P: Packet>(
    ring: &RingBuffer<P>,
    sink: &mut dyn MemoryDump,
) -> io::Result<()> {
    let snap = ring.snapshot();

    warn!(write = snap.write, read = snap.read, "queue dump");
    warn!(
        slot_w = %slot_hex(ring, snap.write),
        slot_r = %slot_hex(ring, snap.read),
        "queue dump bordering slots"
    );

    let bytes = dump_slots(ring, 0..ring.capacity(), sink)?;

    warn!(bytes, "queue dump done");
    Ok(())
}

/// Unrecoverable: dump ring ke stderr lalu panic.
///
/// Dipanggil dari dalam `wait` milik producer atau consumer. Slot di W bisa
/// sedang ditulis producer, jadi yang di-dump hanya window `[R, W)` yang
/// sudah publish dan belum di-release.
pub(crate) fn fatal<P: Packet>(ring: &RingBuffer<P>, message: fmt::Arguments<'_>) -> ! {
    error!("{}", message);

    let snap = ring.snapshot();
    error!(
        write = snap.write,
        read = snap.read,
        occupancy = snap.occupancy(),
        "queue state"
    );
    if !snap.is_empty() {
        error!(slot_r = %slot_hex(ring, snap.read), "oldest published slot");
    }

    let mut sink = HexDump::new(io::stderr().lock());
    let window = (0..snap.occupancy()).map(|i| (snap.read + i) % snap.capacity);
    if let Err(e) = dump_slots(ring, window, &mut sink) {
        error!(error = %e, "queue dump failed");
    }
    panic!("{}", message);
}

/// Pelanggaran kontrak caller. Fatal dengan feature `diagnostic`,
/// selain itu hanya di-log.
pub(crate) fn misuse<P: Packet>(ring: &RingBuffer<P>, message: fmt::Arguments<'_>) {
    if cfg!(feature = "diagnostic") {
        fatal(ring, message);
    }
    warn!("{}", message);
}
