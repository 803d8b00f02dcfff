//! Queue Stress Test - producer dan consumer di thread terpisah
//!
//! Simulasi game-logic thread yang mengirim draw command ke render thread,
//! plus skenario wakeup untuk keempat kondisi.
//!
//! Usage:
//!   cargo test --release --test queue_stress_test -- --nocapture

#![cfg(not(feature = "loom"))]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytemuck::NoUninit;
use cmdring::{CommandQueue, Condition, Consumer, Producer, QueueConfig};

/// Draw command packet (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, NoUninit)]
struct DrawCommand {
    sequence: u64,
    opcode: u32,
    texture_id: u32,
    x: f32,
    y: f32,
    checksum: u64,
}

impl DrawCommand {
    fn new(sequence: u64) -> Self {
        let mut hash = sequence;
        for _ in 0..4 {
            hash = hash.wrapping_mul(6364136223846793005).wrapping_add(1);
        }

        let opcode = (hash % 16) as u32;
        let texture_id = (hash >> 32) as u32;
        Self {
            sequence,
            opcode,
            texture_id,
            x: (hash % 1920) as f32,
            y: ((hash >> 16) % 1080) as f32,
            checksum: sequence ^ opcode as u64 ^ texture_id as u64,
        }
    }

    fn is_valid(&self) -> bool {
        self.checksum == self.sequence ^ self.opcode as u64 ^ self.texture_id as u64
    }
}

fn queue(slots: usize, alloc_ok: usize) -> (Producer<DrawCommand>, Consumer<DrawCommand>) {
    let config = QueueConfig::with_slots::<DrawCommand>(slots).alloc_ok_threshold(alloc_ok);
    CommandQueue::with_config(&config).unwrap().split()
}

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_spsc_ordered_transfer() {
    const PACKETS: u64 = 200_000;
    let (mut producer, mut consumer) = queue(1024, 100);

    let start = Instant::now();

    let producer_handle = thread::spawn(move || {
        let mut dropped_attempts = 0u64;
        for seq in 0..PACKETS {
            loop {
                if let Some(mut slot) = producer.reserve_slot() {
                    *slot = DrawCommand::new(seq);
                    slot.commit();
                    break;
                }
                dropped_attempts += 1;
                producer.wait(Condition::AllocOk, Duration::from_millis(50));
            }
        }
        dropped_attempts
    });

    let mut expected = 0u64;
    while expected < PACKETS {
        // Copy keluar supaya borrow `consumer` selesai sebelum `wait`
        match consumer.dequeue().map(|cmd| *cmd) {
            Some(cmd) => {
                assert!(cmd.is_valid(), "torn packet at {}", expected);
                assert_eq!(cmd.sequence, expected);
                expected += 1;
            }
            None => {
                consumer.wait(Condition::NonEmpty, Duration::from_millis(50));
            }
        }
    }

    let full_hits = producer_handle.join().unwrap();
    let elapsed = start.elapsed();

    assert!(!consumer.has_ready_packet());
    println!(
        "  {} packets in {:.2} ms ({:.2} M/sec), producer hit full {} times",
        PACKETS,
        elapsed.as_secs_f64() * 1000.0,
        PACKETS as f64 / elapsed.as_secs_f64() / 1_000_000.0,
        full_hits
    );
}

#[test]
fn test_non_empty_wait_wakes_on_commit() {
    let (mut producer, mut consumer) = queue(128, 100);

    let producer_handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        let mut slot = producer.reserve_slot().unwrap();
        *slot = DrawCommand::new(7);
        slot.commit();
        producer
    });

    let start = Instant::now();
    assert!(consumer.wait(Condition::NonEmpty, WAIT));
    assert!(start.elapsed() < WAIT);
    assert!(consumer.has_ready_packet());
    assert_eq!(consumer.dequeue().map(|cmd| cmd.sequence), Some(7));

    producer_handle.join().unwrap();
}

#[test]
fn test_non_empty_wait_racing_commit() {
    // Commit lands right around the moment the consumer registers interest
    for round in 0..200u64 {
        let (mut producer, mut consumer) = queue(16, 10);

        let producer_handle = thread::spawn(move || {
            let mut slot = producer.reserve_slot().unwrap();
            *slot = DrawCommand::new(round);
            slot.commit();
        });

        assert!(consumer.wait(Condition::NonEmpty, WAIT), "round {}", round);
        assert_eq!(consumer.dequeue().map(|cmd| cmd.sequence), Some(round));
        producer_handle.join().unwrap();
    }
}

#[test]
fn test_empty_wait_wakes_after_drain() {
    let (mut producer, mut consumer) = queue(4, 2);

    for seq in 0..3 {
        let mut slot = producer.reserve_slot().unwrap();
        *slot = DrawCommand::new(seq);
        slot.commit();
    }
    assert!(producer.reserve_slot().is_none());

    let consumer_handle = thread::spawn(move || {
        for _ in 0..3 {
            thread::sleep(Duration::from_millis(5));
            drop(consumer.dequeue());
        }
        consumer
    });

    assert!(producer.wait(Condition::Empty, WAIT));
    let consumer = consumer_handle.join().unwrap();
    assert!(!consumer.has_ready_packet());
}

#[test]
fn test_almost_empty_waits_for_occupancy_ten() {
    let (mut producer, mut consumer) = queue(64, 10);
    let monitor = producer.monitor();

    for seq in 0..11 {
        let mut slot = producer.reserve_slot().unwrap();
        *slot = DrawCommand::new(seq);
        slot.commit();
    }
    assert_eq!(monitor.occupancy(), 11);

    let dequeue_started = Arc::new(AtomicBool::new(false));
    let started = dequeue_started.clone();

    let consumer_handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        started.store(true, Ordering::SeqCst);
        drop(consumer.dequeue());
        consumer
    });

    assert!(producer.wait(Condition::AlmostEmpty, WAIT));
    assert!(dequeue_started.load(Ordering::SeqCst));
    assert_eq!(monitor.occupancy(), 10);

    consumer_handle.join().unwrap();
}

#[test]
fn test_alloc_ok_wait_wakes_when_space_frees() {
    let (mut producer, mut consumer) = queue(8, 4);
    let monitor = producer.monitor();

    while let Some(slot) = producer.reserve_slot() {
        slot.commit();
    }
    assert_eq!(monitor.free_space(), 1);

    let consumer_handle = thread::spawn(move || {
        for _ in 0..3 {
            thread::sleep(Duration::from_millis(5));
            drop(consumer.dequeue());
        }
        consumer
    });

    assert!(producer.wait(Condition::AllocOk, WAIT));
    assert!(monitor.free_space() >= 4);
    consumer_handle.join().unwrap();
}

#[test]
fn test_timed_out_wait_leaves_no_stale_wakeup() {
    let (mut producer, mut consumer) = queue(16, 10);

    let start = Instant::now();
    assert!(!consumer.wait(Condition::NonEmpty, Duration::from_millis(20)));
    assert!(start.elapsed() >= Duration::from_millis(20));

    // A commit with no registered waiter must not leave a signal behind
    producer.reserve_slot().unwrap().commit();
    drop(consumer.dequeue());

    let start = Instant::now();
    assert!(!consumer.wait(Condition::NonEmpty, Duration::from_millis(20)));
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn test_usage_ratio_bounds() {
    let (mut producer, mut consumer) = queue(10, 5);

    assert_eq!(producer.usage_ratio(), 0.0);

    let mut last = 0.0;
    while let Some(slot) = producer.reserve_slot() {
        slot.commit();
        let ratio = producer.usage_ratio();
        assert!(ratio > last);
        last = ratio;
    }
    assert!((last - 0.9).abs() < 1e-9);
    assert!(last < 1.0);

    while consumer.dequeue().is_some() {}
    assert_eq!(consumer.usage_ratio(), 0.0);
}
