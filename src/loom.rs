#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::{CommandQueue, Condition, QueueConfig};
    use loom::{model::Builder, thread};
    use std::time::Duration;

    fn builder() -> Builder {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }
        builder
    }

    fn config(slots: usize) -> QueueConfig {
        QueueConfig::with_slots::<u64>(slots).alloc_ok_threshold(2)
    }

    #[test]
    fn test_non_empty_wakeup_is_never_missed() {
        builder().check(|| {
            let queue = CommandQueue::<u64>::with_config(&config(4)).unwrap();
            let (mut producer, mut consumer) = queue.split();
            let num_packets = 2;

            let producer_handle = thread::spawn(move || {
                for i in 0..num_packets {
                    let mut slot = producer.reserve_slot().unwrap();
                    *slot = i;
                    slot.commit();
                }
            });

            let mut received = vec![];
            while received.len() < num_packets as usize {
                match consumer.dequeue().map(|packet| *packet) {
                    Some(packet) => received.push(packet),
                    // Untimed under loom: a missed wakeup shows up as deadlock
                    None => {
                        consumer.wait(Condition::NonEmpty, Duration::MAX);
                    }
                }
            }

            producer_handle.join().unwrap();
            assert_eq!(received, vec![0, 1]);
        });
    }

    #[test]
    fn test_empty_wakeup_after_drain() {
        builder().check(|| {
            let queue = CommandQueue::<u64>::with_config(&config(4)).unwrap();
            let (mut producer, mut consumer) = queue.split();

            producer.reserve_slot().unwrap().commit();

            let consumer_handle = thread::spawn(move || {
                loop {
                    if let Some(packet) = consumer.dequeue() {
                        drop(packet);
                        break;
                    }
                    thread::yield_now();
                }
                consumer
            });

            assert!(producer.wait(Condition::Empty, Duration::MAX));
            let consumer = consumer_handle.join().unwrap();
            assert!(!consumer.has_ready_packet());
        });
    }

    #[test]
    fn test_alloc_ok_wakeup_when_full() {
        builder().check(|| {
            let queue = CommandQueue::<u64>::with_config(&config(3)).unwrap();
            let (mut producer, mut consumer) = queue.split();

            // 3 slots, 2 usable
            producer.reserve_slot().unwrap().commit();
            producer.reserve_slot().unwrap().commit();
            assert!(producer.reserve_slot().is_none());

            let consumer_handle = thread::spawn(move || {
                drop(consumer.dequeue());
                consumer
            });

            assert!(producer.wait(Condition::AllocOk, Duration::MAX));
            assert!(producer.reserve_slot().is_some());
            consumer_handle.join().unwrap();
        });
    }
}
