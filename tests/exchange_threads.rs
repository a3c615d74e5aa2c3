//! Threaded properties of the triple-buffer exchange: freshness,
//! monotonicity, no-tear, and writer liveness under asymmetric cadences.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stepstream::swap_pair;

const ARRAY_SIZE: usize = 50;

/// Writer fills whole arrays with a counter; reader asserts each observed
/// array is uniform (no tear) and the counter never goes backwards.
fn feed_and_consume(feed_wait: Duration, consume_wait: Duration, run_time: Duration) {
    let (mut writer, mut reader) = swap_pair([0i64; ARRAY_SIZE]);
    let keep_running = Arc::new(AtomicBool::new(true));

    let feeder = {
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || {
            let mut i = 0i64;
            let mut publishes = 0u64;
            while keep_running.load(Ordering::Relaxed) {
                i += 1;
                writer.write_slot().fill(i);
                writer.publish();
                publishes += 1;
                if !feed_wait.is_zero() {
                    thread::sleep(feed_wait);
                }
            }
            publishes
        })
    };

    let consumer = {
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || -> Result<u64, String> {
            let mut last_value = 0i64;
            let mut reads = 0u64;
            while keep_running.load(Ordering::Relaxed) {
                let consumed = reader.read();
                let start_value = consumed[0];
                if start_value < last_value {
                    return Err(format!(
                        "stale value observed: {start_value} after {last_value}"
                    ));
                }
                for &v in consumed.iter() {
                    if v != start_value {
                        return Err(format!("torn array: {v} mixed with {start_value}"));
                    }
                }
                last_value = start_value;
                reads += 1;
                if !consume_wait.is_zero() {
                    thread::sleep(consume_wait);
                }
            }
            Ok(reads)
        })
    };

    thread::sleep(run_time);
    keep_running.store(false, Ordering::Relaxed);

    let publishes = feeder.join().expect("feeder panicked");
    let reads = consumer
        .join()
        .expect("consumer panicked")
        .expect("consumer observed a violation");

    // Liveness: neither side was ever wedged by the other.
    assert!(publishes > 0, "writer made no progress");
    assert!(reads > 0, "reader made no progress");
}

#[test]
fn slower_feeding() {
    feed_and_consume(
        Duration::from_millis(10),
        Duration::ZERO,
        Duration::from_millis(500),
    );
}

#[test]
fn slower_consuming() {
    feed_and_consume(
        Duration::ZERO,
        Duration::from_millis(10),
        Duration::from_millis(500),
    );
}

#[test]
fn fast_feeding_and_consuming() {
    feed_and_consume(Duration::ZERO, Duration::ZERO, Duration::from_millis(500));
}

/// A multi-field value must never be observed mid-update: the second
/// field is always a fixed function of the first.
#[test]
fn no_tear_across_fields() {
    #[derive(Clone, Copy, Default)]
    struct Pair {
        count: u64,
        scaled: f64,
    }

    let (mut writer, mut reader) = swap_pair(Pair::default());
    let keep_running = Arc::new(AtomicBool::new(true));

    let feeder = {
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || {
            let mut i = 0u64;
            while keep_running.load(Ordering::Relaxed) {
                i += 1;
                writer.set(Pair {
                    count: i,
                    scaled: i as f64 * 1.7,
                });
            }
        })
    };

    let consumer = {
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || -> Result<(), String> {
            while keep_running.load(Ordering::Relaxed) {
                let pair = reader.read();
                if pair.scaled != pair.count as f64 * 1.7 {
                    return Err(format!(
                        "torn pair: count={} scaled={}",
                        pair.count, pair.scaled
                    ));
                }
            }
            Ok(())
        })
    };

    thread::sleep(Duration::from_millis(500));
    keep_running.store(false, Ordering::Relaxed);
    feeder.join().expect("feeder panicked");
    consumer
        .join()
        .expect("consumer panicked")
        .expect("consumer observed a torn value");
}

/// After all publishes have settled, a read returns the newest value.
#[test]
fn final_read_is_freshest() {
    let (mut writer, mut reader) = swap_pair(0u64);
    let feeder = thread::spawn(move || {
        for v in 1..=10_000u64 {
            writer.set(v);
        }
    });
    feeder.join().expect("feeder panicked");
    assert_eq!(*reader.read(), 10_000);
}
