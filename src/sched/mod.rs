//! Fixed-cadence periodic execution on a dedicated thread.
//!
//! ## Tick anatomy
//!
//! ```text
//! ┌─ load interval ─ record wake = now + interval ─ run action ─ wait ─┐
//! └────────────────────────────◄──────────────────────────────────────┘
//! ```
//!
//! The wake time is computed from the *start* of the tick, so a fast
//! action keeps a stable cadence; an action that overruns the interval
//! re-invokes back to back (the wait clamps at zero). [`WaitPolicy::Busy`]
//! polls a monotonic clock for sub-millisecond jitter at the cost of a
//! core; [`WaitPolicy::Sleep`] trades precision for CPU economy.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

/// How the worker thread spends the remainder of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Spin on `Instant::now()` until the wake time.
    Busy,
    /// `thread::sleep` for the remaining duration.
    Sleep,
}

/// Drives a caller-supplied action at a fixed wall-clock cadence on a
/// dedicated worker thread.
///
/// One scheduler per physical loop; `start` while running is a rejected
/// no-op. The running flag is shared between this handle and the worker
/// closure, so `running()` and `stop()` are always safe regardless of
/// what the worker is doing.
pub struct PeriodicScheduler {
    running: Arc<AtomicBool>,
    /// Current interval in nanoseconds, re-read once per tick.
    interval_ns: Arc<AtomicU64>,
    /// Start/stop serialization + ownership of the worker handle.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for PeriodicScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicScheduler {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            interval_ns: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the worker thread and begin ticking `action` every
    /// `interval`.
    ///
    /// Returns `false` without effect if the scheduler is already
    /// running. The action must not panic; error handling is the
    /// action's own concern.
    pub fn start<A>(&self, mut action: A, interval: Duration, wait: WaitPolicy) -> bool
    where
        A: FnMut() + Send + 'static,
    {
        let mut worker = self.worker.lock();
        if self.running.load(Ordering::Acquire) {
            warn!("scheduler already running, start ignored");
            return false;
        }

        self.interval_ns
            .store(interval.as_nanos() as u64, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);

        let running = Arc::clone(&self.running);
        let interval_ns = Arc::clone(&self.interval_ns);
        let handle = thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                let interval = Duration::from_nanos(interval_ns.load(Ordering::Relaxed));
                let wake_time = Instant::now() + interval;
                action();
                match wait {
                    WaitPolicy::Busy => busy_wait(wake_time),
                    WaitPolicy::Sleep => sleep_wait(wake_time),
                }
            }
        });
        *worker = Some(handle);
        debug!(interval_ms = interval.as_millis() as u64, ?wait, "scheduler started");
        true
    }

    /// Signal termination and join the worker thread.
    ///
    /// Blocks until the in-flight action invocation (plus at most one
    /// wait) has completed; safe to call repeatedly. Must not be called
    /// from inside the scheduled action.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        self.running.store(false, Ordering::Release);
        if let Some(handle) = worker.take() {
            // The worker only parks in bounded waits, so this join
            // terminates within one interval plus the action runtime.
            let _ = handle.join();
            debug!("scheduler stopped");
        }
    }

    /// Whether the worker thread is currently ticking.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Change the tick cadence without restarting.
    ///
    /// Takes effect at the start of the next tick.
    pub fn set_interval(&self, interval: Duration) {
        self.interval_ns
            .store(interval.as_nanos() as u64, Ordering::Relaxed);
        debug!(interval_ms = interval.as_millis() as u64, "scheduler interval changed");
    }

    /// The currently configured tick interval.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns.load(Ordering::Relaxed))
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn busy_wait(wake_time: Instant) {
    while Instant::now() < wake_time {
        std::hint::spin_loop();
    }
}

fn sleep_wait(wake_time: Instant) {
    // Saturates at zero when the action overran the interval, falling
    // straight through to the next tick.
    let remaining = wake_time.saturating_duration_since(Instant::now());
    if remaining > Duration::ZERO {
        thread::sleep(remaining);
    }
}
