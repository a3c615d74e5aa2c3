//! Fixed-capacity SPSC ring with snapshot-on-read semantics.
//!
//! Two equal-length buffers back each stream: `produced` belongs to the
//! writer thread, `snapshot` to the reader thread. A test-and-set
//! spinlock serializes the writer's append against the reader's bulk copy
//! and is held for nothing else; a dirty flag lets a reader that polls
//! faster than the writer pushes skip redundant copies entirely.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Shared<T> {
    produced: UnsafeCell<Box<[T]>>,
    snapshot: UnsafeCell<Box<[T]>>,
    locked: AtomicBool,
    dirty: AtomicBool,
}

// SAFETY: `produced` is mutated only by the writer (through `&mut
// RingWriter`) and read by the reader only inside the spinlock, which the
// writer also takes for every mutation. `snapshot` is touched only by the
// reader (through `&mut RingReader`).
unsafe impl<T: Send> Sync for Shared<T> {}
unsafe impl<T: Send> Send for Shared<T> {}

impl<T> Shared<T> {
    fn lock(&self) {
        while self.locked.swap(true, Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Producer half of a ring stream.
pub struct RingWriter<T> {
    shared: Arc<Shared<T>>,
}

/// Consumer half of a ring stream.
pub struct RingReader<T> {
    shared: Arc<Shared<T>>,
}

/// Create a matched writer/reader pair over a ring of `capacity`
/// elements, both buffers pre-filled with `init`.
pub fn ring_pair<T: Copy>(capacity: usize, init: T) -> (RingWriter<T>, RingReader<T>) {
    let shared = Arc::new(Shared {
        produced: UnsafeCell::new(vec![init; capacity].into_boxed_slice()),
        snapshot: UnsafeCell::new(vec![init; capacity].into_boxed_slice()),
        locked: AtomicBool::new(false),
        // The pre-initialized contents count as unread data: the first
        // snapshot must copy.
        dirty: AtomicBool::new(true),
    });
    let writer = RingWriter {
        shared: Arc::clone(&shared),
    };
    let reader = RingReader { shared };
    (writer, reader)
}

/// Append `values` to the tail of `buf`, shifting older elements out at
/// the head. A slice longer than the ring keeps only its trailing part.
fn ring_append<T: Copy>(buf: &mut [T], values: &[T]) {
    let capacity = buf.len();
    if values.len() >= capacity {
        buf.copy_from_slice(&values[values.len() - capacity..]);
        return;
    }
    buf.copy_within(values.len().., 0);
    buf[capacity - values.len()..].copy_from_slice(values);
}

impl<T: Copy> RingWriter<T> {
    /// Ring-append a single value.
    pub fn push(&mut self, value: T) {
        self.push_slice(std::slice::from_ref(&value));
    }

    /// Ring-append a slice of values.
    pub fn push_slice(&mut self, values: &[T]) {
        self.shared.lock();
        // SAFETY: mutation is allowed here — we are the writer and hold
        // the lock, so the reader is not mid-copy.
        let produced = unsafe { &mut *self.shared.produced.get() };
        ring_append(produced, values);
        self.shared.dirty.store(true, Ordering::Release);
        self.shared.unlock();
    }

    /// Direct view of the produced ring, oldest to newest.
    ///
    /// Only meaningful on the writer thread; the reader side goes through
    /// [`RingReader::snapshot`].
    pub fn produced(&self) -> &[T] {
        // SAFETY: only this writer mutates `produced`, and doing so needs
        // `&mut self`; the reader merely copies out of it under the lock.
        unsafe { &*self.shared.produced.get() }
    }

    pub fn capacity(&self) -> usize {
        self.produced().len()
    }
}

impl<T: Copy> RingReader<T> {
    /// Consistent view of the ring as of the most recent push.
    ///
    /// Copies the produced ring under the spinlock when new data is
    /// available, otherwise returns the previous snapshot untouched.
    pub fn snapshot(&mut self) -> &[T] {
        if self.shared.dirty.load(Ordering::Acquire) {
            self.shared.lock();
            // SAFETY: holding the lock excludes the writer's append, so
            // `produced` is stable for the duration of the copy;
            // `snapshot` is owned by this reader.
            let produced = unsafe { &*self.shared.produced.get() };
            let snapshot = unsafe { &mut *self.shared.snapshot.get() };
            snapshot.copy_from_slice(produced);
            self.shared.dirty.store(false, Ordering::Release);
            self.shared.unlock();
        }
        // SAFETY: `snapshot` is only ever touched by this reader.
        unsafe { &*self.shared.snapshot.get() }
    }

    pub fn capacity(&self) -> usize {
        self.snapshot_len()
    }

    fn snapshot_len(&self) -> usize {
        // SAFETY: length never changes after construction.
        unsafe { &*self.shared.snapshot.get() }.len()
    }
}
