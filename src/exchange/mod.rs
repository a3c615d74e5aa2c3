//! Lock-free triple-buffered latest-value exchange (SPSC).
//!
//! ## Algorithm
//!
//! Three slots cycle through an atomic state machine:
//!
//! ```text
//! Free ──► Writing ──► Written ──► Reading ──► Free ──► …
//! ```
//!
//! At most one slot is `Writing` (owned by [`SwapWriter`]) and at most one
//! is `Reading` (owned by [`SwapReader`]) at any time. Publishing stores
//! `Written` with release ordering; claiming compare-exchanges
//! `Written → Reading` with acquire ordering, so every write to the slot
//! contents is visible to the reader once it observes the transition.
//!
//! This is a *latest-value* exchange, not a queue: a reader that polls
//! slower than the writer publishes will skip intermediate values, and a
//! reader that polls faster will see the same value repeatedly. Neither
//! side ever waits on the other beyond a bounded reclaim loop.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Per-slot lifecycle state, stored as `u8` in the atomic state array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum SlotState {
    Free = 0,
    Writing = 1,
    Written = 2,
    Reading = 3,
}

struct Shared<V> {
    slots: [UnsafeCell<V>; 3],
    states: [AtomicU8; 3],
}

// SAFETY: slot contents are only ever accessed by the half whose role the
// state machine currently assigns to that slot. The writer mutates a slot
// only while it is `Writing`; the reader borrows a slot only while it is
// `Reading`; no slot is in both roles at once.
unsafe impl<V: Send> Sync for Shared<V> {}
unsafe impl<V: Send> Send for Shared<V> {}

impl<V> Shared<V> {
    fn state(&self, idx: usize) -> &AtomicU8 {
        &self.states[idx]
    }

    fn try_claim(&self, idx: usize, from: SlotState, to: SlotState, order: Ordering) -> bool {
        self.state(idx)
            .compare_exchange(from as u8, to as u8, order, Ordering::Acquire)
            .is_ok()
    }
}

/// Producer half of a triple-buffer exchange.
///
/// `Send` but not `Sync` or `Clone` — owning the writer is the
/// single-producer guarantee.
pub struct SwapWriter<V> {
    shared: Arc<Shared<V>>,
    /// Slot currently claimed for writing, if any.
    writing: Option<usize>,
    /// Slot holding the most recently published value.
    written: usize,
}

/// Consumer half of a triple-buffer exchange.
pub struct SwapReader<V> {
    shared: Arc<Shared<V>>,
    /// Slot currently held by the reader.
    reading: usize,
}

/// Create a matched writer/reader pair around three clones of `init`.
///
/// A [`SwapReader::read`] before the first [`SwapWriter::publish`] returns
/// `init`.
pub fn swap_pair<V: Clone>(init: V) -> (SwapWriter<V>, SwapReader<V>) {
    let shared = Arc::new(Shared {
        slots: [
            UnsafeCell::new(init.clone()),
            UnsafeCell::new(init.clone()),
            UnsafeCell::new(init),
        ],
        states: [
            AtomicU8::new(SlotState::Writing as u8),
            AtomicU8::new(SlotState::Reading as u8),
            AtomicU8::new(SlotState::Free as u8),
        ],
    });

    let writer = SwapWriter {
        shared: Arc::clone(&shared),
        writing: Some(0),
        written: 1,
    };
    let reader = SwapReader { shared, reading: 1 };
    (writer, reader)
}

impl<V> SwapWriter<V> {
    /// Borrow the slot the producer should mutate in place.
    ///
    /// The reference is valid until the next [`publish`](Self::publish);
    /// repeated calls without an intervening publish return the same slot.
    pub fn write_slot(&mut self) -> &mut V {
        let idx = self.claim_write_slot();
        // SAFETY: `idx` is in `Writing` state and therefore owned
        // exclusively by this writer until `publish` releases it.
        unsafe { &mut *self.shared.slots[idx].get() }
    }

    /// Overwrite the write slot and publish in one call.
    pub fn set(&mut self, value: V) {
        *self.write_slot() = value;
        self.publish();
    }

    /// Make the current write-slot contents visible to the reader.
    ///
    /// No-op if nothing was written since the last publish. Never blocks.
    pub fn publish(&mut self) {
        let Some(idx) = self.writing.take() else {
            return;
        };

        // Reclaim the previously published slot if the reader never took
        // it; a lost race here means the reader holds it now, which is
        // equally fine.
        self.shared.try_claim(
            self.written,
            SlotState::Written,
            SlotState::Free,
            Ordering::AcqRel,
        );

        self.shared
            .state(idx)
            .store(SlotState::Written as u8, Ordering::Release);
        self.written = idx;
    }

    fn claim_write_slot(&mut self) -> usize {
        if let Some(idx) = self.writing {
            return idx;
        }

        // Fast path: some slot is already free.
        if let Some(idx) = self.find_free_slot() {
            self.writing = Some(idx);
            return idx;
        }

        // No free slot means the last published value was never consumed;
        // take it back. Safe because a `Written` slot is not yet claimed
        // by the reader.
        if self.shared.try_claim(
            self.written,
            SlotState::Written,
            SlotState::Writing,
            Ordering::AcqRel,
        ) {
            self.writing = Some(self.written);
            return self.written;
        }

        // The reader grabbed the written slot just before we could reuse
        // it. It frees its previous slot within that same `read` call, so
        // a `Free` slot appears after a bounded number of its
        // instructions; spin until it does.
        loop {
            if let Some(idx) = self.find_free_slot() {
                self.writing = Some(idx);
                return idx;
            }
            std::hint::spin_loop();
        }
    }

    fn find_free_slot(&self) -> Option<usize> {
        // Only the writer performs `Free → Writing`, so a plain store
        // after the load cannot race.
        (0..3).find(|&idx| {
            if self.shared.state(idx).load(Ordering::Acquire) == SlotState::Free as u8 {
                self.shared
                    .state(idx)
                    .store(SlotState::Writing as u8, Ordering::Relaxed);
                true
            } else {
                false
            }
        })
    }
}

impl<V> SwapReader<V> {
    /// Borrow the most recently published value.
    ///
    /// If nothing new has been published since the last call, the
    /// previously read value is returned again. The reference is valid
    /// until the next `read`. Never blocks.
    pub fn read(&mut self) -> &V {
        for idx in 0..3 {
            if self.shared.try_claim(
                idx,
                SlotState::Written,
                SlotState::Reading,
                Ordering::AcqRel,
            ) {
                // Release the slot we held so the writer can cycle it.
                self.shared
                    .state(self.reading)
                    .store(SlotState::Free as u8, Ordering::Release);
                self.reading = idx;
                break;
            }
        }
        // SAFETY: `self.reading` is in `Reading` state and therefore not
        // writable by the writer until the next `read` frees it.
        unsafe { &*self.shared.slots[self.reading].get() }
    }
}
