//! Spinlock-guarded ring streams and the chunk/step framing adapter.
//!
//! [`ring_pair`] hands out a producer/consumer pair over a fixed-capacity
//! ring of samples: the writer appends ring-style (oldest samples are
//! overwritten once full, newest always at the tail), the reader pulls a
//! consistent snapshot of the whole ring. Where the triple-buffer
//! exchange moves one value at a time lock-free, the ring moves bulk
//! vectors under a short test-and-set spinlock — the copy is the critical
//! section, nothing else.
//!
//! [`FramingBuffer`] builds on two rings to let a fixed-block processing
//! step (e.g. a transform) consume a stream whose chunks arrive at some
//! other, varying granularity.

pub mod framing;
pub mod ring;

pub use framing::{FramingBuffer, FramingTaps};
pub use ring::{ring_pair, RingReader, RingWriter};
