//! # stepstream
//!
//! Real-time-safe primitives for moving a continuously arriving stream of
//! samples between a producer thread and a consumer thread that run at
//! independent, unsynchronized cadences.
//!
//! ## Architecture
//!
//! ```text
//! PeriodicScheduler (producer)          PeriodicScheduler (consumer)
//!        │ tick                                 │ tick
//!        ▼                                      ▼
//! FramingBuffer::process ──► step_cb      FramingTaps / SwapReader
//!        │        ▲                             ▲
//!   RingWriter    │ fixed-size blocks      RingReader::snapshot
//!   (input ring)  └── RingWriter (output ring) ─┘
//!
//! SwapWriter ──[3 slots, atomic state machine]──► SwapReader
//! ```
//!
//! Every primitive is single-producer / single-consumer and is handed out
//! as a matched pair of halves; owning a half *is* the role. Nothing here
//! allocates or blocks on the hot path after construction — the exchange
//! is lock-free, the ring holds a test-and-set spinlock only across a bulk
//! copy, and the scheduler's wait is the only intentional suspension.
//!
//! The block-processing function itself (e.g. an FFT) is not part of this
//! crate: [`FramingBuffer::process`] calls it synchronously as a plain
//! `(input block) -> output block` closure.

#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffering;
pub mod error;
pub mod exchange;
pub mod sched;

// Convenience re-exports for downstream crates
pub use buffering::{ring_pair, FramingBuffer, FramingTaps, RingReader, RingWriter};
pub use error::{Result, StepstreamError};
pub use exchange::{swap_pair, SwapReader, SwapWriter};
pub use sched::{PeriodicScheduler, WaitPolicy};
