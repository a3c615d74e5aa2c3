//! Chunk/step framing adapter.
//!
//! ## Per-`process` flow
//!
//! ```text
//! 1. in_chunk ──► input ring, pending += len(in_chunk)
//! 2. while pending ≥ step: step_cb(newest `step` input samples) ──► output ring
//! 3. clamp available up to len(in_chunk)   (startup transient, zero-filled)
//! 4. newest `len(in_chunk)` output samples ──► out_chunk
//! 5. available -= len(in_chunk)
//! ```
//!
//! The caller's chunk size and the processing block size are thereby fully
//! decoupled, at the cost of up to `step_size - 1` samples of latency.
//! Feeding the first chunk shorter than a full step pins that startup
//! deficit as a constant delay for the rest of the stream.

use tracing::debug;

use crate::buffering::ring::{ring_pair, RingReader, RingWriter};
use crate::error::{Result, StepstreamError};

/// Adapts arbitrary-size input chunks to a fixed processing step size and
/// the processed output back to the caller's chunk size.
///
/// Owns the writer halves of an input and an output ring; the matching
/// reader halves live in the [`FramingTaps`] returned alongside, for a
/// monitoring thread that wants consistent views of either stream.
pub struct FramingBuffer<F> {
    input: RingWriter<F>,
    output: RingWriter<F>,
    /// Pre-sized destination for one processed block; reused every step.
    scratch: Vec<F>,
    step_size: usize,
    /// Samples pushed but not yet consumed by a processing step.
    pending_input: usize,
    /// Processed samples not yet handed back to the caller.
    available_output: usize,
}

/// Consumer-side taps of a [`FramingBuffer`]'s rings.
pub struct FramingTaps<F> {
    input: RingReader<F>,
    output: RingReader<F>,
}

impl<F: Copy + Default> FramingBuffer<F> {
    /// Create a framing buffer whose rings hold `capacity` samples and
    /// whose processing callback consumes blocks of `step_size`.
    ///
    /// Fails eagerly on `step_size == 0` or `capacity < step_size`.
    pub fn new(capacity: usize, step_size: usize) -> Result<(Self, FramingTaps<F>)> {
        if step_size == 0 {
            return Err(StepstreamError::ZeroStepSize);
        }
        if capacity < step_size {
            return Err(StepstreamError::CapacityBelowStep {
                capacity,
                step_size,
            });
        }

        let (input_writer, input_reader) = ring_pair(capacity, F::default());
        let (output_writer, output_reader) = ring_pair(capacity, F::default());
        debug!(capacity, step_size, "framing buffer created");

        let buffer = Self {
            input: input_writer,
            output: output_writer,
            scratch: vec![F::default(); step_size],
            step_size,
            pending_input: 0,
            available_output: 0,
        };
        let taps = FramingTaps {
            input: input_reader,
            output: output_reader,
        };
        Ok((buffer, taps))
    }

    /// The fixed block length handed to the step callback.
    pub fn step_size(&self) -> usize {
        self.step_size
    }

    /// Ring capacity (and maximum chunk length) in samples.
    pub fn capacity(&self) -> usize {
        self.input.capacity()
    }

    /// Run one framing pass: ingest `in_chunk`, invoke `step_cb` for every
    /// complete step now available, and fill `out_chunk` with the oldest
    /// unreturned processed samples.
    ///
    /// `in_chunk` and `out_chunk` must be the same length, at most
    /// [`capacity`](Self::capacity); the chunk together with the
    /// not-yet-processed backlog (always below `step_size`) must also fit
    /// the ring. `step_cb` receives the newest `step_size` input samples
    /// and must write its result into the equally long output slice.
    pub fn process<C>(&mut self, in_chunk: &[F], out_chunk: &mut [F], mut step_cb: C) -> Result<()>
    where
        C: FnMut(&[F], &mut [F]),
    {
        let chunk_len = in_chunk.len();
        if chunk_len != out_chunk.len() {
            return Err(StepstreamError::ChunkSizeMismatch {
                input: chunk_len,
                output: out_chunk.len(),
            });
        }
        if chunk_len > self.capacity() {
            return Err(StepstreamError::ChunkExceedsCapacity {
                len: chunk_len,
                capacity: self.capacity(),
            });
        }
        // The unprocessed backlog plus this chunk must fit the input ring,
        // or the push would overwrite samples no step has consumed yet.
        // Checked before the push so a rejected call leaves no trace.
        if self.pending_input + chunk_len > self.capacity() {
            return Err(StepstreamError::PendingExceedsCapacity {
                len: chunk_len,
                pending: self.pending_input,
                capacity: self.capacity(),
            });
        }

        self.input.push_slice(in_chunk);
        self.pending_input += chunk_len;

        while self.pending_input >= self.step_size {
            {
                let produced = self.input.produced();
                let start = produced.len() - self.pending_input;
                step_cb(
                    &produced[start..start + self.step_size],
                    &mut self.scratch,
                );
            }
            self.output.push_slice(&self.scratch);
            self.pending_input -= self.step_size;
            self.available_output += self.step_size;
        }

        // Startup transient: not enough output produced yet to satisfy
        // the request. The deficit reads as the output ring's
        // pre-initialized (zero) samples.
        if self.available_output < chunk_len {
            self.available_output = chunk_len;
        }
        // The converse overflow: a startup clamp can leave the unreturned
        // backlog larger than the output ring, in which case its oldest
        // samples have already been overwritten. Deliver from the oldest
        // sample the ring still holds.
        if self.available_output > self.output.capacity() {
            self.available_output = self.output.capacity();
        }

        let produced = self.output.produced();
        let start = produced.len() - self.available_output;
        out_chunk.copy_from_slice(&produced[start..start + chunk_len]);
        self.available_output -= chunk_len;

        Ok(())
    }
}

impl<F: Copy> FramingTaps<F> {
    /// Snapshot of the raw input ring, oldest to newest.
    pub fn input(&mut self) -> &[F] {
        self.input.snapshot()
    }

    /// Snapshot of the processed output ring, oldest to newest.
    pub fn output(&mut self) -> &[F] {
        self.output.snapshot()
    }
}
