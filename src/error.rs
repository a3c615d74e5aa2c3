use thiserror::Error;

/// All errors produced by stepstream.
///
/// The taxonomy is deliberately narrow: every variant is a misuse error
/// detected eagerly at an API boundary. Races inside the lock-free
/// exchange are resolved internally and never surface here.
#[derive(Debug, Error)]
pub enum StepstreamError {
    #[error("ring capacity {capacity} is smaller than step size {step_size}")]
    CapacityBelowStep { capacity: usize, step_size: usize },

    #[error("step size must be non-zero")]
    ZeroStepSize,

    #[error("input chunk length {input} does not match output chunk length {output}")]
    ChunkSizeMismatch { input: usize, output: usize },

    #[error("chunk length {len} exceeds ring capacity {capacity}")]
    ChunkExceedsCapacity { len: usize, capacity: usize },

    #[error(
        "chunk of {len} samples on top of {pending} pending samples exceeds ring capacity {capacity}"
    )]
    PendingExceedsCapacity {
        len: usize,
        pending: usize,
        capacity: usize,
    },
}

pub type Result<T> = std::result::Result<T, StepstreamError>;
