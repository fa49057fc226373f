//! Error types for the sequencer.

use thiserror::Error;

/// Result type for sequencer operations.
pub type SequencerResult<T> = Result<T, SequencerError>;

/// Errors produced while configuring or running the sequencer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// Configuration parameters are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input segment does not have the set's fixed length.
    #[error("segment {index} has length {actual}, expected {expected}")]
    SegmentLengthMismatch {
        /// Position of the offending segment in the input.
        index: usize,
        /// Fixed segment length of the set.
        expected: usize,
        /// Length of the offending segment.
        actual: usize,
    },

    /// The input segment set is empty.
    #[error("no segments to sequence")]
    EmptyInput,

    /// More unique segments than the record arena was sized for.
    ///
    /// Indicates the input does not come from a source of the configured
    /// length.
    #[error("record arena capacity exceeded: {required} unique segments, capacity {capacity}")]
    CapacityExceeded {
        /// Number of records that were needed.
        required: usize,
        /// Preallocated arena capacity.
        capacity: usize,
    },

    /// A walked chain disagrees with its recorded length.
    #[error("chain starting at record {start} spans {walked} characters, recorded {recorded}")]
    ChainLengthMismatch {
        /// Record index of the chain start.
        start: usize,
        /// Characters produced by walking the chain.
        walked: usize,
        /// Length stored on the chain start.
        recorded: usize,
    },

    /// The worker pool could not be created.
    #[error("failed to create thread pool: {0}")]
    ThreadPool(String),
}
