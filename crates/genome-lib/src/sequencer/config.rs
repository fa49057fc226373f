//! Sequencer configuration
//!
//! Problem size and worker count for one reconstruction run.

use crate::constants::{
    max_unique_segments, DEFAULT_GENE_LENGTH, DEFAULT_SEGMENT_LENGTH, MIN_SEGMENT_LENGTH,
};
use crate::error::{SequencerError, SequencerResult};

/// Configuration parameters for reconstructing a sequence
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Length of the source sequence
    pub gene_length: usize,

    /// Fixed length of every segment (at least 2, at most `gene_length`)
    pub segment_length: usize,

    /// Number of worker lanes (0 = all available cores)
    pub num_threads: usize,

    /// Log per-phase statistics
    pub verbose: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            gene_length: DEFAULT_GENE_LENGTH,
            segment_length: DEFAULT_SEGMENT_LENGTH,
            num_threads: 0,
            verbose: false,
        }
    }
}

impl SequencerConfig {
    /// Create a configuration for the given source and segment lengths
    pub fn new(gene_length: usize, segment_length: usize) -> SequencerResult<Self> {
        let config = Self { gene_length, segment_length, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> SequencerResult<()> {
        if self.segment_length < MIN_SEGMENT_LENGTH {
            return Err(SequencerError::InvalidConfiguration(format!(
                "segment length must be at least {MIN_SEGMENT_LENGTH}, got {}",
                self.segment_length
            )));
        }
        if self.segment_length > self.gene_length {
            return Err(SequencerError::InvalidConfiguration(format!(
                "segment length {} exceeds gene length {}",
                self.segment_length, self.gene_length
            )));
        }
        Ok(())
    }

    /// Record arena capacity: one record per possible distinct segment
    #[inline]
    pub fn max_unique_segments(&self) -> usize {
        max_unique_segments(self.gene_length, self.segment_length)
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Sequencer Configuration:");
        tracing::info!("  gene_length = {}", self.gene_length);
        tracing::info!("  segment_length = {}", self.segment_length);
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::debug!("  max_unique_segments = {}", self.max_unique_segments());
        tracing::debug!("  verbose = {}", self.verbose);
    }
}
