//! Constants and defaults for the sequencer
//!
//! This module defines the default problem sizes used by the CLI and the
//! configuration types, plus a few small helpers shared across phases.

/// Default source (gene) length
pub const DEFAULT_GENE_LENGTH: usize = 1 << 14;

/// Default segment length
pub const DEFAULT_SEGMENT_LENGTH: usize = 1 << 6;

/// Default minimum number of random segments drawn by the cover generator
pub const DEFAULT_MIN_NUM_SEGMENTS: usize = 1 << 22;

/// Default seed for the gene and cover generators
pub const DEFAULT_SEED: u64 = 0;

/// Smallest segment length that leaves at least one overlap round
pub const MIN_SEGMENT_LENGTH: usize = 2;

/// Alphabet used by the random gene generator
pub const NUCLEOTIDES: [u8; 4] = [b'a', b'c', b'g', b't'];

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Maximum number of distinct segments a source of `gene_length` can yield
/// for the given `segment_length`.
///
/// Returns 0 when the segment is longer than the source.
#[inline]
pub const fn max_unique_segments(gene_length: usize, segment_length: usize) -> usize {
    if segment_length > gene_length {
        0
    } else {
        gene_length - segment_length + 1
    }
}
