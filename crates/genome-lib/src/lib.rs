// Genome: parallel sequence reconstruction
//
// Rebuilds a source sequence from a redundant multiset of fixed-length,
// overlapping segments by greedily joining the longest overlaps first.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod arena;
pub mod constants;
pub mod error;
pub mod gene;
pub mod hasher;
pub mod parse;
pub mod prefix_table;
pub mod segment;
pub mod sequencer;
pub mod unique_segments;

// Re-export common types at crate root
pub use error::{SequencerError, SequencerResult};
pub use gene::{generate_cover, CoverConfig, Gene};
pub use segment::{Segment, SegmentSet};
pub use sequencer::{Reconstruction, Sequencer, SequencerConfig};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let (major, minor, patch) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
        assert_eq!(patch, 0);
    }
}
