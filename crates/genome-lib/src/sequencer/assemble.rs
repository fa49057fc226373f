//! Step 4: sequence assembly
//!
//! Runs on a single thread after all matching rounds. Each surviving chain is
//! walked from its start; every link contributes the characters not shared
//! with its successor. Disconnected chains are appended in record order.

use crate::arena::{RecordArena, RecordId};
use crate::error::{SequencerError, SequencerResult};
use tracing::warn;

/// Assembled output before it is wrapped into a reconstruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Assembly {
    pub(crate) sequence: Vec<u8>,
    pub(crate) num_chains: usize,
}

/// Concatenate every chain in the arena
///
/// # Errors
/// Returns [`SequencerError::ChainLengthMismatch`] if a chain yields a
/// different number of characters than its start records.
pub(crate) fn assemble(arena: &RecordArena) -> SequencerResult<Assembly> {
    let segment_length = arena.segment_length();
    let starts: Vec<(RecordId, usize)> = arena
        .chain_starts()
        .map(|id| (id, arena.links(id).chain_length))
        .collect();

    let total_length = starts.iter().map(|&(_, length)| length).sum();
    let mut sequence = Vec::with_capacity(total_length);

    for &(start, recorded) in &starts {
        let before = sequence.len();
        // A chain never has more links than there are records
        for (id, links) in arena.walk(start).take(arena.len()) {
            let Some(segment) = arena.segment(id) else {
                break;
            };
            let take = segment_length - links.overlap_with_next;
            sequence.extend_from_slice(segment.prefix(take));
        }
        let walked = sequence.len() - before;
        if walked != recorded {
            return Err(SequencerError::ChainLengthMismatch { start, walked, recorded });
        }
    }

    if starts.len() > 1 {
        warn!(
            "Segments formed {} disjoint chains; concatenated in arbitrary order",
            starts.len()
        );
    }

    Ok(Assembly { sequence, num_chains: starts.len() })
}
