//! Sequencer orchestration
//!
//! Coordinates the pipeline that rebuilds a sequence from its segments:
//! 1. Remove duplicate segments (parallel)
//! 2. Claim construct records and build prefix tables (parallel)
//! 3. Match suffixes to prefixes, longest overlap first (parallel rounds)
//! 4. Assemble the chains into one sequence (single thread)
//!
//! Parallel steps run as one broadcast on a fixed rayon pool: every pool
//! thread becomes one lane with a static share of the work. The end of a
//! broadcast is a full rendezvous; inside step 3 the lanes meet at a barrier
//! after every sub-phase of every round.

use crate::arena::RecordArena;
use crate::error::{SequencerError, SequencerResult};
use crate::prefix_table::PrefixTableBuilder;
use crate::segment::SegmentSet;
use crate::sequencer::{
    assemble::assemble,
    config::SequencerConfig,
    dedup::dedup_lane,
    index::index_lane,
    matching::match_lane,
    stats::{MatchStatistics, TableStatistics},
};
use crate::unique_segments::UniqueSegmentTable;
use rayon::ThreadPool;
use std::fmt;
use std::sync::Barrier;
use tracing::{debug, info};

/// Result of a reconstruction run
#[derive(Debug, Clone)]
pub struct Reconstruction {
    sequence: Vec<u8>,
    num_chains: usize,
    num_segments: usize,
    num_unique_segments: usize,
    match_stats: MatchStatistics,
}

impl Reconstruction {
    /// Reconstructed sequence
    #[inline]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Reconstructed sequence as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.sequence).ok()
    }

    /// Take ownership of the sequence
    pub fn into_sequence(self) -> Vec<u8> {
        self.sequence
    }

    /// Length of the reconstructed sequence
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the reconstructed sequence is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of chains concatenated into the output
    pub fn num_chains(&self) -> usize {
        self.num_chains
    }

    /// Whether every segment ended up in a single chain
    ///
    /// When this is false the input did not cover the source with enough
    /// overlap, and the chains were joined in arbitrary order.
    pub fn is_fully_connected(&self) -> bool {
        self.num_chains <= 1
    }

    /// Input segments, duplicates included
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Distinct segments after deduplication
    pub fn num_unique_segments(&self) -> usize {
        self.num_unique_segments
    }

    /// Merges per matching round
    pub fn match_statistics(&self) -> &MatchStatistics {
        &self.match_stats
    }
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.sequence))
    }
}

/// Tables and records left after the parallel steps
pub(crate) struct RunState {
    pub(crate) unique: UniqueSegmentTable,
    pub(crate) arena: RecordArena,
    pub(crate) match_stats: MatchStatistics,
}

/// Rebuilds a sequence from a redundant set of overlapping segments
pub struct Sequencer {
    config: SequencerConfig,
}

impl Sequencer {
    /// Create a new sequencer with the given configuration
    pub fn new(config: SequencerConfig) -> SequencerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration of this sequencer
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Reconstruct the source sequence from `segments`
    ///
    /// # Parallelism
    /// The number of lanes is controlled by `config.num_threads`:
    /// - `0` means use all available CPU cores (rayon default)
    /// - `N` means use exactly N lanes
    ///
    /// # Errors
    /// Fails on empty input, segments of the wrong length, more distinct
    /// segments than a source of `gene_length` can hold, or if the worker
    /// pool cannot be created. A disconnected result is not an error; see
    /// [`Reconstruction::is_fully_connected`].
    pub fn run(&self, segments: &SegmentSet) -> SequencerResult<Reconstruction> {
        let pool = self.build_pool()?;
        let state = self.run_parallel_steps(&pool, segments)?;

        info!("Step 4: Assembling sequence...");
        let assembly = assemble(&state.arena)?;
        info!(
            "  Assembled {} characters from {} chain(s)",
            assembly.sequence.len(),
            assembly.num_chains
        );

        Ok(Reconstruction {
            sequence: assembly.sequence,
            num_chains: assembly.num_chains,
            num_segments: segments.len(),
            num_unique_segments: state.unique.len(),
            match_stats: state.match_stats,
        })
    }

    fn build_pool(&self) -> SequencerResult<ThreadPool> {
        // num_threads == 0 means "all cores" (rayon default).
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .thread_name(|i| format!("sequencer-lane-{i}"))
            .build()
            .map_err(|e| SequencerError::ThreadPool(e.to_string()))
    }

    fn check_input(&self, segments: &SegmentSet) -> SequencerResult<()> {
        if segments.is_empty() {
            return Err(SequencerError::EmptyInput);
        }
        if segments.segment_length() != self.config.segment_length {
            return Err(SequencerError::SegmentLengthMismatch {
                index: 0,
                expected: self.config.segment_length,
                actual: segments.segment_length(),
            });
        }
        Ok(())
    }

    /// Steps 1 to 3 on the given pool
    pub(crate) fn run_parallel_steps(
        &self,
        pool: &ThreadPool,
        segments: &SegmentSet,
    ) -> SequencerResult<RunState> {
        self.check_input(segments)?;
        self.config.print();

        let lanes = pool.current_num_threads();
        let segment_length = self.config.segment_length;
        info!("Reconstructing from {} segments on {} lane(s)", segments.len(), lanes);

        // Step 1: Remove duplicate segments
        info!("Step 1: Removing duplicate segments...");
        let unique = UniqueSegmentTable::new(self.config.gene_length);
        pool.broadcast(|ctx| dedup_lane(ctx.index(), lanes, segments, &unique));

        let num_unique = unique.len();
        let capacity = self.config.max_unique_segments();
        info!("  {} unique segments (capacity {})", num_unique, capacity);
        if self.config.verbose {
            TableStatistics::from_table(&unique).print_summary();
        }
        if num_unique > capacity {
            return Err(SequencerError::CapacityExceeded { required: num_unique, capacity });
        }

        // Step 2: Claim records and index prefixes
        info!("Step 2: Building construct records and prefix tables...");
        let arena = RecordArena::new(capacity, segment_length);
        let builder = PrefixTableBuilder::new(segment_length, self.config.gene_length);
        let claimed = pool
            .broadcast(|ctx| index_lane(ctx.index(), lanes, &unique, &arena, &builder))
            .into_iter()
            .collect::<SequencerResult<Vec<usize>>>()?;
        debug!("  Records claimed per lane: {:?}", claimed);
        let prefixes = builder.freeze();
        info!("  Indexed {} records over {} prefix lengths", arena.len(), segment_length - 1);

        // Step 3: Match ends to starts, longest overlap first
        info!("Step 3: Matching overlaps...");
        let barrier = Barrier::new(lanes);
        let per_lane =
            pool.broadcast(|ctx| match_lane(ctx.index(), lanes, &arena, &prefixes, &barrier));
        let match_stats = MatchStatistics::from_lanes(segment_length, per_lane);
        info!("  Committed {} merges", match_stats.total_merges());
        if self.config.verbose {
            match_stats.print_summary();
        }

        Ok(RunState { unique, arena, match_stats })
    }
}
