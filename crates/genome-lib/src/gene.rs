//! Source genes and segment covers
//!
//! Drives the sequencer end to end: a random gene over `acgt`, and a cover
//! of that gene by fixed-length segments. The cover draws random start
//! positions, then adds segments wherever too many consecutive start
//! positions are missing, so that every position is covered and consecutive
//! segments overlap by at least one character.

use crate::constants::{
    max_unique_segments, DEFAULT_GENE_LENGTH, DEFAULT_MIN_NUM_SEGMENTS, DEFAULT_SEED,
    DEFAULT_SEGMENT_LENGTH, MIN_SEGMENT_LENGTH, NUCLEOTIDES,
};
use crate::error::{SequencerError, SequencerResult};
use crate::segment::{Segment, SegmentSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters for generating a gene and its segment cover
#[derive(Debug, Clone)]
pub struct CoverConfig {
    /// Length of the generated gene
    pub gene_length: usize,

    /// Length of every segment
    pub segment_length: usize,

    /// Number of randomly placed segments drawn before filling holes
    pub min_num_segments: usize,

    /// Seed for the random generator
    pub seed: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            gene_length: DEFAULT_GENE_LENGTH,
            segment_length: DEFAULT_SEGMENT_LENGTH,
            min_num_segments: DEFAULT_MIN_NUM_SEGMENTS,
            seed: DEFAULT_SEED,
        }
    }
}

impl CoverConfig {
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

    /// Seeded generator for this configuration
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

/// A source sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    contents: Vec<u8>,
}

impl Gene {
    /// Random gene of `length` nucleotides
    pub fn random<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Self {
        let contents = (0..length)
            .map(|_| NUCLEOTIDES[rng.gen_range(0..NUCLEOTIDES.len())])
            .collect();
        Self { contents }
    }

    /// Wrap existing contents
    pub fn from_bytes(contents: impl Into<Vec<u8>>) -> Self {
        Self { contents: contents.into() }
    }

    /// Gene contents
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.contents
    }

    /// Gene length
    #[inline]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the gene is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Cover `gene` with segments of `segment_length`
///
/// Draws `min_num_segments` random windows, makes sure the first window is
/// present, then adds a window wherever `segment_length - 1` consecutive start
/// positions are uncovered. Windows taken from the same start share one
/// buffer.
///
/// # Errors
/// Returns an error if the segment length is below 2 or exceeds the gene.
pub fn generate_cover<R: Rng + ?Sized>(
    gene: &Gene,
    segment_length: usize,
    min_num_segments: usize,
    rng: &mut R,
) -> SequencerResult<SegmentSet> {
    let config = CoverConfig {
        gene_length: gene.len(),
        segment_length,
        min_num_segments,
        seed: DEFAULT_SEED,
    };
    config.validate()?;

    let bytes = gene.as_bytes();
    let num_start = max_unique_segments(gene.len(), segment_length);
    let mut windows: Vec<Option<Segment>> = vec![None; num_start];
    let mut window = |start: usize| -> Segment {
        windows[start]
            .get_or_insert_with(|| Segment::new(&bytes[start..start + segment_length]))
            .clone()
    };

    let mut started = vec![false; num_start];
    let mut set = SegmentSet::with_capacity(segment_length, min_num_segments + 1);

    for _ in 0..min_num_segments {
        let start = rng.gen_range(0..num_start);
        started[start] = true;
        set.push(window(start))?;
    }

    if !started[0] {
        started[0] = true;
        set.push(window(0))?;
    }

    // Fill holes of segment_length - 1 missing starts
    let max_zero_run = segment_length - 1;
    let mut i = 0;
    while i < num_start {
        let stop = (i + max_zero_run).min(num_start);
        while i < stop && !started[i] {
            i += 1;
        }
        if i == stop {
            i -= 1;
            started[i] = true;
            set.push(window(i))?;
        }
        i += 1;
    }

    Ok(set)
}
