//! Run statistics
//!
//! Occupancy of the unique-segment table and merge counts per matching round,
//! logged via tracing when a run is verbose.

use crate::unique_segments::UniqueSegmentTable;
use tracing::info;

/// Bucket occupancy of the unique-segment table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStatistics {
    /// Total number of buckets
    pub num_buckets: usize,

    /// Distinct segments stored
    pub num_entries: usize,

    /// Buckets with no entry
    pub num_empty_buckets: usize,

    /// Buckets holding exactly one entry
    pub num_singleton_buckets: usize,

    /// Longest bucket chain
    pub max_chain_length: usize,
}

impl TableStatistics {
    /// Collect statistics from a table
    pub fn from_table(table: &UniqueSegmentTable) -> Self {
        let mut stats = Self::default();
        for size in table.bucket_sizes() {
            stats.add_bucket(size);
        }
        stats
    }

    /// Record one bucket of the given chain length
    pub fn add_bucket(&mut self, size: usize) {
        self.num_buckets += 1;
        self.num_entries += size;
        match size {
            0 => self.num_empty_buckets += 1,
            1 => self.num_singleton_buckets += 1,
            _ => {}
        }
        self.max_chain_length = self.max_chain_length.max(size);
    }

    /// Log statistics summary via tracing
    pub fn print_summary(&self) {
        let pct = |n: usize| (n as f64 * 100.0) / self.num_buckets.max(1) as f64;
        info!("Unique Segment Table:");
        info!("  Buckets: {}", self.num_buckets);
        info!("  Entries: {}", self.num_entries);
        info!("  Empty buckets: {} ({:.2}%)", self.num_empty_buckets, pct(self.num_empty_buckets));
        info!(
            "  Singleton buckets: {} ({:.2}%)",
            self.num_singleton_buckets,
            pct(self.num_singleton_buckets)
        );
        info!("  Max chain length: {}", self.max_chain_length);
    }
}

/// Merges committed in each matching round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStatistics {
    // merges_by_overlap[len] = merges at overlap length `len`
    merges_by_overlap: Vec<usize>,
}

impl MatchStatistics {
    /// Sum per-lane merge counts (each indexed by overlap length)
    pub fn from_lanes(segment_length: usize, lanes: Vec<Vec<usize>>) -> Self {
        let mut merges_by_overlap = vec![0; segment_length];
        for lane in lanes {
            for (total, merges) in merges_by_overlap.iter_mut().zip(lane) {
                *total += merges;
            }
        }
        Self { merges_by_overlap }
    }

    /// Merges committed at overlap length `overlap`
    pub fn merges_at(&self, overlap: usize) -> usize {
        self.merges_by_overlap.get(overlap).copied().unwrap_or(0)
    }

    /// Merges committed over all rounds
    pub fn total_merges(&self) -> usize {
        self.merges_by_overlap.iter().sum()
    }

    /// Log statistics summary via tracing
    pub fn print_summary(&self) {
        info!("Matching Rounds:");
        info!("  Total merges: {}", self.total_merges());
        for (overlap, &merges) in self.merges_by_overlap.iter().enumerate().skip(1).rev() {
            if merges > 0 {
                info!("  overlap {}: {} merges", overlap, merges);
            }
        }
    }
}
