//! Step 1: segment deduplication
//!
//! Each lane inserts its own contiguous slice of the input multiset into the
//! shared unique-segment table. The table locks per bucket, so lanes only wait
//! on each other when their segments hash to the same bucket.

use crate::segment::SegmentSet;
use crate::sequencer::lanes::lane_range;
use crate::unique_segments::UniqueSegmentTable;

/// Insert this lane's share of `segments` into `table`
///
/// Returns the number of segments the lane inserted, duplicates included.
pub(crate) fn dedup_lane(
    lane: usize,
    num_lanes: usize,
    segments: &SegmentSet,
    table: &UniqueSegmentTable,
) -> usize {
    let range = lane_range(lane, num_lanes, segments.len());
    let count = range.len();
    for segment in &segments.as_slice()[range] {
        table.insert(segment);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lanes_together_dedup_everything() {
        let segments =
            SegmentSet::from_strs(&["aaa", "aag", "aaa", "agc", "aag", "aaa", "agc"]).unwrap();
        let table = UniqueSegmentTable::new(5);

        let lanes = 3;
        let inserted: usize =
            (0..lanes).map(|lane| dedup_lane(lane, lanes, &segments, &table)).sum();

        assert_eq!(inserted, segments.len());
        assert_eq!(table.len(), 3);
        for s in ["aaa", "aag", "agc"] {
            assert!(table.contains(s.as_bytes()));
        }
    }
}
