//! Static work partitioning across worker lanes
//!
//! Every phase splits its items into one contiguous range per lane. Ranges use
//! a rounded partition size and the last lane absorbs whatever is left, so the
//! ranges are disjoint and together cover `0..total`.

use std::ops::Range;

/// Range of items owned by `lane` out of `num_lanes`
pub fn lane_range(lane: usize, num_lanes: usize, total: usize) -> Range<usize> {
    let num_lanes = num_lanes.max(1);
    let partition_size = (total + num_lanes / 2) / num_lanes;
    let start = (lane * partition_size).min(total);
    let stop = if lane + 1 == num_lanes {
        total
    } else {
        (start + partition_size).min(total)
    };
    start..stop
}
