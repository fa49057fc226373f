//! Step 2: record and prefix-table construction
//!
//! Lanes split the unique-segment table by bucket. For every segment found in
//! its buckets a lane claims an arena slot through the shared cursor, links the
//! table entry to it, and indexes every proper prefix of the segment.
//!
//! For the segment "atcg" the end hashes are those of "t", "tc", "tcg"; for
//! "tcgg" the start hashes are those of "t", "tc", "tcg". A shared substring
//! such as "tcg" is what lets a later round join `a[tcg] + [tcg]g`.

use crate::arena::RecordArena;
use crate::error::SequencerResult;
use crate::prefix_table::PrefixTableBuilder;
use crate::sequencer::lanes::lane_range;
use crate::unique_segments::UniqueSegmentTable;

/// Claim records and index prefixes for this lane's share of buckets
///
/// Returns the number of records the lane claimed. Stops at the first claim
/// that overflows the arena.
pub(crate) fn index_lane(
    lane: usize,
    num_lanes: usize,
    table: &UniqueSegmentTable,
    arena: &RecordArena,
    prefixes: &PrefixTableBuilder,
) -> SequencerResult<usize> {
    let range = lane_range(lane, num_lanes, table.num_buckets());
    let mut claimed = 0;
    let mut result = Ok(());

    table.for_each_in_buckets(range, |entry| {
        if result.is_err() {
            return;
        }
        match arena.claim(entry.segment().clone()) {
            Ok(id) => {
                entry.assign_record(id);
                prefixes.insert_prefixes(id, entry.segment());
                claimed += 1;
            }
            Err(e) => result = Err(e),
        }
    });

    result.map(|()| claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequencerError;
    use crate::hasher::hash_bytes;
    use crate::segment::Segment;

    fn table_of(values: &[&str]) -> UniqueSegmentTable {
        let table = UniqueSegmentTable::new(7);
        for v in values {
            table.insert(&Segment::from(*v));
        }
        table
    }

    #[test]
    fn test_every_unique_segment_gets_a_record() {
        let table = table_of(&["atcg", "gcag", "tcgg", "cagc", "gatc"]);
        let arena = RecordArena::new(7, 4);
        let builder = PrefixTableBuilder::new(4, 10);

        let lanes = 2;
        let claimed: usize = (0..lanes)
            .map(|lane| index_lane(lane, lanes, &table, &arena, &builder).unwrap())
            .sum();
        assert_eq!(claimed, 5);
        assert_eq!(arena.len(), 5);

        for v in ["atcg", "gcag", "tcgg", "cagc", "gatc"] {
            let id = table.record_of(v.as_bytes()).unwrap();
            assert_eq!(arena.segment(id).unwrap().as_bytes(), v.as_bytes());
        }

        let prefixes = builder.freeze();
        let tcgg = table.record_of(b"tcgg").unwrap();
        assert!(prefixes.table(3).candidates(hash_bytes(b"tcg")).contains(&tcgg));
    }

    #[test]
    fn test_overflowing_arena_is_reported() {
        let table = table_of(&["aaa", "aag", "agc"]);
        let arena = RecordArena::new(2, 3);
        let builder = PrefixTableBuilder::new(3, 5);

        let err = index_lane(0, 1, &table, &arena, &builder).unwrap_err();
        assert!(matches!(err, SequencerError::CapacityExceeded { capacity: 2, .. }));
    }
}
