//! Step 3: overlap matching
//!
//! Rounds run from the longest proper overlap (`segment_length - 1`) down to a
//! single character. In each round every lane scans its own range of records,
//! hopping over closed ones with `jump_to_next`, and tries to extend each open
//! record R with a record C whose prefix equals R's suffix of the current
//! length. A successful merge splices R's chain onto C's chain.
//!
//! Round structure (per lane):
//!
//! ```text
//! scan own range, merge     -- barrier --
//! lane 0: refresh open ends -- barrier --
//! ```
//!
//! The refresh pass recomputes `jump_to_next` and the end hash of every open
//! record for the next, shorter suffix. It runs on lane 0 alone.

use crate::arena::{RecordArena, RecordId};
use crate::hasher::hash_bytes;
use crate::prefix_table::PrefixHashTables;
use crate::sequencer::lanes::lane_range;
use std::sync::Barrier;
use tracing::debug;

/// Run every matching round for one lane
///
/// Returns the number of merges this lane committed, indexed by overlap
/// length (index 0 is unused).
pub(crate) fn match_lane(
    lane: usize,
    num_lanes: usize,
    arena: &RecordArena,
    prefixes: &PrefixHashTables,
    barrier: &Barrier,
) -> Vec<usize> {
    let segment_length = arena.segment_length();
    let range = lane_range(lane, num_lanes, arena.len());
    let mut merges = vec![0; segment_length];

    for overlap in (1..segment_length).rev() {
        let table = prefixes.table(overlap);

        let mut end = range.start;
        while end < range.end {
            if arena.is_open_end(end) {
                for &start in table.candidates(arena.end_hash(end)) {
                    if try_merge(arena, end, start, overlap) {
                        merges[overlap] += 1;
                        break;
                    }
                }
            }
            end += arena.jump_to_next(end);
        }

        barrier.wait();

        if lane == 0 {
            debug!("  overlap {}: lane 0 merged {}", overlap, merges[overlap]);
            if overlap > 1 {
                refresh_open_ends(arena, overlap - 1);
            }
        }

        barrier.wait();
    }

    merges
}

/// Try to append the chain starting at `start` to the chain ending at `end`
///
/// The characters are compared first since hash buckets also hold unrelated
/// prefixes. The chain endpoints are then snapshotted, locked together, and
/// re-validated; if another lane changed them in between, the snapshot is
/// retaken.
pub(crate) fn try_merge(
    arena: &RecordArena,
    end: RecordId,
    start: RecordId,
    overlap: usize,
) -> bool {
    let (Some(end_segment), Some(start_segment)) = (arena.segment(end), arena.segment(start))
    else {
        return false;
    };
    if start_segment.prefix(overlap) != end_segment.suffix(overlap) {
        return false;
    }

    loop {
        let Some(plan) = plan_merge(arena, end, start) else {
            return false;
        };
        if commit_merge(arena, end, start, overlap, plan) {
            return true;
        }
    }
}

/// Chain endpoints a merge was planned against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergePlan {
    /// First record of the chain ending at `end`
    end_head: RecordId,
    /// Last record of the chain starting at `start`
    start_tail: RecordId,
}

/// Snapshot the endpoints of both chains without holding any lock
///
/// Returns `None` if `start` no longer begins a chain, or if it begins the
/// chain `end` belongs to.
pub(crate) fn plan_merge(arena: &RecordArena, end: RecordId, start: RecordId) -> Option<MergePlan> {
    let end_head = arena.links(end).start_of_chain;
    let start_links = arena.links(start);
    // A record whose chain already begins at `start` would close a loop
    if !start_links.is_chain_start || end_head == start {
        return None;
    }
    Some(MergePlan { end_head, start_tail: start_links.end_of_chain })
}

/// Lock every record of `plan` and splice the chains if it still holds
///
/// Returns false without touching the arena when another merge changed one
/// of the planned endpoints.
pub(crate) fn commit_merge(
    arena: &RecordArena,
    end: RecordId,
    start: RecordId,
    overlap: usize,
    plan: MergePlan,
) -> bool {
    let MergePlan { end_head, start_tail } = plan;
    let mut guard = arena.lock_records(&[end, start, end_head, start_tail]);
    if guard[end].start_of_chain != end_head
        || !guard[start].is_chain_start
        || guard[start].end_of_chain != start_tail
    {
        return false;
    }

    let start_chain_length = guard[start].chain_length;
    guard[start].is_chain_start = false;
    guard[start_tail].start_of_chain = end_head;
    guard[end].next_in_chain = Some(start);
    guard[end].overlap_with_next = overlap;

    let head = &mut guard[end_head];
    head.end_of_chain = start_tail;
    head.chain_length = head.chain_length + start_chain_length - overlap;

    arena.close_end(end);
    true
}

/// Recompute skip distances and end hashes for the next round
///
/// Every open record gets the hash of its last `suffix_length` characters and
/// a `jump_to_next` pointing at the next open record. Closed records keep
/// their old jumps, which can only undershoot since records never reopen.
pub(crate) fn refresh_open_ends(arena: &RecordArena, suffix_length: usize) {
    let len = arena.len();
    if len == 0 {
        return;
    }

    let rehash = |id: RecordId| {
        if let Some(segment) = arena.segment(id) {
            arena.set_end_hash(id, hash_bytes(segment.suffix(suffix_length)));
        }
    };

    // First open record after 0
    let mut i = 1;
    while i < len && !arena.is_open_end(i) {
        i += arena.jump_to_next(i);
    }

    // Record 0 is always where scans begin, so it keeps a jump even when closed
    arena.set_jump_to_next(0, i.max(1));
    if arena.is_open_end(0) {
        rehash(0);
    }

    let mut j = 0;
    while i < len {
        if arena.is_open_end(i) {
            rehash(i);
            arena.set_jump_to_next(j, (i - j).max(1));
            j = i;
        }
        i += arena.jump_to_next(i);
    }
    arena.set_jump_to_next(j, (i - j).max(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;

    fn arena_of(values: &[&str]) -> RecordArena {
        let arena = RecordArena::new(values.len(), values[0].len());
        for v in values {
            arena.claim(Segment::from(*v)).unwrap();
        }
        arena
    }

    #[test]
    fn test_merge_splices_chains() {
        let arena = arena_of(&["atcg", "tcgg"]);
        assert!(try_merge(&arena, 0, 1, 3));

        let head = arena.links(0);
        assert!(head.is_chain_start);
        assert_eq!(head.next_in_chain, Some(1));
        assert_eq!(head.overlap_with_next, 3);
        assert_eq!(head.end_of_chain, 1);
        assert_eq!(head.chain_length, 5);

        let tail = arena.links(1);
        assert!(!tail.is_chain_start);
        assert_eq!(tail.start_of_chain, 0);
        assert!(!arena.is_open_end(0));
        assert!(arena.is_open_end(1));
    }

    #[test]
    fn test_merge_requires_matching_characters() {
        let arena = arena_of(&["atcg", "tcag"]);
        assert!(!try_merge(&arena, 0, 1, 3));
        assert!(arena.is_open_end(0));
        assert!(arena.links(1).is_chain_start);
    }

    #[test]
    fn test_merge_refuses_own_chain_head() {
        // "aaa" overlaps itself, but must not link to itself
        let arena = arena_of(&["aaa"]);
        assert!(!try_merge(&arena, 0, 0, 2));

        // Two records that overlap both ways: the second merge would close a loop
        let arena = arena_of(&["abab", "baba"]);
        assert!(try_merge(&arena, 0, 1, 3));
        assert!(!try_merge(&arena, 1, 0, 3));
        assert_eq!(arena.links(1).next_in_chain, None);
    }

    #[test]
    fn test_merge_refuses_non_start() {
        let arena = arena_of(&["aag", "cag", "agc"]);
        assert!(try_merge(&arena, 0, 2, 2));
        assert!(!try_merge(&arena, 1, 2, 2));
    }

    #[test]
    fn test_commit_rejects_moved_end_head() {
        let arena = arena_of(&["aaab", "aabc", "abcd"]);
        let plan = plan_merge(&arena, 1, 2).unwrap();

        // Record 1 joins the chain of record 0 after the plan was taken
        assert!(try_merge(&arena, 0, 1, 3));
        assert!(!commit_merge(&arena, 1, 2, 3, plan));
        assert!(arena.links(2).is_chain_start);
        assert_eq!(arena.links(1).next_in_chain, None);
        assert!(arena.is_open_end(1));
        assert_eq!(arena.links(0).chain_length, 5);

        assert!(try_merge(&arena, 1, 2, 3));
        let head = arena.links(0);
        assert_eq!(head.end_of_chain, 2);
        assert_eq!(head.chain_length, 6);
        assert_eq!(arena.links(2).start_of_chain, 0);
    }

    #[test]
    fn test_commit_rejects_moved_start_tail() {
        let arena = arena_of(&["aaab", "aabc", "abcd"]);
        let plan = plan_merge(&arena, 0, 1).unwrap();

        // The chain starting at record 1 grows after the plan was taken
        assert!(try_merge(&arena, 1, 2, 3));
        assert!(!commit_merge(&arena, 0, 1, 3, plan));
        assert!(arena.links(1).is_chain_start);
        assert!(arena.is_open_end(0));
        assert_eq!(arena.links(0).chain_length, 4);

        assert!(try_merge(&arena, 0, 1, 3));
        let head = arena.links(0);
        assert_eq!(head.end_of_chain, 2);
        assert_eq!(head.chain_length, 6);
        assert_eq!(arena.links(2).start_of_chain, 0);
    }

    #[test]
    fn test_concurrent_merges_on_shared_endpoints() {
        // 0 and 3 compete for record 1 while 1 extends onto 2
        let merges: [(RecordId, RecordId); 3] = [(0, 1), (3, 1), (1, 2)];

        for _ in 0..200 {
            let arena = arena_of(&["aaab", "aabc", "abcd", "caab"]);
            let barrier = Barrier::new(merges.len());

            let results: Vec<bool> = std::thread::scope(|s| {
                let handles: Vec<_> = merges
                    .iter()
                    .map(|&(end, start)| {
                        let (arena, barrier) = (&arena, &barrier);
                        s.spawn(move || {
                            barrier.wait();
                            try_merge(arena, end, start, 3)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert!(results[2]);
            assert!(results[0] != results[1], "record 1 merged {results:?}");
            let (winner, loser) = if results[0] { (0, 3) } else { (3, 0) };

            let predecessors = (0..arena.len())
                .filter(|&id| arena.links(id).next_in_chain == Some(1))
                .count();
            assert_eq!(predecessors, 1);

            let walked: Vec<_> =
                arena.walk(winner).take(arena.len() + 1).map(|(id, _)| id).collect();
            assert_eq!(walked, vec![winner, 1, 2]);
            assert_eq!(arena.chain_starts().collect::<Vec<_>>(), vec![0, 3]);

            let head = arena.links(winner);
            assert_eq!(head.end_of_chain, 2);
            assert_eq!(head.chain_length, 6);
            assert_eq!(arena.links(2).start_of_chain, winner);

            let other = arena.links(loser);
            assert_eq!(other.chain_length, 4);
            assert_eq!(other.next_in_chain, None);
            assert!(arena.is_open_end(loser));
            assert!(!arena.is_open_end(winner));
            assert!(!arena.is_open_end(1));
            assert!(arena.is_open_end(2));
        }
    }

    #[test]
    fn test_chain_length_accumulates_across_merges() {
        let arena = arena_of(&["gatc", "atcg", "tcgg"]);
        assert!(try_merge(&arena, 1, 2, 3));
        assert!(try_merge(&arena, 0, 1, 3));
        let head = arena.links(0);
        assert_eq!(head.end_of_chain, 2);
        assert_eq!(head.chain_length, 6);
        assert_eq!(arena.links(2).start_of_chain, 0);
    }

    #[test]
    fn test_refresh_skips_closed_records() {
        let arena = arena_of(&["aaaa", "cccc", "gggg", "tttt", "acgt"]);
        arena.close_end(1);
        arena.close_end(2);
        refresh_open_ends(&arena, 2);

        assert_eq!(arena.jump_to_next(0), 3);
        assert_eq!(arena.jump_to_next(3), 1);
        assert_eq!(arena.jump_to_next(4), 1);
        assert_eq!(arena.end_hash(3), hash_bytes(b"tt"));
        assert_eq!(arena.end_hash(4), hash_bytes(b"gt"));
        // Closed records keep their stale hash
        assert_eq!(arena.end_hash(1), hash_bytes(b"ccc"));
    }

    #[test]
    fn test_refresh_with_closed_first_record() {
        let arena = arena_of(&["aaaa", "cccc", "gggg"]);
        arena.close_end(0);
        arena.close_end(1);
        refresh_open_ends(&arena, 1);
        assert_eq!(arena.jump_to_next(0), 2);
        assert_eq!(arena.jump_to_next(2), 1);
        assert_eq!(arena.end_hash(2), hash_bytes(b"g"));
        assert_eq!(arena.end_hash(0), hash_bytes(b"aaa"));
    }

    #[test]
    fn test_single_lane_rounds_build_one_chain() {
        use crate::prefix_table::PrefixTableBuilder;

        let arena = arena_of(&["agc", "aaa", "aag"]);
        let builder = PrefixTableBuilder::new(3, 11);
        for id in 0..arena.len() {
            builder.insert_prefixes(id, arena.segment(id).unwrap());
        }
        let prefixes = builder.freeze();
        let barrier = Barrier::new(1);

        let merges = match_lane(0, 1, &arena, &prefixes, &barrier);
        assert_eq!(merges.iter().sum::<usize>(), 2);
        assert_eq!(arena.chain_starts().collect::<Vec<_>>(), vec![1]);
        assert_eq!(arena.links(1).chain_length, 5);
    }
}
