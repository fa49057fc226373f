//! Concurrent unique-segment table
//!
//! Deduplicates the redundant segment multiset. The table is an array of hash
//! buckets (placed by [`hash_bytes`]) each holding a chain of entries kept
//! sorted by segment bytes. Every mutation locks only the bucket it touches, so
//! workers inserting disjoint ranges of the input contend only when their
//! segments hash to the same bucket.
//!
//! Once deduplication completes the table is read-only except for the record
//! index stored in each entry, which the indexing phase fills in.

use crate::arena::RecordId;
use crate::hasher::hash_bytes;
use crate::segment::Segment;
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

const UNASSIGNED: usize = usize::MAX;

/// One distinct segment value and the record that represents it
#[derive(Debug)]
pub struct UniqueSegmentEntry {
    segment: Segment,
    record: AtomicUsize,
}

impl UniqueSegmentEntry {
    fn new(segment: Segment) -> Self {
        Self { segment, record: AtomicUsize::new(UNASSIGNED) }
    }

    /// The stored (representative) segment
    #[inline]
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Record index, once the indexing phase has assigned one
    #[inline]
    pub fn record(&self) -> Option<RecordId> {
        match self.record.load(Ordering::Acquire) {
            UNASSIGNED => None,
            id => Some(id),
        }
    }

    pub(crate) fn assign_record(&self, id: RecordId) {
        self.record.store(id, Ordering::Release);
    }
}

/// Hash set of distinct segments with per-bucket locking
#[derive(Debug)]
pub struct UniqueSegmentTable {
    buckets: Vec<Mutex<Vec<UniqueSegmentEntry>>>,
    len: AtomicUsize,
}

impl UniqueSegmentTable {
    /// Create a table with `num_buckets` buckets (at least one)
    pub fn new(num_buckets: usize) -> Self {
        let buckets = (0..num_buckets.max(1)).map(|_| Mutex::new(Vec::new())).collect();
        Self { buckets, len: AtomicUsize::new(0) }
    }

    /// Number of buckets
    #[inline]
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Number of distinct segments inserted so far
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn bucket_of(&self, bytes: &[u8]) -> usize {
        (hash_bytes(bytes) % self.buckets.len() as u64) as usize
    }

    /// Insert a segment and return the representative for its value
    ///
    /// If an equal segment is already present the table is unchanged and the
    /// stored copy is returned. Safe to call from many threads at once.
    pub fn insert(&self, segment: &Segment) -> Segment {
        let mut chain = self.buckets[self.bucket_of(segment.as_bytes())].lock();
        match chain.binary_search_by(|e| e.segment.as_bytes().cmp(segment.as_bytes())) {
            Ok(pos) => chain[pos].segment.clone(),
            Err(pos) => {
                chain.insert(pos, UniqueSegmentEntry::new(segment.clone()));
                self.len.fetch_add(1, Ordering::AcqRel);
                segment.clone()
            }
        }
    }

    /// Whether a segment with these contents is present
    pub fn contains(&self, bytes: &[u8]) -> bool {
        let chain = self.buckets[self.bucket_of(bytes)].lock();
        chain.binary_search_by(|e| e.segment.as_bytes().cmp(bytes)).is_ok()
    }

    /// Record index assigned to the segment with these contents
    pub fn record_of(&self, bytes: &[u8]) -> Option<RecordId> {
        let chain = self.buckets[self.bucket_of(bytes)].lock();
        chain
            .binary_search_by(|e| e.segment.as_bytes().cmp(bytes))
            .ok()
            .and_then(|pos| chain[pos].record())
    }

    /// Visit every entry in a contiguous range of buckets
    ///
    /// Each bucket stays locked while its chain is visited.
    pub fn for_each_in_buckets<F>(&self, range: Range<usize>, mut f: F)
    where
        F: FnMut(&UniqueSegmentEntry),
    {
        for bucket in &self.buckets[range] {
            let chain = bucket.lock();
            for entry in chain.iter() {
                f(entry);
            }
        }
    }

    /// Chain length of every bucket, in bucket order
    pub fn bucket_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(|b| b.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_is_idempotent() {
        let table = UniqueSegmentTable::new(16);
        let a = Segment::from("gatc");
        let first = table.insert(&a);
        assert_eq!(table.len(), 1);

        let again = table.insert(&Segment::from("gatc"));
        assert_eq!(table.len(), 1);
        assert!(again.shares_buffer(&first));
        assert!(table.contains(b"gatc"));
        assert!(!table.contains(b"gatg"));
    }

    #[test]
    fn test_chains_stay_sorted() {
        // One bucket forces every segment into the same chain
        let table = UniqueSegmentTable::new(1);
        for s in ["tcgg", "atcg", "gcag", "cagc", "atcg"] {
            table.insert(&Segment::from(s));
        }
        let mut seen = Vec::new();
        table.for_each_in_buckets(0..1, |e| seen.push(e.segment().to_string()));
        assert_eq!(seen, vec!["atcg", "cagc", "gcag", "tcgg"]);
    }

    #[test]
    fn test_record_of_before_and_after_assignment() {
        let table = UniqueSegmentTable::new(8);
        table.insert(&Segment::from("aag"));
        assert_eq!(table.record_of(b"aag"), None);

        table.for_each_in_buckets(0..table.num_buckets(), |e| e.assign_record(3));
        assert_eq!(table.record_of(b"aag"), Some(3));
        assert_eq!(table.record_of(b"aaa"), None);
    }

    #[test]
    fn test_concurrent_inserts_keep_one_copy() {
        let table = Arc::new(UniqueSegmentTable::new(4));
        let values = ["aaa", "aag", "agc", "gca", "cat"];

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let table = Arc::clone(&table);
                scope.spawn(move || {
                    for _ in 0..50 {
                        for v in values {
                            table.insert(&Segment::from(v));
                        }
                    }
                });
            }
        });

        assert_eq!(table.len(), values.len());
        assert_eq!(table.bucket_sizes().sum::<usize>(), values.len());
    }
}
