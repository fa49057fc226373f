//! Per-length prefix hash tables
//!
//! For every overlap length `k` in `1..segment_length` there is one table
//! mapping the rolling hash of a segment's first `k` characters to the records
//! whose segment starts that way. A bucket holds every record whose prefix hash
//! lands in it, so hash collisions are expected: callers must compare the
//! actual characters before trusting a candidate.
//!
//! Tables are filled concurrently through [`PrefixTableBuilder`] (one lock per
//! bucket), then frozen into [`PrefixHashTables`], which is read without any
//! locking during the matching rounds.

use crate::arena::RecordId;
use crate::hasher::PrefixHashes;
use crate::segment::Segment;
use parking_lot::Mutex;

/// Concurrently writable prefix tables
#[derive(Debug)]
pub struct PrefixTableBuilder {
    segment_length: usize,
    num_buckets: usize,
    // tables[k - 1] holds prefixes of length k
    tables: Vec<Vec<Mutex<Vec<RecordId>>>>,
}

impl PrefixTableBuilder {
    /// Create empty tables for every prefix length in `1..segment_length`
    pub fn new(segment_length: usize, num_buckets: usize) -> Self {
        let num_buckets = num_buckets.max(1);
        let tables = (1..segment_length)
            .map(|_| (0..num_buckets).map(|_| Mutex::new(Vec::new())).collect())
            .collect();
        Self { segment_length, num_buckets, tables }
    }

    /// Insert `record` into the table of every proper prefix length
    ///
    /// Prefix hashes are computed incrementally, one step per length.
    pub fn insert_prefixes(&self, record: RecordId, segment: &Segment) {
        let proper = &segment.as_bytes()[..self.segment_length - 1];
        for (len, hash) in PrefixHashes::new(proper) {
            let bucket = (hash % self.num_buckets as u64) as usize;
            self.tables[len - 1][bucket].lock().push(record);
        }
    }

    /// Drop the locks and produce the read-only tables
    pub fn freeze(self) -> PrefixHashTables {
        let num_buckets = self.num_buckets;
        let tables = self
            .tables
            .into_iter()
            .map(|buckets| PrefixHashTable {
                buckets: buckets.into_iter().map(|bucket| bucket.into_inner()).collect(),
            })
            .collect();
        PrefixHashTables { segment_length: self.segment_length, num_buckets, tables }
    }
}

/// Read-only prefix table for one prefix length
#[derive(Debug)]
pub struct PrefixHashTable {
    buckets: Vec<Vec<RecordId>>,
}

impl PrefixHashTable {
    /// Records whose prefix hash shares a bucket with `hash`
    #[inline]
    pub fn candidates(&self, hash: u64) -> &[RecordId] {
        &self.buckets[(hash % self.buckets.len() as u64) as usize]
    }

    /// Total number of records in the table
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Whether the table holds no records
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

/// Read-only prefix tables for every length in `1..segment_length`
#[derive(Debug)]
pub struct PrefixHashTables {
    segment_length: usize,
    num_buckets: usize,
    tables: Vec<PrefixHashTable>,
}

impl PrefixHashTables {
    /// Table for prefixes of length `len` (`1 <= len < segment_length`)
    #[inline]
    pub fn table(&self, len: usize) -> &PrefixHashTable {
        &self.tables[len - 1]
    }

    /// Segment length the tables were built for
    pub fn segment_length(&self) -> usize {
        self.segment_length
    }

    /// Buckets per table
    pub fn num_buckets(&self) -> usize {
        self.num_buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::hash_bytes;

    #[test]
    fn test_every_proper_prefix_is_indexed() {
        let builder = PrefixTableBuilder::new(4, 7);
        builder.insert_prefixes(0, &Segment::from("tcgg"));
        builder.insert_prefixes(1, &Segment::from("tcga"));
        let tables = builder.freeze();

        assert_eq!(tables.segment_length(), 4);
        for len in 1..4 {
            assert_eq!(tables.table(len).len(), 2);
        }
        let hits = tables.table(3).candidates(hash_bytes(b"tcg"));
        assert!(hits.contains(&0));
        assert!(hits.contains(&1));
    }

    #[test]
    fn test_full_length_prefix_is_not_indexed() {
        // Only proper prefixes take part in overlaps
        let builder = PrefixTableBuilder::new(3, 5);
        builder.insert_prefixes(0, &Segment::from("aaa"));
        let tables = builder.freeze();
        assert_eq!(tables.table(1).len(), 1);
        assert_eq!(tables.table(2).len(), 1);
    }

    #[test]
    fn test_lookup_by_suffix_hash() {
        let builder = PrefixTableBuilder::new(4, 16);
        builder.insert_prefixes(5, &Segment::from("gcag"));
        let tables = builder.freeze();
        // "cggc" ends with "gc", and "gcag" starts with it
        let end = Segment::from("cggc");
        let hits = tables.table(2).candidates(hash_bytes(end.suffix(2)));
        assert_eq!(hits, &[5]);
    }
}
