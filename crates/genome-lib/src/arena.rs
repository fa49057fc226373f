//! Construct record arena
//!
//! One [`ConstructRecord`] per unique segment, preallocated up front for the
//! worst case and never freed individually. Records refer to each other by
//! index ([`RecordId`]) rather than by reference, so chains can be spliced
//! without any ownership juggling.
//!
//! Alongside the records sits a parallel array of [`EndStatusEntry`] values.
//! `is_open_end` marks records whose suffix has not yet been matched, and
//! `jump_to_next` lets a scan hop straight to the next open record instead of
//! stepping over closed ones.
//!
//! Field access discipline:
//! - `segment` is written once when the slot is claimed, then read freely.
//! - `end_hash` and the end-status array are written only between barriers
//!   (by the claiming worker, the owning lane, or the bookkeeping lane).
//! - Chain links live behind a per-record mutex and are only changed while
//!   every record a merge touches is locked (see [`RecordArena::lock_records`]).

use crate::error::{SequencerError, SequencerResult};
use crate::hasher::hash_bytes;
use crate::segment::Segment;
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Index of a record in the arena
pub type RecordId = usize;

/// Chain bookkeeping of one record
///
/// `start_of_chain` is meaningful on chain tails and `end_of_chain` on chain
/// starts; `chain_length` is meaningful on chain starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLinks {
    /// No other record links to this one
    pub is_chain_start: bool,
    /// First record of the chain (valid on the tail)
    pub start_of_chain: RecordId,
    /// Last record of the chain (valid on the start)
    pub end_of_chain: RecordId,
    /// Following record, if any
    pub next_in_chain: Option<RecordId>,
    /// Characters shared with the following record
    pub overlap_with_next: usize,
    /// Characters spanned by the chain (valid on the start)
    pub chain_length: usize,
}

impl ChainLinks {
    fn singleton(id: RecordId, segment_length: usize) -> Self {
        Self {
            is_chain_start: true,
            start_of_chain: id,
            end_of_chain: id,
            next_in_chain: None,
            overlap_with_next: 0,
            chain_length: segment_length,
        }
    }
}

/// Per-unique-segment metadata
#[derive(Debug)]
pub struct ConstructRecord {
    segment: OnceLock<Segment>,
    end_hash: AtomicU64,
    links: Mutex<ChainLinks>,
}

/// Open-end flag and skip distance for one record
#[derive(Debug)]
pub struct EndStatusEntry {
    is_open_end: AtomicBool,
    jump_to_next: AtomicUsize,
}

impl EndStatusEntry {
    fn new() -> Self {
        Self { is_open_end: AtomicBool::new(true), jump_to_next: AtomicUsize::new(1) }
    }
}

/// Fixed-capacity record arena with a shared claim cursor
#[derive(Debug)]
pub struct RecordArena {
    segment_length: usize,
    records: Vec<ConstructRecord>,
    end_status: Vec<EndStatusEntry>,
    cursor: AtomicUsize,
}

impl RecordArena {
    /// Preallocate `capacity` records for segments of `segment_length`
    pub fn new(capacity: usize, segment_length: usize) -> Self {
        let records = (0..capacity)
            .map(|id| ConstructRecord {
                segment: OnceLock::new(),
                end_hash: AtomicU64::new(0),
                links: Mutex::new(ChainLinks::singleton(id, segment_length)),
            })
            .collect();
        let end_status = (0..capacity).map(|_| EndStatusEntry::new()).collect();
        Self { segment_length, records, end_status, cursor: AtomicUsize::new(0) }
    }

    /// Preallocated number of records
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of claimed records
    #[inline]
    pub fn len(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.capacity())
    }

    /// Whether no record has been claimed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Segment length shared by every record
    #[inline]
    pub fn segment_length(&self) -> usize {
        self.segment_length
    }

    /// Claim the next free slot for `segment`
    ///
    /// Also seeds the record's end hash with the hash of its longest proper
    /// suffix, ready for the first matching round.
    ///
    /// # Errors
    /// Returns [`SequencerError::CapacityExceeded`] once every slot is taken.
    pub fn claim(&self, segment: Segment) -> SequencerResult<RecordId> {
        let id = self.cursor.fetch_add(1, Ordering::AcqRel);
        let Some(record) = self.records.get(id) else {
            return Err(SequencerError::CapacityExceeded {
                required: id + 1,
                capacity: self.capacity(),
            });
        };
        let suffix = segment.suffix(self.segment_length - 1);
        record.end_hash.store(hash_bytes(suffix), Ordering::Relaxed);
        // The cursor hands out each slot once
        let fresh = record.segment.set(segment).is_ok();
        debug_assert!(fresh, "record {id} claimed twice");
        Ok(id)
    }

    /// Segment of a claimed record
    #[inline]
    pub fn segment(&self, id: RecordId) -> Option<&Segment> {
        self.records.get(id).and_then(|r| r.segment.get())
    }

    /// Hash of the suffix currently being matched
    #[inline]
    pub fn end_hash(&self, id: RecordId) -> u64 {
        self.records[id].end_hash.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_end_hash(&self, id: RecordId, hash: u64) {
        self.records[id].end_hash.store(hash, Ordering::Relaxed);
    }

    /// Snapshot of a record's chain links
    pub fn links(&self, id: RecordId) -> ChainLinks {
        self.records[id].links.lock().clone()
    }

    /// Whether the record can still be extended forward
    #[inline]
    pub fn is_open_end(&self, id: RecordId) -> bool {
        self.end_status[id].is_open_end.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn close_end(&self, id: RecordId) {
        self.end_status[id].is_open_end.store(false, Ordering::Relaxed);
    }

    /// Distance to the next open record
    #[inline]
    pub fn jump_to_next(&self, id: RecordId) -> usize {
        self.end_status[id].jump_to_next.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_jump_to_next(&self, id: RecordId, jump: usize) {
        self.end_status[id].jump_to_next.store(jump, Ordering::Relaxed);
    }

    /// Ids of every claimed record that still starts a chain
    pub fn chain_starts(&self) -> impl Iterator<Item = RecordId> + '_ {
        (0..self.len()).filter(move |&id| self.records[id].links.lock().is_chain_start)
    }

    /// Follow `next_in_chain` from `start`
    pub fn walk(&self, start: RecordId) -> ChainWalk<'_> {
        ChainWalk { arena: self, next: Some(start) }
    }

    /// Lock the chain links of every distinct id in `ids`
    ///
    /// Locks are taken in ascending id order, so two workers locking
    /// overlapping sets can never deadlock.
    pub(crate) fn lock_records(&self, ids: &[RecordId]) -> ChainGuard<'_> {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let held = sorted.into_iter().map(|id| (id, self.records[id].links.lock())).collect();
        ChainGuard { held }
    }
}

/// Iterator over the records of one chain
pub struct ChainWalk<'a> {
    arena: &'a RecordArena,
    next: Option<RecordId>,
}

impl Iterator for ChainWalk<'_> {
    /// `(record, links)` for each link of the chain
    type Item = (RecordId, ChainLinks);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let links = self.arena.links(id);
        self.next = links.next_in_chain;
        Some((id, links))
    }
}

/// Chain links of a set of records, all locked at once
pub(crate) struct ChainGuard<'a> {
    held: Vec<(RecordId, MutexGuard<'a, ChainLinks>)>,
}

impl ChainGuard<'_> {
    fn position(&self, id: RecordId) -> usize {
        match self.held.binary_search_by_key(&id, |(held, _)| *held) {
            Ok(pos) => pos,
            Err(_) => panic!("record {id} is not locked by this guard"),
        }
    }
}

impl Index<RecordId> for ChainGuard<'_> {
    type Output = ChainLinks;

    fn index(&self, id: RecordId) -> &ChainLinks {
        &self.held[self.position(id)].1
    }
}

impl IndexMut<RecordId> for ChainGuard<'_> {
    fn index_mut(&mut self, id: RecordId) -> &mut ChainLinks {
        let pos = self.position(id);
        &mut self.held[pos].1
    }
}
