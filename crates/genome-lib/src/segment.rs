//! Segments and segment sets
//!
//! A [`Segment`] is an immutable, fixed-length character buffer sampled from
//! the source sequence. Copies share one allocation, so handing a segment to
//! the unique-segment table and keeping it in the input set costs a reference
//! count, not a copy.
//!
//! A [`SegmentSet`] is the redundant input multiset together with its fixed
//! segment length.

use crate::error::{SequencerError, SequencerResult};
use std::fmt;
use std::sync::Arc;

/// Immutable fixed-length character buffer
///
/// Equality, ordering, and hashing are those of the underlying bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment(Arc<[u8]>);

impl Segment {
    /// Create a segment from raw bytes
    pub fn new(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }

    /// Segment contents
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Segment length
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the segment is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First `len` characters
    #[inline]
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len]
    }

    /// Last `len` characters
    #[inline]
    pub fn suffix(&self, len: usize) -> &[u8] {
        &self.0[self.0.len() - len..]
    }

    /// Whether two handles share one buffer
    pub fn shares_buffer(&self, other: &Segment) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<&[u8]> for Segment {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

/// Read-only multiset of equal-length segments
#[derive(Debug, Clone)]
pub struct SegmentSet {
    length: usize,
    contents: Vec<Segment>,
}

impl SegmentSet {
    /// Create an empty set of segments of length `length`
    pub fn new(length: usize) -> Self {
        Self { length, contents: Vec::new() }
    }

    /// Create an empty set with room for `capacity` segments
    pub fn with_capacity(length: usize, capacity: usize) -> Self {
        Self { length, contents: Vec::with_capacity(capacity) }
    }

    /// Build a set from string slices; the length is taken from the first one
    ///
    /// # Errors
    /// Returns an error if the input is empty or the lengths differ
    pub fn from_strs(segments: &[&str]) -> SequencerResult<Self> {
        let first = segments.first().ok_or(SequencerError::EmptyInput)?;
        let mut set = Self::with_capacity(first.len(), segments.len());
        for s in segments {
            set.push(Segment::from(*s))?;
        }
        Ok(set)
    }

    /// Append a segment
    ///
    /// # Errors
    /// Returns an error if the segment length differs from the set's length
    pub fn push(&mut self, segment: Segment) -> SequencerResult<()> {
        if segment.len() != self.length {
            return Err(SequencerError::SegmentLengthMismatch {
                index: self.contents.len(),
                expected: self.length,
                actual: segment.len(),
            });
        }
        self.contents.push(segment);
        Ok(())
    }

    /// Fixed segment length
    #[inline]
    pub fn segment_length(&self) -> usize {
        self.length
    }

    /// Number of segments, duplicates included
    #[inline]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the set holds no segments
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Segment at `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.contents.get(index)
    }

    /// All segments as a slice
    #[inline]
    pub fn as_slice(&self) -> &[Segment] {
        &self.contents
    }

    /// Iterate over the segments
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.contents.iter()
    }
}

impl<'a> IntoIterator for &'a SegmentSet {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_value_semantics() {
        let a = Segment::from("gatc");
        let b = Segment::from("gatc");
        let c = Segment::from("gatg");
        assert_eq!(a, b);
        assert!(!a.shares_buffer(&b));
        assert!(a < c);
        assert!(a.clone().shares_buffer(&a));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let s = Segment::from("atcg");
        assert_eq!(s.prefix(2), b"at");
        assert_eq!(s.suffix(3), b"tcg");
        assert_eq!(s.suffix(4), b"atcg");
    }

    #[test]
    fn test_from_strs() {
        let set = SegmentSet::from_strs(&["aaa", "aag", "agc"]).unwrap();
        assert_eq!(set.segment_length(), 3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(1).unwrap().as_bytes(), b"aag");
    }

    #[test]
    fn test_from_strs_rejects_mixed_lengths() {
        let err = SegmentSet::from_strs(&["aaa", "aagc"]).unwrap_err();
        assert_eq!(
            err,
            SequencerError::SegmentLengthMismatch { index: 1, expected: 3, actual: 4 }
        );
    }

    #[test]
    fn test_from_strs_rejects_empty() {
        assert_eq!(SegmentSet::from_strs(&[]).unwrap_err(), SequencerError::EmptyInput);
    }
}
