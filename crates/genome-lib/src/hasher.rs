//! Rolling sdbm hash used for bucket placement.
//!
//! Every table in the sequencer (unique segments and per-length prefix tables)
//! places entries by this recurrence:
//!
//! ```text
//! hash = c + (hash << 6) + (hash << 16) - hash
//! ```
//!
//! evaluated in wrapping 64-bit arithmetic.

/// Fold one byte into a running hash
#[inline]
pub const fn sdbm_step(hash: u64, c: u8) -> u64 {
    (c as u64)
        .wrapping_add(hash << 6)
        .wrapping_add(hash << 16)
        .wrapping_sub(hash)
}

/// Hash a whole byte string, starting from 0
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |hash, &c| sdbm_step(hash, c))
}

/// Incremental prefix hasher
///
/// Yields the hash of `bytes[..1]`, `bytes[..2]`, ... in turn, each computed
/// from the previous one with a single [`sdbm_step`].
#[derive(Debug, Clone)]
pub struct PrefixHashes<'a> {
    bytes: &'a [u8],
    pos: usize,
    hash: u64,
}

impl<'a> PrefixHashes<'a> {
    /// Create a prefix hasher over `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, hash: 0 }
    }
}

impl Iterator for PrefixHashes<'_> {
    /// `(prefix_length, hash_of_prefix)`
    type Item = (usize, u64);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let c = *self.bytes.get(self.pos)?;
        self.hash = sdbm_step(self.hash, c);
        self.pos += 1;
        Some((self.pos, self.hash))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bytes.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PrefixHashes<'_> {}
