//! Sequencer module for rebuilding a sequence from overlapping segments
//!
//! This module implements the multi-step reconstruction pipeline:
//! 1. Remove duplicate segments
//! 2. Claim construct records and index every proper prefix
//! 3. Match suffixes to prefixes, longest overlap first
//! 4. Assemble the surviving chains

pub mod config;
pub mod engine;
pub mod lanes;
pub mod stats;

mod assemble;
mod dedup;
mod index;
pub(crate) mod matching;

pub use config::SequencerConfig;
pub use engine::{Reconstruction, Sequencer};
pub use stats::{MatchStatistics, TableStatistics};
