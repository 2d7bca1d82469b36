//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the frame whose page has gone unreferenced the longest.
//! It keeps a usage stack of frame indices: an access moves the frame to the
//! top (Most Recently Used position) and the bottom is the victim.

use super::ReplacementPolicy;
use crate::common::PageId;
use crate::mem::paging::frame::Frame;

/// LRU policy state.
pub struct LruPolicy {
    /// Index 0 is MRU, last index is LRU.
    usage: Vec<usize>,
}

impl LruPolicy {
    /// Creates a new LRU policy for `frames` frames.
    pub fn new(frames: usize) -> Self {
        Self {
            usage: (0..frames).collect(),
        }
    }
}

impl ReplacementPolicy for LruPolicy {
    /// Moves the accessed frame to the MRU position.
    fn touch(&mut self, frame: usize) {
        if let Some(pos) = self.usage.iter().position(|&x| x == frame) {
            self.usage.remove(pos);
        }
        self.usage.insert(0, frame);
    }

    /// Returns the frame at the bottom of the usage stack.
    fn victim(&mut self, frames: &mut [Frame], _upcoming: &[PageId]) -> usize {
        match self.usage.last() {
            Some(&frame) => frame,
            None => frames
                .iter()
                .min_by_key(|f| (f.last_access, f.index))
                .map(|f| f.index)
                .unwrap_or(0),
        }
    }

    fn reset(&mut self) {
        let n = self.usage.len();
        self.usage = (0..n).collect();
    }
}
