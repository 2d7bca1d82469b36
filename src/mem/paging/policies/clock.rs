//! CLOCK (Second Chance) Replacement Policy.
//!
//! A hand sweeps the frames in a circle. A frame with its use bit set gets the
//! bit cleared and is skipped; the first frame found with a clear bit is the
//! victim and the hand stops one past it.

use super::ReplacementPolicy;
use crate::common::PageId;
use crate::mem::paging::frame::Frame;

pub struct ClockPolicy {
    hand: usize,
}

impl ClockPolicy {
    pub fn new() -> Self {
        Self { hand: 0 }
    }

    /// Current hand position.
    pub fn hand(&self) -> usize {
        self.hand
    }
}

impl Default for ClockPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacementPolicy for ClockPolicy {
    fn victim(&mut self, frames: &mut [Frame], _upcoming: &[PageId]) -> usize {
        let n = frames.len();
        // At most one full sweep clears every bit, so the second sweep must stop.
        for _ in 0..=n {
            let frame = &mut frames[self.hand];
            if frame.use_bit {
                frame.use_bit = false;
                self.hand = (self.hand + 1) % n;
            } else {
                let victim = self.hand;
                self.hand = (self.hand + 1) % n;
                return victim;
            }
        }
        self.hand
    }

    fn reset(&mut self) {
        self.hand = 0;
    }
}
