//! Optimal (Belady) Replacement Policy.
//!
//! Evicts the resident page whose next use lies farthest in the future. Pages
//! that never recur count as infinitely far; ties go to the lowest frame.

use super::ReplacementPolicy;
use crate::common::PageId;
use crate::mem::paging::frame::Frame;

#[derive(Default)]
pub struct OptPolicy;

impl ReplacementPolicy for OptPolicy {
    fn victim(&mut self, frames: &mut [Frame], upcoming: &[PageId]) -> usize {
        let mut best: Option<(usize, usize)> = None;
        for frame in frames.iter() {
            let distance = frame
                .page
                .and_then(|page| upcoming.iter().position(|&p| p == page))
                .unwrap_or(usize::MAX);
            match best {
                Some((_, d)) if d >= distance => {}
                _ => best = Some((frame.index, distance)),
            }
        }
        best.map(|(index, _)| index).unwrap_or(0)
    }
}
