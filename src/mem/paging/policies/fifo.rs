use super::ReplacementPolicy;
use crate::common::PageId;
use crate::mem::paging::frame::Frame;

/// Evicts the page that has been resident the longest.
#[derive(Default)]
pub struct FifoPolicy;

impl ReplacementPolicy for FifoPolicy {
    fn victim(&mut self, frames: &mut [Frame], _upcoming: &[PageId]) -> usize {
        frames
            .iter()
            .min_by_key(|f| (f.loaded_at, f.index))
            .map(|f| f.index)
            .unwrap_or(0)
    }
}
