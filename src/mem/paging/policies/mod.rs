//! Page Replacement Policies.
//!
//! This module defines the `ReplacementPolicy` trait used by the page
//! replacer to pick a victim once every frame is occupied.

use super::frame::Frame;
use crate::common::PageId;

/// CLOCK (second chance) policy.
pub mod clock;
/// First-In First-Out policy.
pub mod fifo;
/// Least Recently Used policy.
pub mod lru;
/// Belady's optimal policy.
pub mod opt;

pub use clock::ClockPolicy;
pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use opt::OptPolicy;

/// Trait for victim selection.
///
/// Only consulted when no frame is free. The replacer keeps frame
/// timestamps and use bits current before calling into the policy.
pub trait ReplacementPolicy: Send {
    /// Notifies the policy that `frame` was loaded or hit.
    fn touch(&mut self, _frame: usize) {}

    /// Returns the index of the frame to evict.
    ///
    /// # Arguments
    ///
    /// * `frames` - All frames, every one occupied.
    /// * `upcoming` - References still to come after the current one.
    fn victim(&mut self, frames: &mut [Frame], upcoming: &[PageId]) -> usize;

    /// Drops any internal state.
    fn reset(&mut self) {}
}
