//! Demand paging.
//!
//! * `frame`: state of one physical frame.
//! * `policies`: victim selection (FIFO, LRU, OPT, CLOCK).
//! * `replacer`: the engine driving a reference string through the frames.

pub mod frame;
pub mod policies;
pub mod replacer;

pub use frame::Frame;
pub use replacer::{pages, AccessEvent, PageAlgorithm, PageReplacer, PagingReport, PagingSnapshot};
