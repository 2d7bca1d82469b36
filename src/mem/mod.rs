//! Memory management: variable-partition allocation and demand paging.

pub mod allocator;
pub mod paging;

pub use allocator::{
    AllocOp, AllocationRecord, BlockStatus, FitStrategy, MemoryAllocator, MemoryBlock, MemoryStats,
};
pub use paging::{
    pages, AccessEvent, Frame, PageAlgorithm, PageReplacer, PagingReport, PagingSnapshot,
};
