//! Dynamic Memory Allocator.
//!
//! Models a contiguous address space `[0, total)` as an ordered list of
//! blocks. Allocation splits a free block into an exact-size allocated block
//! followed by the free remainder; freeing merges with free neighbours, so two
//! free blocks are never adjacent.

use crate::common::{BlockId, Pid, SimError};
use serde::Serialize;

/// Free-block selection strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FitStrategy {
    /// First free block that fits, scanning from address zero.
    FirstFit,
    /// Smallest free block that fits; lowest address on ties.
    BestFit,
    /// Largest free block that fits; lowest address on ties.
    WorstFit,
    /// First fit, resuming after the last successful allocation and wrapping.
    NextFit,
}

impl FitStrategy {
    pub const ALL: [FitStrategy; 4] = [
        FitStrategy::FirstFit,
        FitStrategy::BestFit,
        FitStrategy::WorstFit,
        FitStrategy::NextFit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FitStrategy::FirstFit => "First Fit",
            FitStrategy::BestFit => "Best Fit",
            FitStrategy::WorstFit => "Worst Fit",
            FitStrategy::NextFit => "Next Fit",
        }
    }
}

impl std::str::FromStr for FitStrategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "first-fit" | "first" => Ok(FitStrategy::FirstFit),
            "best-fit" | "best" => Ok(FitStrategy::BestFit),
            "worst-fit" | "worst" => Ok(FitStrategy::WorstFit),
            "next-fit" | "next" => Ok(FitStrategy::NextFit),
            other => Err(SimError::config(format!("unknown allocation strategy '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BlockStatus {
    Free,
    Allocated,
}

/// A contiguous range of the simulated address space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    pub id: BlockId,
    pub base: u64,
    pub size: u64,
    pub status: BlockStatus,
    pub owner: Option<Pid>,
}

impl MemoryBlock {
    /// One past the last address of the block.
    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    pub fn is_free(&self) -> bool {
        self.status == BlockStatus::Free
    }
}

/// Kind of allocator operation recorded in the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AllocOp {
    Allocate { size: u64 },
    Free,
    Compact,
}

/// One entry of the allocation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocationRecord {
    pub op: AllocOp,
    pub owner: Option<Pid>,
    pub block: Option<BlockId>,
    pub success: bool,
}

/// Occupancy summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub free_blocks: usize,
    pub largest_free: u64,
    /// Free memory outside the largest free block.
    pub fragmentation: u64,
    /// Used / total, in percent.
    pub usage_pct: f64,
}

/// Variable-partition allocator over a simulated address space.
pub struct MemoryAllocator {
    total: u64,
    strategy: FitStrategy,
    blocks: Vec<MemoryBlock>,
    next_id: u32,
    /// Address just past the last successful allocation (Next Fit).
    next_fit_cursor: u64,
    history: Vec<AllocationRecord>,
}

impl MemoryAllocator {
    /// Creates an allocator whose address space is one free block.
    pub fn new(total: i64, strategy: FitStrategy) -> Result<Self, SimError> {
        if total <= 0 {
            return Err(SimError::invalid_param("memory size", total, "must be > 0"));
        }
        let mut allocator = Self {
            total: total as u64,
            strategy,
            blocks: Vec::new(),
            next_id: 0,
            next_fit_cursor: 0,
            history: Vec::new(),
        };
        allocator.reset();
        Ok(allocator)
    }

    /// Returns the address space to a single free block and clears history.
    pub fn reset(&mut self) {
        self.next_id = 0;
        let id = self.fresh_id();
        self.blocks = vec![MemoryBlock {
            id,
            base: 0,
            size: self.total,
            status: BlockStatus::Free,
            owner: None,
        }];
        self.next_fit_cursor = 0;
        self.history.clear();
    }

    pub fn set_strategy(&mut self, strategy: FitStrategy) {
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> FitStrategy {
        self.strategy
    }

    /// Allocates `size` units for `owner`.
    pub fn allocate(&mut self, size: i64, owner: Option<Pid>) -> Result<BlockId, SimError> {
        if size <= 0 {
            return Err(SimError::invalid_param("allocation size", size, "must be > 0"));
        }
        let size = size as u64;
        let index = match self.find_fit(size) {
            Some(index) => index,
            None => {
                let largest_free = self.stats().largest_free;
                log::warn!(
                    "allocator: out of memory ({} requested, largest free {})",
                    size,
                    largest_free
                );
                self.history.push(AllocationRecord {
                    op: AllocOp::Allocate { size },
                    owner,
                    block: None,
                    success: false,
                });
                return Err(SimError::OutOfMemory {
                    requested: size,
                    largest_free,
                });
            }
        };

        let id = self.split(index, size, owner);
        self.next_fit_cursor = self.blocks[index].end();
        log::debug!(
            "allocator: {} -> {} at {:#x} ({})",
            size,
            id,
            self.blocks[index].base,
            self.strategy.name()
        );
        self.history.push(AllocationRecord {
            op: AllocOp::Allocate { size },
            owner,
            block: Some(id),
            success: true,
        });
        Ok(id)
    }

    fn find_fit(&self, size: u64) -> Option<usize> {
        let fits = |b: &&MemoryBlock| b.is_free() && b.size >= size;
        let indexed = || self.blocks.iter().enumerate().filter(|(_, b)| fits(b));
        match self.strategy {
            FitStrategy::FirstFit => indexed().map(|(i, _)| i).next(),
            FitStrategy::BestFit => indexed().min_by_key(|(_, b)| (b.size, b.base)).map(|(i, _)| i),
            FitStrategy::WorstFit => indexed()
                .min_by_key(|(_, b)| (std::cmp::Reverse(b.size), b.base))
                .map(|(i, _)| i),
            FitStrategy::NextFit => {
                let n = self.blocks.len();
                let start = self
                    .blocks
                    .iter()
                    .position(|b| b.base <= self.next_fit_cursor && self.next_fit_cursor < b.end())
                    .unwrap_or(0);
                (0..n)
                    .map(|offset| (start + offset) % n)
                    .find(|&i| fits(&&self.blocks[i]))
            }
        }
    }

    fn split(&mut self, index: usize, size: u64, owner: Option<Pid>) -> BlockId {
        let id = self.fresh_id();
        let block = &mut self.blocks[index];
        let remainder = block.size - size;
        let remainder_id = block.id;
        let remainder_base = block.base + size;

        block.id = id;
        block.size = size;
        block.status = BlockStatus::Allocated;
        block.owner = owner;

        if remainder > 0 {
            self.blocks.insert(
                index + 1,
                MemoryBlock {
                    id: remainder_id,
                    base: remainder_base,
                    size: remainder,
                    status: BlockStatus::Free,
                    owner: None,
                },
            );
        }
        id
    }

    /// Frees an allocated block and merges it with free neighbours.
    pub fn free(&mut self, id: BlockId) -> Result<(), SimError> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id == id && !b.is_free())
            .ok_or(SimError::invalid_param("block", id.0 as i64, "not an allocated block"))?;
        let owner = self.blocks[index].owner;
        self.release(index);
        self.history.push(AllocationRecord {
            op: AllocOp::Free,
            owner,
            block: Some(id),
            success: true,
        });
        Ok(())
    }

    /// Frees every block owned by `owner`. Returns how many were freed.
    pub fn free_owner(&mut self, owner: Pid) -> usize {
        let ids: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| !b.is_free() && b.owner == Some(owner))
            .map(|b| b.id)
            .collect();
        for id in &ids {
            if let Some(index) = self.blocks.iter().position(|b| b.id == *id) {
                self.release(index);
            }
        }
        self.history.push(AllocationRecord {
            op: AllocOp::Free,
            owner: Some(owner),
            block: None,
            success: !ids.is_empty(),
        });
        ids.len()
    }

    fn release(&mut self, mut index: usize) {
        {
            let block = &mut self.blocks[index];
            block.status = BlockStatus::Free;
            block.owner = None;
        }
        if index + 1 < self.blocks.len() && self.blocks[index + 1].is_free() {
            let next = self.blocks.remove(index + 1);
            self.blocks[index].size += next.size;
        }
        if index > 0 && self.blocks[index - 1].is_free() {
            let current = self.blocks.remove(index);
            index -= 1;
            self.blocks[index].size += current.size;
        }
    }

    /// Slides every allocated block towards address zero, keeping their
    /// order, and leaves a single free block at the top.
    ///
    /// Returns the number of blocks that moved.
    pub fn compact(&mut self) -> usize {
        let mut moved = 0;
        let mut cursor = 0;
        let mut compacted: Vec<MemoryBlock> = Vec::with_capacity(self.blocks.len());
        let mut free_id = None;
        for mut block in std::mem::take(&mut self.blocks) {
            if block.is_free() {
                free_id.get_or_insert(block.id);
                continue;
            }
            if block.base != cursor {
                moved += 1;
                block.base = cursor;
            }
            cursor = block.end();
            compacted.push(block);
        }
        if cursor < self.total {
            let id = match free_id {
                Some(id) => id,
                None => self.fresh_id(),
            };
            compacted.push(MemoryBlock {
                id,
                base: cursor,
                size: self.total - cursor,
                status: BlockStatus::Free,
                owner: None,
            });
        }
        self.blocks = compacted;
        self.next_fit_cursor = cursor;
        self.history.push(AllocationRecord {
            op: AllocOp::Compact,
            owner: None,
            block: None,
            success: true,
        });
        moved
    }

    fn fresh_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Blocks in address order.
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&MemoryBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn history(&self) -> &[AllocationRecord] {
        &self.history
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Sum of free sizes minus the largest free block.
    pub fn fragmentation(&self) -> u64 {
        self.stats().fragmentation
    }

    pub fn usage(&self) -> f64 {
        self.stats().usage_pct
    }

    pub fn stats(&self) -> MemoryStats {
        let free: u64 = self.blocks.iter().filter(|b| b.is_free()).map(|b| b.size).sum();
        let largest_free = self
            .blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .max()
            .unwrap_or(0);
        let used = self.total - free;
        MemoryStats {
            total: self.total,
            used,
            free,
            free_blocks: self.blocks.iter().filter(|b| b.is_free()).count(),
            largest_free,
            fragmentation: free - largest_free,
            usage_pct: used as f64 / self.total as f64 * 100.0,
        }
    }

    /// Checks the partition invariant: blocks tile `[0, total)` in order with
    /// no gaps, no overlaps, no empty blocks and no adjacent free blocks.
    pub fn verify(&self) -> bool {
        let mut cursor = 0;
        let mut prev_free = false;
        for block in &self.blocks {
            if block.base != cursor || block.size == 0 {
                return false;
            }
            if block.is_free() && prev_free {
                return false;
            }
            if block.is_free() && block.owner.is_some() {
                return false;
            }
            prev_free = block.is_free();
            cursor = block.end();
        }
        cursor == self.total
    }
}
