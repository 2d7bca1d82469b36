//! Integration tests for the dynamic memory allocator.

use os_sim::common::{BlockId, Pid, SimError};
use os_sim::mem::{AllocOp, BlockStatus, FitStrategy, MemoryAllocator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lays out free holes of 100, 50 and 200 units separated by allocated
/// spacers, followed by the free tail.
fn holes(strategy: FitStrategy) -> MemoryAllocator {
    let mut a = MemoryAllocator::new(1000, strategy).unwrap();
    let h1 = a.allocate(100, None).unwrap();
    a.allocate(10, None).unwrap();
    let h2 = a.allocate(50, None).unwrap();
    a.allocate(10, None).unwrap();
    let h3 = a.allocate(200, None).unwrap();
    a.allocate(10, None).unwrap();
    for id in [h1, h2, h3] {
        a.free(id).unwrap();
    }
    a
}

fn base_of(a: &MemoryAllocator, id: BlockId) -> u64 {
    a.block(id).unwrap().base
}

/// Tests that each strategy picks the expected hole.
#[test]
fn test_fit_strategies_pick_expected_hole() {
    let mut first = holes(FitStrategy::FirstFit);
    let id = first.allocate(40, None).unwrap();
    assert_eq!(base_of(&first, id), 0);

    let mut best = holes(FitStrategy::BestFit);
    let id = best.allocate(40, None).unwrap();
    assert_eq!(base_of(&best, id), 110);

    // The free tail (620 units) is the largest hole.
    let mut worst = holes(FitStrategy::WorstFit);
    let id = worst.allocate(40, None).unwrap();
    assert_eq!(base_of(&worst, id), 380);
}

/// Tests that Next Fit resumes after the last allocation and wraps.
#[test]
fn test_next_fit_resumes_and_wraps() {
    let mut a = MemoryAllocator::new(300, FitStrategy::NextFit).unwrap();
    let x = a.allocate(100, None).unwrap();
    let y = a.allocate(100, None).unwrap();
    a.free(x).unwrap();

    // Resumes at 200 rather than reusing the hole at 0.
    let z = a.allocate(50, None).unwrap();
    assert_eq!(base_of(&a, z), 200);

    // Only 50 units left at the top; wraps to the hole at 0.
    let w = a.allocate(80, None).unwrap();
    assert_eq!(base_of(&a, w), 0);
    assert!(a.verify());
    let _ = y;
}

/// Tests splitting and neighbour merging.
#[test]
fn test_split_and_merge() {
    let mut a = MemoryAllocator::new(500, FitStrategy::FirstFit).unwrap();
    let x = a.allocate(100, Some(Pid(1))).unwrap();
    assert_eq!(a.blocks().len(), 2);
    assert_eq!(a.blocks()[0].status, BlockStatus::Allocated);
    assert_eq!(a.blocks()[0].owner, Some(Pid(1)));
    assert_eq!(a.blocks()[1].size, 400);

    a.free(x).unwrap();
    assert_eq!(a.blocks().len(), 1);
    assert_eq!(a.blocks()[0].size, 500);
    assert!(a.verify());
}

/// Tests out-of-memory reporting with fragmentation.
#[test]
fn test_out_of_memory_reports_largest_free() {
    let mut a = holes(FitStrategy::FirstFit);
    let err = a.allocate(700, None).unwrap_err();
    assert_eq!(
        err,
        SimError::OutOfMemory {
            requested: 700,
            largest_free: 620
        }
    );
    // 100 + 50 + 200 + 620 free, largest 620.
    assert_eq!(a.fragmentation(), 350);
    let stats = a.stats();
    assert_eq!(stats.free_blocks, 4);
    assert_eq!(stats.used, 30);
    assert!(!a.history().last().unwrap().success);
}

/// Tests invalid sizes and frees.
#[test]
fn test_invalid_parameters() {
    assert!(matches!(
        MemoryAllocator::new(0, FitStrategy::FirstFit),
        Err(SimError::InvalidParameter { .. })
    ));
    let mut a = MemoryAllocator::new(100, FitStrategy::FirstFit).unwrap();
    assert!(matches!(a.allocate(0, None), Err(SimError::InvalidParameter { .. })));

    let id = a.allocate(10, None).unwrap();
    a.free(id).unwrap();
    assert!(matches!(a.free(id), Err(SimError::InvalidParameter { .. })));
    assert!(matches!(a.free(BlockId(999)), Err(SimError::InvalidParameter { .. })));
    assert!("random-fit".parse::<FitStrategy>().is_err());
}

/// Tests freeing everything an owner holds.
#[test]
fn test_free_owner() {
    let mut a = MemoryAllocator::new(1000, FitStrategy::FirstFit).unwrap();
    a.allocate(100, Some(Pid(1))).unwrap();
    a.allocate(100, Some(Pid(2))).unwrap();
    a.allocate(100, Some(Pid(1))).unwrap();

    assert_eq!(a.free_owner(Pid(1)), 2);
    assert_eq!(a.free_owner(Pid(1)), 0);
    assert_eq!(a.stats().used, 100);
    assert!(a.verify());
}

/// Tests compaction into a single free block.
#[test]
fn test_compact() {
    let mut a = holes(FitStrategy::FirstFit);
    let moved = a.compact();
    assert_eq!(moved, 3);
    let blocks = a.blocks();
    assert_eq!(blocks.len(), 4);
    assert!(blocks[..3].iter().all(|b| b.status == BlockStatus::Allocated));
    assert_eq!(blocks[3].base, 30);
    assert_eq!(blocks[3].size, 970);
    assert_eq!(a.fragmentation(), 0);
    assert_eq!(a.history().last().unwrap().op, AllocOp::Compact);
    assert!(a.verify());
}

/// Tests usage percentage and reset.
#[test]
fn test_usage_and_reset() {
    let mut a = MemoryAllocator::new(200, FitStrategy::BestFit).unwrap();
    a.allocate(50, None).unwrap();
    assert!((a.usage() - 25.0).abs() < 1e-9);
    a.reset();
    assert_eq!(a.blocks().len(), 1);
    assert!(a.history().is_empty());
    assert_eq!(a.usage(), 0.0);
}

/// Tests the partition invariant under random allocate/free sequences for
/// every strategy.
#[test]
fn test_partition_invariant_random_ops() {
    for strategy in FitStrategy::ALL {
        let mut rng = StdRng::seed_from_u64(42);
        let mut a = MemoryAllocator::new(4096, strategy).unwrap();
        let mut live: Vec<BlockId> = Vec::new();
        for _ in 0..2000 {
            if live.is_empty() || rng.gen_bool(0.6) {
                match a.allocate(rng.gen_range(1..400), None) {
                    Ok(id) => live.push(id),
                    Err(SimError::OutOfMemory { .. }) => {}
                    Err(e) => panic!("unexpected error: {}", e),
                }
            } else {
                let id = live.swap_remove(rng.gen_range(0..live.len()));
                a.free(id).unwrap();
            }
            if rng.gen_ratio(1, 100) {
                a.compact();
            }
            assert!(a.verify(), "{} broke the partition", strategy.name());
        }
        let allocated = a.blocks().iter().filter(|b| !b.is_free()).count();
        assert_eq!(allocated, live.len());
    }
}
