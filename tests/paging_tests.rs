//! Integration tests for the page replacement engine.

use os_sim::common::{PageId, SimError};
use os_sim::mem::paging::{pages, PageAlgorithm, PageReplacer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CLASSIC: [u64; 13] = [7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2];

/// Runs `refs` through a fresh replacer and returns it.
fn run(algorithm: PageAlgorithm, frames: i64, refs: &[u64]) -> PageReplacer {
    let mut pager = PageReplacer::new(algorithm, frames).unwrap();
    pager.load_references(pages(refs));
    pager.run().unwrap();
    pager
}

fn evictions(pager: &PageReplacer) -> Vec<u64> {
    pager
        .events()
        .iter()
        .filter_map(|e| e.evicted.map(|p| p.0))
        .collect()
}

/// Tests FIFO on the short trace with three and four frames.
#[test]
fn test_fifo_short_trace() {
    let refs = [1, 2, 3, 4, 1, 2, 5];
    assert_eq!(run(PageAlgorithm::Fifo, 3, &refs).faults(), 7);

    let four = run(PageAlgorithm::Fifo, 4, &refs);
    assert_eq!(four.faults(), 5);
    assert_eq!(evictions(&four), vec![1]);
    assert!((four.fault_rate() - 5.0 / 7.0).abs() < 1e-9);
}

/// Tests fault counts of every algorithm on the classic trace.
#[test]
fn test_classic_trace_fault_counts() {
    assert_eq!(run(PageAlgorithm::Fifo, 3, &CLASSIC).faults(), 10);
    assert_eq!(run(PageAlgorithm::Lru, 3, &CLASSIC).faults(), 9);
    assert_eq!(run(PageAlgorithm::Opt, 3, &CLASSIC).faults(), 7);
    assert_eq!(run(PageAlgorithm::Clock, 3, &CLASSIC).faults(), 9);
}

/// Tests the CLOCK victim sequence, which depends on hand movement.
#[test]
fn test_clock_victims() {
    let pager = run(PageAlgorithm::Clock, 3, &CLASSIC);
    assert_eq!(evictions(&pager), vec![7, 1, 2, 0, 3, 4]);
}

/// Tests OPT victim choice, including pages that never recur.
#[test]
fn test_opt_victims() {
    let pager = run(PageAlgorithm::Opt, 3, &CLASSIC);
    assert_eq!(evictions(&pager), vec![7, 1, 0, 4]);

    // Neither 1 nor 2 recurs; the lower frame loses.
    let tie = run(PageAlgorithm::Opt, 2, &[1, 2, 3]);
    assert_eq!(tie.events()[2].frame, 0);
    assert_eq!(tie.events()[2].evicted, Some(PageId(1)));
}

/// Tests that free frames fill lowest index first.
#[test]
fn test_free_frames_fill_in_order() {
    let mut pager = PageReplacer::new(PageAlgorithm::Lru, 4).unwrap();
    for (i, page) in [9, 8, 7].into_iter().enumerate() {
        let ev = pager.access(PageId(page)).unwrap();
        assert!(!ev.hit);
        assert_eq!(ev.frame, i);
        assert_eq!(ev.evicted, None);
    }
    let hit = pager.access(PageId(8)).unwrap();
    assert!(hit.hit);
    assert_eq!(hit.frame, 1);
    assert!(pager.frames()[3].is_free());
}

/// Tests OPT preconditions.
#[test]
fn test_opt_requires_reference_string() {
    let mut pager = PageReplacer::new(PageAlgorithm::Opt, 3).unwrap();
    assert!(matches!(
        pager.access(PageId(1)),
        Err(SimError::ConfigurationError(_))
    ));
    assert!(matches!(pager.run(), Err(SimError::ConfigurationError(_))));

    pager.load_references(pages(&[1, 2, 3]));
    pager.access(PageId(1)).unwrap();
    assert!(matches!(
        pager.access(PageId(3)),
        Err(SimError::ConfigurationError(_))
    ));
    assert_eq!(pager.accesses(), 1);
}

/// Tests parameter validation.
#[test]
fn test_invalid_frame_count() {
    assert!(matches!(
        PageReplacer::new(PageAlgorithm::Fifo, 0),
        Err(SimError::InvalidParameter { .. })
    ));
    let mut pager = PageReplacer::new(PageAlgorithm::Fifo, 2).unwrap();
    assert!(pager.configure(PageAlgorithm::Lru, -1).is_err());
    assert_eq!(pager.algorithm(), PageAlgorithm::Fifo);
    assert!("random".parse::<PageAlgorithm>().is_err());
}

/// Tests stepping, reset and reconfiguration.
#[test]
fn test_step_reset_configure() {
    let mut pager = PageReplacer::new(PageAlgorithm::Fifo, 3).unwrap();
    pager.load_references(pages(&CLASSIC));
    let first = pager.step().unwrap().unwrap();
    assert_eq!(first.step, 1);
    assert_eq!(pager.snapshot().next, Some(PageId(0)));

    pager.configure(PageAlgorithm::Opt, 4).unwrap();
    assert_eq!(pager.accesses(), 0);
    assert_eq!(pager.frames().len(), 4);
    let report = pager.run().unwrap();
    assert_eq!(report.events.len(), CLASSIC.len());
    assert!(pager.step().unwrap().is_none());

    pager.reset();
    let again = pager.run().unwrap();
    assert_eq!(report, again);
}

/// Tests that OPT never faults more than the other policies and that no
/// page is ever resident twice.
#[test]
fn test_opt_is_lower_bound() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..100 {
        let len = rng.gen_range(1..60);
        let refs: Vec<u64> = (0..len).map(|_| rng.gen_range(0..8)).collect();
        let frames = rng.gen_range(1..6);

        let opt = run(PageAlgorithm::Opt, frames, &refs);
        for algorithm in [PageAlgorithm::Fifo, PageAlgorithm::Lru, PageAlgorithm::Clock] {
            let other = run(algorithm, frames, &refs);
            assert!(opt.faults() <= other.faults(), "OPT beat by {}", algorithm);

            let mut resident: Vec<PageId> = other.frames().iter().filter_map(|f| f.page).collect();
            let n = resident.len();
            resident.sort();
            resident.dedup();
            assert_eq!(resident.len(), n);
        }
        assert_eq!(opt.faults() + opt.hits(), refs.len() as u64);
    }
}
