//! Integration tests for the threaded live runner.

use os_sim::common::{PageId, Pid, TaskState};
use os_sim::mem::{pages, PageAlgorithm, PageReplacer};
use os_sim::process::Process;
use os_sim::sched::{SchedulingAlgorithm, Scheduler};
use os_sim::sim::{Interleaving, LiveRun, Steppable};
use os_sim::sync::{DiningTable, ForkPolicy};
use std::thread;
use std::time::Duration;

fn scheduler() -> Scheduler {
    let mut s = Scheduler::new(SchedulingAlgorithm::RoundRobin { quantum: 2 }).unwrap();
    s.load(vec![
        Process::new(Pid(1), "A", 0, 5, 1),
        Process::new(Pid(2), "B", 1, 3, 1),
        Process::new(Pid(3), "C", 2, 4, 1),
    ])
    .unwrap();
    s
}

/// Tests that a finite workload runs to the end and keeps its final state.
#[test]
fn test_live_scheduler_join() {
    let mut reference = scheduler();
    let expected = reference.run_to_completion().unwrap();

    let live = LiveRun::start(scheduler(), Duration::ZERO);
    let receiver = live.events().clone();
    let (steps, snapshot) = live.join().unwrap();

    let decisions: Vec<_> = receiver.try_iter().collect();
    assert_eq!(decisions.len() as u64, steps);
    assert_eq!(snapshot.clock, expected.metrics.makespan);
    assert!(snapshot
        .states
        .iter()
        .all(|(_, state)| *state == TaskState::Terminated));
    assert_eq!(snapshot.processes, expected.processes);
}

/// Tests a live page replacer against the offline run.
#[test]
fn test_live_paging_matches_offline() {
    let refs = pages(&[7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2]);
    let mut offline = PageReplacer::new(PageAlgorithm::Lru, 3).unwrap();
    offline.load_references(refs.clone());
    let expected = offline.run().unwrap();

    let mut pager = PageReplacer::new(PageAlgorithm::Lru, 3).unwrap();
    pager.load_references(refs);
    let live = LiveRun::start(pager, Duration::ZERO);
    let receiver = live.events().clone();
    let (steps, snapshot) = live.join().unwrap();

    assert_eq!(steps, 13);
    assert_eq!(receiver.try_iter().collect::<Vec<_>>(), expected.events);
    assert_eq!(snapshot.faults, 9);
    assert_eq!(snapshot.next, None::<PageId>);
}

/// Tests that a deadlocking table stops on its own.
#[test]
fn test_live_table_stops_at_deadlock() {
    let table = DiningTable::new(4, ForkPolicy::Naive, 1, 1, Interleaving::RoundRobin).unwrap();
    let live = LiveRun::start(table, Duration::ZERO);
    let (_, snapshot) = live.join().unwrap();
    assert_eq!(snapshot.deadlocked, Some(vec![0, 1, 2, 3]));
}

/// Tests pause, resume and stop on an open-ended table.
#[test]
fn test_live_pause_resume_stop() {
    let table = DiningTable::new(5, ForkPolicy::Parity, 2, 1, Interleaving::Seeded(4)).unwrap();
    let live = LiveRun::start(table, Duration::from_millis(1));
    thread::sleep(Duration::from_millis(30));

    live.pause();
    thread::sleep(Duration::from_millis(30));
    let frozen = live.snapshot();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(live.snapshot(), frozen);
    assert!(!live.is_finished());

    live.resume();
    thread::sleep(Duration::from_millis(30));
    assert!(live.snapshot().now >= frozen.now);
    assert!(!live.drain_events().is_empty());

    let steps = live.stop().unwrap();
    assert!(steps > 0);
}

/// Tests that dropping a running handle shuts the worker down.
#[test]
fn test_live_drop_stops_worker() {
    let table = DiningTable::new(3, ForkPolicy::Parity, 1, 1, Interleaving::RoundRobin).unwrap();
    let live = LiveRun::start(table, Duration::from_millis(1));
    thread::sleep(Duration::from_millis(10));
    drop(live);
}

/// Tests the trait surface directly.
#[test]
fn test_steppable_reset() {
    let mut table =
        DiningTable::new(3, ForkPolicy::Parity, 1, 1, Interleaving::RoundRobin).unwrap();
    let initial = Steppable::snapshot(&table);
    for _ in 0..20 {
        Steppable::step(&mut table).unwrap();
    }
    assert_ne!(Steppable::snapshot(&table), initial);
    Steppable::reset(&mut table);
    assert_eq!(Steppable::snapshot(&table), initial);
    assert_eq!(table.name(), "dining");
}
