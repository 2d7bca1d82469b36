//! Integration tests for the process and thread lifecycle.

use os_sim::common::{Pid, SimError, TaskState, Tid};
use os_sim::process::{Entity, Process, ProcessTable};

/// Creates a table with one admitted process.
fn table_with_ready_process() -> (ProcessTable, Pid) {
    let mut table = ProcessTable::new();
    let pid = table.create("worker", 0, 10, Some(3)).unwrap();
    table.admit(pid).unwrap();
    (table, pid)
}

/// Tests the full happy path through every legal process edge.
#[test]
fn test_process_lifecycle_edges() {
    let (mut table, pid) = table_with_ready_process();

    table.dispatch(pid, 0).unwrap();
    assert_eq!(table.running(), vec![pid]);
    table.block(pid).unwrap();
    assert_eq!(table.blocked_queue().iter().copied().collect::<Vec<_>>(), vec![pid]);
    table.wake(pid).unwrap();
    assert_eq!(table.ready_queue().front(), Some(&pid));
    table.dispatch(pid, 4).unwrap();
    table.preempt(pid).unwrap();
    table.dispatch(pid, 6).unwrap();
    table.terminate(pid, 9).unwrap();

    let p = table.get(pid).unwrap();
    assert_eq!(p.state, TaskState::Terminated);
    assert_eq!(p.start_time, Some(0));
    assert_eq!(p.completion_time, Some(9));
    assert!(table.ready_queue().is_empty());
    assert!(table.is_consistent());
}

/// Tests that skipping a state is rejected and leaves the process untouched.
#[test]
fn test_illegal_transition_rejected() {
    let mut table = ProcessTable::new();
    let pid = table.create("p", 0, 5, None).unwrap();

    let err = table.dispatch(pid, 0).unwrap_err();
    assert_eq!(
        err,
        SimError::InvalidTransition {
            entity: Entity::Process(pid).to_string(),
            from: TaskState::New,
            to: TaskState::Running,
        }
    );
    assert_eq!(table.get(pid).unwrap().state, TaskState::New);

    table.admit(pid).unwrap();
    assert!(matches!(
        table.block(pid),
        Err(SimError::InvalidTransition { from: TaskState::Ready, .. })
    ));
    assert!(table.is_consistent());
}

/// Tests that terminated is a sink state.
#[test]
fn test_terminated_is_final() {
    let (mut table, pid) = table_with_ready_process();
    table.dispatch(pid, 0).unwrap();
    table.terminate(pid, 10).unwrap();

    for to in TaskState::ALL {
        assert!(table.transition(pid, to).is_err(), "Terminated -> {} accepted", to);
    }
}

/// Tests that only a running process can consume CPU time, and that the
/// remaining burst never goes negative.
#[test]
fn test_execute_requires_running() {
    let (mut table, pid) = table_with_ready_process();
    assert!(table.execute(pid, 3).is_err());

    table.dispatch(pid, 0).unwrap();
    assert_eq!(table.execute(pid, 4).unwrap(), 4);
    assert_eq!(table.execute(pid, 100).unwrap(), 6);
    assert_eq!(table.get(pid).unwrap().remaining, 0);
    assert!(table.get(pid).unwrap().is_finished());
}

/// Tests invalid parameters and duplicate ids on insertion.
#[test]
fn test_insert_validation() {
    let mut table = ProcessTable::new();
    assert!(matches!(
        table.create("zero", 0, 0, None),
        Err(SimError::InvalidParameter { name: "burst", .. })
    ));
    assert!(matches!(
        table.create("urgent", 0, 1, Some(-1)),
        Err(SimError::InvalidParameter { name: "priority", .. })
    ));

    table.insert(Process::new(Pid(7), "a", 0, 1, 0)).unwrap();
    assert!(matches!(
        table.insert(Process::new(Pid(7), "b", 0, 1, 0)),
        Err(SimError::ConfigurationError(_))
    ));
    // Auto ids continue past caller-assigned ones.
    assert_eq!(table.create("c", 0, 1, None).unwrap(), Pid(8));
}

/// Tests the top of the pid range: inserting it is fine, auto ids then run out.
#[test]
fn test_max_pid() {
    let mut table = ProcessTable::new();
    table.insert(Process::new(Pid(u32::MAX), "last", 0, 1, 0)).unwrap();
    assert!(table.get(Pid(u32::MAX)).is_some());
    assert!(matches!(
        table.create("next", 0, 1, None),
        Err(SimError::ConfigurationError(_))
    ));
    assert_eq!(table.len(), 1);
}

/// Tests that threads follow the lifecycle independently of their parent.
#[test]
fn test_thread_lifecycle_independent_of_parent() {
    let mut table = ProcessTable::new();
    let pid = table.create("host", 0, 5, None).unwrap();
    let tid = table.spawn_thread(pid, "t0").unwrap();
    assert_eq!(tid, Tid(1));

    // The parent is still New, the thread may run anyway.
    table.thread_transition(pid, tid, TaskState::Ready).unwrap();
    table.thread_transition(pid, tid, TaskState::Running).unwrap();
    table.thread_transition(pid, tid, TaskState::Blocked).unwrap();
    assert_eq!(table.thread_blocked_queue().len(), 1);

    assert!(table
        .thread_transition(pid, tid, TaskState::Running)
        .is_err());
    assert!(table.is_consistent());
}

/// Tests that terminating a process destroys its threads and forbids new
/// ones.
#[test]
fn test_terminate_destroys_threads() {
    let (mut table, pid) = table_with_ready_process();
    let t1 = table.spawn_thread(pid, "a").unwrap();
    table.spawn_thread(pid, "b").unwrap();
    table.thread_transition(pid, t1, TaskState::Ready).unwrap();

    table.dispatch(pid, 0).unwrap();
    table.terminate(pid, 10).unwrap();

    assert!(table.threads_of(pid).is_empty());
    assert!(table.thread_ready_queue().is_empty());
    assert!(matches!(
        table.spawn_thread(pid, "late"),
        Err(SimError::InvalidTransition { from: TaskState::Terminated, .. })
    ));
}

/// Tests explicit thread destruction.
#[test]
fn test_destroy_thread() {
    let mut table = ProcessTable::new();
    let pid = table.create("host", 0, 5, None).unwrap();
    let tid = table.spawn_thread(pid, "t").unwrap();
    table.thread_transition(pid, tid, TaskState::Ready).unwrap();

    table.destroy_thread(pid, tid).unwrap();
    assert!(table.threads_of(pid).is_empty());
    assert!(table.thread_ready_queue().is_empty());
    assert!(table.destroy_thread(pid, tid).is_err());
}

/// Tests that every successful change lands in the event log.
#[test]
fn test_lifecycle_events_recorded() {
    let (mut table, pid) = table_with_ready_process();
    let events = table.drain_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].from, None);
    assert_eq!(events[1].to, Some(TaskState::Ready));

    let _ = table.block(pid);
    assert!(table.drain_events().is_empty());
}

/// Tests removal from the table.
#[test]
fn test_remove_process() {
    let (mut table, pid) = table_with_ready_process();
    let removed = table.remove(pid).unwrap();
    assert_eq!(removed.pid, pid);
    assert!(table.is_empty());
    assert!(table.ready_queue().is_empty());
    assert!(table.remove(pid).is_err());
}
