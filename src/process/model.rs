//! Process and thread entities.

use crate::common::{Pid, TaskState, Tick, Tid};
use serde::Serialize;
use std::collections::BTreeMap;

/// Lowest accepted priority value (most urgent).
pub const MIN_PRIORITY: i32 = 0;

/// Highest accepted priority value (least urgent).
pub const MAX_PRIORITY: i32 = 99;

/// Default priority for processes created without one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// A simulated process.
///
/// Scheduling fields (`remaining`, `start_time`, `completion_time`) are owned
/// by whoever drives the process through its lifecycle; the table only
/// enforces the state graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub arrival: Tick,
    pub burst: Tick,
    pub remaining: Tick,
    /// Numerically smaller means more urgent.
    pub priority: i32,
    pub state: TaskState,
    /// Time of the first dispatch.
    pub start_time: Option<Tick>,
    pub completion_time: Option<Tick>,
    pub threads: BTreeMap<Tid, Thread>,
}

impl Process {
    /// Creates a process in the `New` state with its full burst remaining.
    pub fn new(
        pid: Pid,
        name: impl Into<String>,
        arrival: Tick,
        burst: Tick,
        priority: i32,
    ) -> Self {
        Self {
            pid,
            name: name.into(),
            arrival,
            burst,
            remaining: burst,
            priority,
            state: TaskState::New,
            start_time: None,
            completion_time: None,
            threads: BTreeMap::new(),
        }
    }

    /// Consumes `amount` ticks of CPU time.
    ///
    /// Saturates at zero so `remaining` can never go negative.
    pub fn consume(&mut self, amount: Tick) -> Tick {
        let used = amount.min(self.remaining);
        self.remaining -= used;
        used
    }

    /// Returns `true` once no burst time is left.
    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Turnaround time, available after completion.
    pub fn turnaround(&self) -> Option<Tick> {
        self.completion_time.map(|c| c - self.arrival)
    }

    /// Waiting time (`completion - arrival - burst`), available after completion.
    pub fn waiting(&self) -> Option<Tick> {
        self.turnaround().map(|t| t.saturating_sub(self.burst))
    }

    /// Restores the scheduling fields to their pre-run values.
    pub fn rewind(&mut self) {
        self.remaining = self.burst;
        self.state = TaskState::New;
        self.start_time = None;
        self.completion_time = None;
        self.threads.clear();
    }
}

/// A thread owned by a single process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub tid: Tid,
    pub pid: Pid,
    pub name: String,
    pub state: TaskState,
}

impl Thread {
    pub fn new(pid: Pid, tid: Tid, name: impl Into<String>) -> Self {
        Self {
            tid,
            pid,
            name: name.into(),
            state: TaskState::New,
        }
    }
}

/// Either a whole process or one of its threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Entity {
    Process(Pid),
    Thread(Pid, Tid),
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Process(pid) => write!(f, "process {}", pid),
            Entity::Thread(pid, tid) => write!(f, "thread {}.{}", pid, tid),
        }
    }
}

/// A recorded lifecycle change.
///
/// `from` is `None` for creation; `to` is `None` for destruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    pub entity: Entity,
    pub from: Option<TaskState>,
    pub to: Option<TaskState>,
}
