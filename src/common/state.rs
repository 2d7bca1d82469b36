//! Task Lifecycle States.
//!
//! This module defines the five-state lifecycle shared by processes and
//! threads, together with the legal transition graph:
//!
//! ```text
//! New -> Ready -> Running -> Terminated
//!          ^   <-   |
//!          |        v
//!          +---- Blocked
//! ```

use serde::Serialize;

/// Lifecycle state of a process or thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TaskState {
    /// Created but not yet admitted to the ready queue.
    New,

    /// Waiting in the ready queue for the CPU.
    Ready,

    /// Currently holding the CPU.
    Running,

    /// Waiting for an event; sits in the blocked queue.
    Blocked,

    /// Finished. No further transitions are possible.
    Terminated,
}

impl TaskState {
    /// All states, in lifecycle order.
    pub const ALL: [TaskState; 5] = [
        TaskState::New,
        TaskState::Ready,
        TaskState::Running,
        TaskState::Blocked,
        TaskState::Terminated,
    ];

    /// Returns `true` if `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (New, Ready)
                | (Ready, Running)
                | (Running, Ready)
                | (Running, Blocked)
                | (Blocked, Ready)
                | (Running, Terminated)
        )
    }

    /// Returns the queue this state implies membership of.
    pub fn queue(self) -> Option<QueueKind> {
        match self {
            TaskState::Ready => Some(QueueKind::Ready),
            TaskState::Blocked => Some(QueueKind::Blocked),
            _ => None,
        }
    }

    /// Returns the human-readable name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            TaskState::New => "New",
            TaskState::Ready => "Ready",
            TaskState::Running => "Running",
            TaskState::Blocked => "Blocked",
            TaskState::Terminated => "Terminated",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The two scheduler queues a task can be a member of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum QueueKind {
    Ready,
    Blocked,
}
