//! Counting Semaphore.
//!
//! The internal counter is signed. A negative counter means `-counter` tasks
//! are parked in the FIFO wait queue; the exposed count never goes below zero.

use crate::common::{SimError, TaskId};
use serde::Serialize;
use std::collections::VecDeque;

/// Most recent operations kept per semaphore; older entries are dropped.
pub const LOG_CAPACITY: usize = 256;

/// Result of a `wait` (P) operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum WaitOutcome {
    /// The task holds a permit and continues.
    Acquired,
    /// The task was parked on the wait queue.
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SemaphoreOpKind {
    Wait,
    Signal,
    Cancel,
}

/// Entry of the operation log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SemaphoreOp {
    pub kind: SemaphoreOpKind,
    pub task: TaskId,
    pub before: i64,
    pub after: i64,
    /// Task woken by a signal, if any.
    pub woken: Option<TaskId>,
    pub blocked: bool,
}

#[derive(Clone, Debug)]
pub struct Semaphore {
    name: String,
    initial: i64,
    value: i64,
    queue: VecDeque<TaskId>,
    log: VecDeque<SemaphoreOp>,
}

impl Semaphore {
    /// Creates a semaphore. A negative initial value is rejected.
    pub fn new(name: impl Into<String>, initial: i64) -> Result<Self, SimError> {
        if initial < 0 {
            return Err(SimError::invalid_param("semaphore value", initial, "must be >= 0"));
        }
        Ok(Self {
            name: name.into(),
            initial,
            value: initial,
            queue: VecDeque::new(),
            log: VecDeque::with_capacity(LOG_CAPACITY),
        })
    }

    /// P operation.
    pub fn wait(&mut self, task: TaskId) -> WaitOutcome {
        let before = self.value;
        self.value -= 1;
        let outcome = if self.value < 0 {
            self.queue.push_back(task);
            WaitOutcome::Blocked
        } else {
            WaitOutcome::Acquired
        };
        self.record(SemaphoreOpKind::Wait, task, before, None, outcome == WaitOutcome::Blocked);
        outcome
    }

    /// V operation. Returns the waiter released to run, if any.
    pub fn signal(&mut self, task: TaskId) -> Option<TaskId> {
        let before = self.value;
        self.value += 1;
        let woken = if before < 0 { self.queue.pop_front() } else { None };
        self.record(SemaphoreOpKind::Signal, task, before, woken, false);
        woken
    }

    /// Withdraws a parked waiter and restores the counter.
    ///
    /// Returns `false` if `task` was not waiting.
    pub fn cancel(&mut self, task: TaskId) -> bool {
        let Some(pos) = self.queue.iter().position(|&t| t == task) else {
            return false;
        };
        self.queue.remove(pos);
        let before = self.value;
        self.value += 1;
        self.record(SemaphoreOpKind::Cancel, task, before, None, false);
        true
    }

    fn record(
        &mut self,
        kind: SemaphoreOpKind,
        task: TaskId,
        before: i64,
        woken: Option<TaskId>,
        blocked: bool,
    ) {
        log::trace!("{}: {:?} by {} {} -> {}", self.name, kind, task, before, self.value);
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(SemaphoreOp {
            kind,
            task,
            before,
            after: self.value,
            woken,
            blocked,
        });
    }

    /// Restores the initial value and drops all waiters and the log.
    pub fn reset(&mut self) {
        self.value = self.initial;
        self.queue.clear();
        self.log.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Available permits, `max(counter, 0)`.
    pub fn count(&self) -> i64 {
        self.value.max(0)
    }

    /// Raw signed counter.
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn waiting(&self) -> &VecDeque<TaskId> {
        &self.queue
    }

    pub fn is_waiting(&self, task: TaskId) -> bool {
        self.queue.contains(&task)
    }

    /// The last [`LOG_CAPACITY`] operations, oldest first.
    pub fn log(&self) -> &VecDeque<SemaphoreOp> {
        &self.log
    }

    /// Counter and queue agree: `-value == waiters` when negative, no
    /// waiters otherwise.
    pub fn is_consistent(&self) -> bool {
        if self.value < 0 {
            self.queue.len() as i64 == -self.value
        } else {
            self.queue.is_empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_restores_counter() {
        let mut s = Semaphore::new("s", 0).unwrap();
        assert_eq!(s.wait(TaskId(1)), WaitOutcome::Blocked);
        assert_eq!(s.wait(TaskId(2)), WaitOutcome::Blocked);
        assert!(s.cancel(TaskId(1)));
        assert_eq!(s.value(), -1);
        assert_eq!(s.signal(TaskId(9)), Some(TaskId(2)));
        assert!(s.is_consistent());
    }

    #[test]
    fn log_keeps_most_recent_entries() {
        let mut s = Semaphore::new("s", 1).unwrap();
        for i in 0..LOG_CAPACITY + 10 {
            s.wait(TaskId(i));
            s.signal(TaskId(i));
        }
        assert_eq!(s.log().len(), LOG_CAPACITY);
        assert_eq!(s.log().back().map(|op| op.task), Some(TaskId(LOG_CAPACITY + 9)));
    }
}
