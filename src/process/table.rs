//! Process Table.
//!
//! Owns every process and thread of a run and keeps the ready and blocked
//! queues in lock-step with entity states: each state change and its queue
//! move happen inside one `&mut self` call, so no caller can observe a task
//! whose state and queue membership disagree.

use super::model::{
    Entity, LifecycleEvent, Process, Thread, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY,
};
use crate::common::{Pid, QueueKind, SimError, TaskState, Tick, Tid};
use std::collections::{BTreeMap, VecDeque};

/// Registry of processes and threads with derived scheduler queues.
#[derive(Debug, Default)]
pub struct ProcessTable {
    processes: BTreeMap<Pid, Process>,
    ready: VecDeque<Pid>,
    blocked: VecDeque<Pid>,
    thread_ready: VecDeque<(Pid, Tid)>,
    thread_blocked: VecDeque<(Pid, Tid)>,
    next_pid: u32,
    next_tid: BTreeMap<Pid, u32>,
    events: Vec<LifecycleEvent>,
}

/// Validates the caller-supplied numeric fields of a process.
pub fn validate_process(process: &Process) -> Result<(), SimError> {
    if process.burst == 0 {
        return Err(SimError::invalid_param("burst", 0, "must be > 0"));
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&process.priority) {
        return Err(SimError::invalid_param(
            "priority",
            process.priority as i64,
            "must be within 0..=99",
        ));
    }
    Ok(())
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            next_pid: 1,
            ..Default::default()
        }
    }

    /// Creates a process with an automatically assigned id.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        arrival: Tick,
        burst: Tick,
        priority: Option<i32>,
    ) -> Result<Pid, SimError> {
        let pid = Pid(self.next_pid.max(1));
        if self.processes.contains_key(&pid) {
            return Err(SimError::config("process id space exhausted"));
        }
        let process = Process::new(pid, name, arrival, burst, priority.unwrap_or(DEFAULT_PRIORITY));
        self.insert(process)?;
        Ok(pid)
    }

    /// Inserts a caller-built process. It must be in the `New` state.
    pub fn insert(&mut self, process: Process) -> Result<(), SimError> {
        validate_process(&process)?;
        if self.processes.contains_key(&process.pid) {
            return Err(SimError::config(format!("duplicate process id {}", process.pid)));
        }
        if process.state != TaskState::New {
            return Err(SimError::config(format!(
                "process {} must be inserted in the New state",
                process.pid
            )));
        }
        let pid = process.pid;
        self.next_pid = self.next_pid.max(pid.0.saturating_add(1));
        self.processes.insert(pid, process);
        self.events.push(LifecycleEvent {
            entity: Entity::Process(pid),
            from: None,
            to: Some(TaskState::New),
        });
        Ok(())
    }

    /// Removes a process and all of its threads from the table.
    pub fn remove(&mut self, pid: Pid) -> Result<Process, SimError> {
        let process = self.processes.remove(&pid).ok_or_else(|| unknown(pid))?;
        self.ready.retain(|p| *p != pid);
        self.blocked.retain(|p| *p != pid);
        self.drop_threads_of(pid, &process);
        self.next_tid.remove(&pid);
        self.events.push(LifecycleEvent {
            entity: Entity::Process(pid),
            from: Some(process.state),
            to: None,
        });
        Ok(process)
    }

    /// Moves a process along one edge of the lifecycle graph.
    pub fn transition(&mut self, pid: Pid, to: TaskState) -> Result<(), SimError> {
        let process = self.processes.get_mut(&pid).ok_or_else(|| unknown(pid))?;
        let from = process.state;
        if !from.can_transition_to(to) {
            return Err(SimError::InvalidTransition {
                entity: Entity::Process(pid).to_string(),
                from,
                to,
            });
        }
        process.state = to;
        move_between(&mut self.ready, &mut self.blocked, pid, from.queue(), to.queue());
        log::debug!("process {}: {} -> {}", pid, from, to);
        self.events.push(LifecycleEvent {
            entity: Entity::Process(pid),
            from: Some(from),
            to: Some(to),
        });
        Ok(())
    }

    /// New -> Ready.
    pub fn admit(&mut self, pid: Pid) -> Result<(), SimError> {
        self.transition(pid, TaskState::Ready)
    }

    /// Ready -> Running, recording the first dispatch time.
    pub fn dispatch(&mut self, pid: Pid, now: Tick) -> Result<(), SimError> {
        self.transition(pid, TaskState::Running)?;
        if let Some(p) = self.processes.get_mut(&pid) {
            p.start_time.get_or_insert(now);
        }
        Ok(())
    }

    /// Running -> Ready.
    pub fn preempt(&mut self, pid: Pid) -> Result<(), SimError> {
        self.transition(pid, TaskState::Ready)
    }

    /// Running -> Blocked.
    pub fn block(&mut self, pid: Pid) -> Result<(), SimError> {
        self.transition(pid, TaskState::Blocked)
    }

    /// Blocked -> Ready.
    pub fn wake(&mut self, pid: Pid) -> Result<(), SimError> {
        self.transition(pid, TaskState::Ready)
    }

    /// Running -> Terminated. Destroys every thread of the process.
    pub fn terminate(&mut self, pid: Pid, now: Tick) -> Result<(), SimError> {
        self.transition(pid, TaskState::Terminated)?;
        if let Some(mut process) = self.processes.remove(&pid) {
            process.completion_time = Some(now);
            self.drop_threads_of(pid, &process);
            process.threads.clear();
            self.processes.insert(pid, process);
        }
        Ok(())
    }

    /// Charges `amount` ticks of CPU time to a running process.
    ///
    /// Returns the time actually consumed, which is capped by the remaining
    /// burst.
    pub fn execute(&mut self, pid: Pid, amount: Tick) -> Result<Tick, SimError> {
        let process = self.processes.get_mut(&pid).ok_or_else(|| unknown(pid))?;
        if process.state != TaskState::Running {
            return Err(SimError::InvalidTransition {
                entity: Entity::Process(pid).to_string(),
                from: process.state,
                to: TaskState::Running,
            });
        }
        Ok(process.consume(amount))
    }

    /// Creates a thread in the `New` state under `pid`.
    pub fn spawn_thread(&mut self, pid: Pid, name: impl Into<String>) -> Result<Tid, SimError> {
        let process = self.processes.get_mut(&pid).ok_or_else(|| unknown(pid))?;
        let counter = self.next_tid.entry(pid).or_insert(1);
        let tid = Tid(*counter);
        if process.threads.contains_key(&tid) {
            return Err(SimError::config(format!("thread id space of {} exhausted", pid)));
        }
        if process.state == TaskState::Terminated {
            return Err(SimError::InvalidTransition {
                entity: Entity::Thread(pid, tid).to_string(),
                from: TaskState::Terminated,
                to: TaskState::New,
            });
        }
        *counter = counter.saturating_add(1);
        process.threads.insert(tid, Thread::new(pid, tid, name));
        self.events.push(LifecycleEvent {
            entity: Entity::Thread(pid, tid),
            from: None,
            to: Some(TaskState::New),
        });
        Ok(tid)
    }

    /// Moves a thread along one edge of the lifecycle graph.
    ///
    /// The parent's own state is not consulted.
    pub fn thread_transition(&mut self, pid: Pid, tid: Tid, to: TaskState) -> Result<(), SimError> {
        let process = self.processes.get_mut(&pid).ok_or_else(|| unknown(pid))?;
        let thread = process
            .threads
            .get_mut(&tid)
            .ok_or_else(|| SimError::config(format!("unknown thread {}.{}", pid, tid)))?;
        let from = thread.state;
        if !from.can_transition_to(to) {
            return Err(SimError::InvalidTransition {
                entity: Entity::Thread(pid, tid).to_string(),
                from,
                to,
            });
        }
        thread.state = to;
        move_between(
            &mut self.thread_ready,
            &mut self.thread_blocked,
            (pid, tid),
            from.queue(),
            to.queue(),
        );
        if to == TaskState::Terminated {
            process.threads.remove(&tid);
        }
        self.events.push(LifecycleEvent {
            entity: Entity::Thread(pid, tid),
            from: Some(from),
            to: Some(to),
        });
        Ok(())
    }

    /// Destroys a thread regardless of its state.
    pub fn destroy_thread(&mut self, pid: Pid, tid: Tid) -> Result<(), SimError> {
        let process = self.processes.get_mut(&pid).ok_or_else(|| unknown(pid))?;
        let thread = process
            .threads
            .remove(&tid)
            .ok_or_else(|| SimError::config(format!("unknown thread {}.{}", pid, tid)))?;
        self.thread_ready.retain(|t| *t != (pid, tid));
        self.thread_blocked.retain(|t| *t != (pid, tid));
        self.events.push(LifecycleEvent {
            entity: Entity::Thread(pid, tid),
            from: Some(thread.state),
            to: None,
        });
        Ok(())
    }

    fn drop_threads_of(&mut self, pid: Pid, process: &Process) {
        self.thread_ready.retain(|(p, _)| *p != pid);
        self.thread_blocked.retain(|(p, _)| *p != pid);
        for (tid, thread) in &process.threads {
            self.events.push(LifecycleEvent {
                entity: Entity::Thread(pid, *tid),
                from: Some(thread.state),
                to: None,
            });
        }
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    /// All processes in id order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Ready queue, head first.
    pub fn ready_queue(&self) -> &VecDeque<Pid> {
        &self.ready
    }

    /// Blocked queue, oldest first.
    pub fn blocked_queue(&self) -> &VecDeque<Pid> {
        &self.blocked
    }

    /// Processes currently in the `Running` state.
    pub fn running(&self) -> Vec<Pid> {
        self.processes
            .values()
            .filter(|p| p.state == TaskState::Running)
            .map(|p| p.pid)
            .collect()
    }

    /// Threads of `pid` in id order.
    pub fn threads_of(&self, pid: Pid) -> Vec<&Thread> {
        self.processes
            .get(&pid)
            .map(|p| p.threads.values().collect())
            .unwrap_or_default()
    }

    pub fn thread_ready_queue(&self) -> &VecDeque<(Pid, Tid)> {
        &self.thread_ready
    }

    pub fn thread_blocked_queue(&self) -> &VecDeque<(Pid, Tid)> {
        &self.thread_blocked
    }

    /// Takes the lifecycle events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Checks that every queue agrees with entity states.
    pub fn is_consistent(&self) -> bool {
        let procs_ok = self.processes.values().all(|p| {
            let in_ready = self.ready.iter().filter(|x| **x == p.pid).count();
            let in_blocked = self.blocked.iter().filter(|x| **x == p.pid).count();
            match p.state.queue() {
                Some(QueueKind::Ready) => in_ready == 1 && in_blocked == 0,
                Some(QueueKind::Blocked) => in_ready == 0 && in_blocked == 1,
                None => in_ready == 0 && in_blocked == 0,
            }
        });
        let threads_ok = self.processes.values().all(|p| {
            p.threads.values().all(|t| {
                let key = (p.pid, t.tid);
                let in_ready = self.thread_ready.iter().filter(|x| **x == key).count();
                let in_blocked = self.thread_blocked.iter().filter(|x| **x == key).count();
                match t.state.queue() {
                    Some(QueueKind::Ready) => in_ready == 1 && in_blocked == 0,
                    Some(QueueKind::Blocked) => in_ready == 0 && in_blocked == 1,
                    None => in_ready == 0 && in_blocked == 0,
                }
            })
        });
        let queued = self.ready.len() + self.blocked.len();
        let expected = self
            .processes
            .values()
            .filter(|p| p.state.queue().is_some())
            .count();
        procs_ok && threads_ok && queued == expected
    }

    /// Puts every process back into `New` with its full burst and empties all
    /// queues. The events log is kept.
    pub fn rewind(&mut self) {
        for process in self.processes.values_mut() {
            process.rewind();
        }
        self.ready.clear();
        self.blocked.clear();
        self.thread_ready.clear();
        self.thread_blocked.clear();
        self.next_tid.clear();
    }

    /// Removes everything.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

fn unknown(pid: Pid) -> SimError {
    SimError::config(format!("unknown process {}", pid))
}

fn move_between<T: PartialEq + Copy>(
    ready: &mut VecDeque<T>,
    blocked: &mut VecDeque<T>,
    key: T,
    from: Option<QueueKind>,
    to: Option<QueueKind>,
) {
    match from {
        Some(QueueKind::Ready) => ready.retain(|x| *x != key),
        Some(QueueKind::Blocked) => blocked.retain(|x| *x != key),
        None => {}
    }
    match to {
        Some(QueueKind::Ready) => ready.push_back(key),
        Some(QueueKind::Blocked) => blocked.push_back(key),
        None => {}
    }
}
