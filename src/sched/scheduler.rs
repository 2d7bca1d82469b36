//! CPU Scheduler engine.
//!
//! Drives a workload through the process lifecycle one scheduling decision at
//! a time. Each [`Scheduler::step`] either runs one process for one slice or
//! idles the CPU until the next arrival, and returns the resulting
//! [`Decision`].

use super::algorithm::SchedulingAlgorithm;
use super::metrics::{MetricsDelta, ProcessResult, ScheduleMetrics};
use super::timeline::{Slot, Timeline, TimelineEntry};
use crate::common::{Pid, SimError, TaskState, Tick};
use crate::process::{validate_process, Process, ProcessTable};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

/// How a decision's slice ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SliceOutcome {
    /// The CPU idled until the next arrival.
    Idle,
    /// The process went back to the ready queue with work left.
    Preempted(Pid),
    /// The process finished its burst and terminated.
    Completed(Pid),
}

/// One scheduling decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub entry: TimelineEntry,
    pub outcome: SliceOutcome,
    pub delta: MetricsDelta,
}

/// Full result of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub algorithm: SchedulingAlgorithm,
    pub timeline: Timeline,
    /// One entry per process, in pid order.
    pub processes: Vec<ProcessResult>,
    /// Pids in the order they terminated.
    pub completion_order: Vec<Pid>,
    pub metrics: ScheduleMetrics,
}

/// Single-CPU scheduler over a loaded workload.
pub struct Scheduler {
    algorithm: SchedulingAlgorithm,
    table: ProcessTable,
    /// Not yet arrived, sorted by `(arrival, pid)`.
    pending: VecDeque<Pid>,
    workload: Vec<Pid>,
    clock: Tick,
    timeline: Timeline,
    completion_order: Vec<Pid>,
}

impl Scheduler {
    /// Creates a scheduler with no workload.
    pub fn new(algorithm: SchedulingAlgorithm) -> Result<Self, SimError> {
        algorithm.validate()?;
        Ok(Self {
            algorithm,
            table: ProcessTable::new(),
            pending: VecDeque::new(),
            workload: Vec::new(),
            clock: 0,
            timeline: Timeline::new(),
            completion_order: Vec::new(),
        })
    }

    /// Selects a new algorithm and rewinds the loaded workload.
    ///
    /// The scheduler is untouched if the algorithm is invalid.
    pub fn configure(&mut self, algorithm: SchedulingAlgorithm) -> Result<(), SimError> {
        algorithm.validate()?;
        self.algorithm = algorithm;
        self.reset();
        Ok(())
    }

    /// Loads a workload, replacing any previous one.
    ///
    /// All processes are validated before anything changes: the workload must
    /// be non-empty with unique ids, positive bursts and in-range priorities.
    pub fn load(&mut self, workload: Vec<Process>) -> Result<(), SimError> {
        if workload.is_empty() {
            return Err(SimError::config("workload is empty"));
        }
        let mut seen = BTreeSet::new();
        for process in &workload {
            validate_process(process)?;
            if !seen.insert(process.pid) {
                return Err(SimError::config(format!("duplicate process id {}", process.pid)));
            }
        }

        let mut table = ProcessTable::new();
        for mut process in workload {
            process.rewind();
            table.insert(process)?;
        }
        self.workload = table.processes().map(|p| p.pid).collect();
        self.table = table;
        self.reset();
        log::info!(
            "scheduler: loaded {} processes ({})",
            self.workload.len(),
            self.algorithm
        );
        Ok(())
    }

    /// Rewinds the loaded workload to time zero.
    pub fn reset(&mut self) {
        self.table.rewind();
        self.table.drain_events();
        let mut arrivals: Vec<(Tick, Pid)> = self
            .table
            .processes()
            .map(|p| (p.arrival, p.pid))
            .collect();
        arrivals.sort();
        self.pending = arrivals.into_iter().map(|(_, pid)| pid).collect();
        self.clock = 0;
        self.timeline.clear();
        self.completion_order.clear();
    }

    /// Makes one scheduling decision.
    ///
    /// Returns `Ok(None)` once every process has terminated.
    pub fn step(&mut self) -> Result<Option<Decision>, SimError> {
        if self.workload.is_empty() {
            return Err(SimError::config("no workload loaded"));
        }
        self.admit_arrivals()?;

        let pid = match self.algorithm.select(&self.table) {
            Some(pid) => pid,
            None => return Ok(self.idle_until_next_arrival()),
        };

        let start = self.clock;
        self.table.dispatch(pid, start)?;
        let remaining = self.table.get(pid).map(|p| p.remaining).unwrap_or(0);
        let next_arrival = self.next_arrival();
        let slice = self.algorithm.slice_len(remaining, start, next_arrival);
        let used = self.table.execute(pid, slice)?;
        self.clock += used;

        let entry = TimelineEntry {
            slot: Slot::Process(pid),
            start,
            end: self.clock,
        };
        self.timeline.push(entry, self.algorithm.preempts_on_arrival());

        // Arrivals during the slice queue up ahead of a preempted process.
        self.admit_arrivals()?;

        let finished = self.table.get(pid).map(|p| p.is_finished()).unwrap_or(true);
        let outcome = if finished {
            self.table.terminate(pid, self.clock)?;
            self.completion_order.push(pid);
            log::debug!("scheduler: {} completed at {}", pid, self.clock);
            SliceOutcome::Completed(pid)
        } else {
            self.table.preempt(pid)?;
            SliceOutcome::Preempted(pid)
        };

        Ok(Some(Decision {
            entry,
            outcome,
            delta: MetricsDelta {
                busy: used,
                idle: 0,
                completed: usize::from(finished),
            },
        }))
    }

    /// Runs the remaining decisions and returns the full report.
    pub fn run_to_completion(&mut self) -> Result<ScheduleReport, SimError> {
        while self.step()?.is_some() {}
        Ok(self.report())
    }

    /// Report of the trace so far.
    pub fn report(&self) -> ScheduleReport {
        let processes = self.results();
        let metrics = ScheduleMetrics::compute(&processes, &self.timeline);
        ScheduleReport {
            algorithm: self.algorithm,
            timeline: self.timeline.clone(),
            processes,
            completion_order: self.completion_order.clone(),
            metrics,
        }
    }

    fn results(&self) -> Vec<ProcessResult> {
        self.table.processes().map(ProcessResult::from).collect()
    }

    fn admit_arrivals(&mut self) -> Result<(), SimError> {
        while let Some(&pid) = self.pending.front() {
            let arrived = self
                .table
                .get(pid)
                .map(|p| p.arrival <= self.clock)
                .unwrap_or(true);
            if !arrived {
                break;
            }
            self.pending.pop_front();
            self.table.admit(pid)?;
        }
        Ok(())
    }

    fn next_arrival(&self) -> Option<Tick> {
        self.pending
            .front()
            .and_then(|pid| self.table.get(*pid))
            .map(|p| p.arrival)
    }

    fn idle_until_next_arrival(&mut self) -> Option<Decision> {
        let until = self.next_arrival()?;
        let entry = TimelineEntry {
            slot: Slot::Idle,
            start: self.clock,
            end: until,
        };
        self.timeline.push(entry, true);
        self.clock = until;
        Some(Decision {
            entry,
            outcome: SliceOutcome::Idle,
            delta: MetricsDelta {
                busy: 0,
                idle: entry.len(),
                completed: 0,
            },
        })
    }

    pub fn algorithm(&self) -> SchedulingAlgorithm {
        self.algorithm
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Read-only view of the process table.
    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    /// Returns `true` when every process has terminated.
    pub fn is_finished(&self) -> bool {
        !self.workload.is_empty()
            && self
                .table
                .processes()
                .all(|p| p.state == TaskState::Terminated)
    }

    /// Snapshot of the process table for rendering.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            clock: self.clock,
            running: self.table.running().first().copied(),
            ready: self.table.ready_queue().iter().copied().collect(),
            processes: self.results(),
            states: self.table.processes().map(|p| (p.pid, p.state)).collect(),
        }
    }
}

/// Point-in-time view of a scheduler run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchedulerSnapshot {
    pub clock: Tick,
    pub running: Option<Pid>,
    pub ready: Vec<Pid>,
    pub processes: Vec<ProcessResult>,
    pub states: Vec<(Pid, TaskState)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Vec<Process> {
        vec![
            Process::new(Pid(1), "A", 0, 5, 1),
            Process::new(Pid(2), "B", 1, 3, 1),
            Process::new(Pid(3), "C", 2, 1, 1),
        ]
    }

    #[test]
    fn step_emits_one_decision_per_slice() {
        let mut s = Scheduler::new(SchedulingAlgorithm::Fcfs).unwrap();
        s.load(workload()).unwrap();
        let first = s.step().unwrap().unwrap();
        assert_eq!(first.outcome, SliceOutcome::Completed(Pid(1)));
        assert_eq!((first.entry.start, first.entry.end), (0, 5));
        assert!(s.table().is_consistent());
    }

    #[test]
    fn invalid_configure_leaves_state_untouched() {
        let mut s = Scheduler::new(SchedulingAlgorithm::Fcfs).unwrap();
        s.load(workload()).unwrap();
        s.step().unwrap();
        let err = s
            .configure(SchedulingAlgorithm::RoundRobin { quantum: 0 })
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { .. }));
        assert_eq!(s.clock(), 5);
        assert_eq!(s.algorithm(), SchedulingAlgorithm::Fcfs);
    }
}
