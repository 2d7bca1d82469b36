//! Simulation Traits.
//!
//! This module defines the common interface implemented by every engine that
//! can be advanced one discrete event at a time. It lets the live runner and
//! the CLI drive disparate components uniformly.

use crate::common::SimError;
use crate::ipc::{IpcEvent, IpcStatus, ProducerConsumer};
use crate::mem::paging::{AccessEvent, PageReplacer, PagingSnapshot};
use crate::sched::{Decision, Scheduler, SchedulerSnapshot};
use crate::sync::{DiningTable, TableEvent, TableSnapshot};

/// Trait for engines driven step by step.
pub trait Steppable {
    /// One discrete event produced by a step.
    type Event;

    /// Read-only view of the engine state.
    type Snapshot;

    /// Returns the user-friendly name of the engine.
    ///
    /// Used for logging.
    fn name(&self) -> &str;

    /// Advances the engine by one event.
    ///
    /// # Returns
    ///
    /// `Ok(None)` once the engine has nothing more to do (workload finished,
    /// references exhausted, or every actor blocked).
    fn step(&mut self) -> Result<Option<Self::Event>, SimError>;

    /// Captures the current state without mutating it.
    fn snapshot(&self) -> Self::Snapshot;

    /// Returns the engine to its configured initial state.
    fn reset(&mut self);
}

impl Steppable for Scheduler {
    type Event = Decision;
    type Snapshot = SchedulerSnapshot;

    fn name(&self) -> &str {
        "scheduler"
    }

    fn step(&mut self) -> Result<Option<Decision>, SimError> {
        Scheduler::step(self)
    }

    fn snapshot(&self) -> SchedulerSnapshot {
        Scheduler::snapshot(self)
    }

    fn reset(&mut self) {
        Scheduler::reset(self)
    }
}

impl Steppable for PageReplacer {
    type Event = AccessEvent;
    type Snapshot = PagingSnapshot;

    fn name(&self) -> &str {
        "paging"
    }

    fn step(&mut self) -> Result<Option<AccessEvent>, SimError> {
        PageReplacer::step(self)
    }

    fn snapshot(&self) -> PagingSnapshot {
        PageReplacer::snapshot(self)
    }

    fn reset(&mut self) {
        PageReplacer::reset(self)
    }
}

impl Steppable for DiningTable {
    type Event = TableEvent;
    type Snapshot = TableSnapshot;

    fn name(&self) -> &str {
        "dining"
    }

    fn step(&mut self) -> Result<Option<TableEvent>, SimError> {
        Ok(DiningTable::step(self))
    }

    fn snapshot(&self) -> TableSnapshot {
        DiningTable::snapshot(self)
    }

    fn reset(&mut self) {
        DiningTable::reset(self)
    }
}

impl Steppable for ProducerConsumer {
    type Event = IpcEvent;
    type Snapshot = IpcStatus;

    fn name(&self) -> &str {
        "ipc"
    }

    fn step(&mut self) -> Result<Option<IpcEvent>, SimError> {
        Ok(ProducerConsumer::step(self))
    }

    fn snapshot(&self) -> IpcStatus {
        self.status()
    }

    fn reset(&mut self) {
        ProducerConsumer::reset(self)
    }
}
