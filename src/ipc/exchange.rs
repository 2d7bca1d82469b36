//! Producer/consumer exchange over a bounded buffer.
//!
//! Three semaphores guard the buffer: `mutex` (1), `empty` (capacity) and
//! `full` (0). A producer runs wait(empty), wait(mutex), write, signal(mutex),
//! signal(full); a consumer mirrors it with `full` and `empty` swapped. Each
//! semaphore operation is one actor move; the write or read together with the
//! two trailing signals is a single move.

use super::buffer::{BoundedBuffer, Item};
use crate::common::error::require_positive;
use crate::common::{SimError, TaskId, Tick};
use crate::sim::actor::{ActorClock, Interleaving};
use crate::sync::{Semaphore, WaitOutcome};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Role {
    Producer,
    Consumer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SemKind {
    Mutex,
    Empty,
    Full,
}

/// Protocol position of one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ActorPhase {
    /// Sleeping out its rate before the next attempt.
    Pausing,
    /// About to wait on the semaphore.
    Requesting(SemKind),
    /// Parked on the semaphore.
    Parked(SemKind),
    /// Holds its slot permit and the mutex.
    Critical,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum IpcEventKind {
    ActorAdded { actor: TaskId, role: Role },
    ActorRemoved { actor: TaskId, role: Role },
    Acquired { actor: TaskId, semaphore: SemKind },
    Blocked { actor: TaskId, semaphore: SemKind },
    Woken { actor: TaskId, semaphore: SemKind },
    Produced { producer: TaskId, item: u64, slot: usize },
    Consumed { consumer: TaskId, item: u64, slot: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IpcEvent {
    pub at: Tick,
    pub kind: IpcEventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActorStatus {
    pub id: TaskId,
    pub role: Role,
    pub rate: Tick,
    pub phase: ActorPhase,
    /// Items produced or consumed.
    pub completed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IpcStatus {
    pub now: Tick,
    pub capacity: usize,
    pub count: usize,
    pub head: usize,
    pub tail: usize,
    pub slots: Vec<Option<Item>>,
    pub actors: Vec<ActorStatus>,
    pub mutex: i64,
    pub empty: i64,
    pub full: i64,
    pub produced: u64,
    pub consumed: u64,
}

struct Actor {
    id: TaskId,
    role: Role,
    rate: Tick,
    phase: ActorPhase,
    ready_at: Option<Tick>,
    holds_slot: bool,
    holds_mutex: bool,
    completed: u64,
}

impl Actor {
    fn new(id: TaskId, role: Role, rate: Tick, now: Tick) -> Self {
        Self {
            id,
            role,
            rate,
            phase: ActorPhase::Requesting(slot_sem(role)),
            ready_at: Some(now),
            holds_slot: false,
            holds_mutex: false,
            completed: 0,
        }
    }
}

/// Semaphore an actor waits on before entering.
fn slot_sem(role: Role) -> SemKind {
    match role {
        Role::Producer => SemKind::Empty,
        Role::Consumer => SemKind::Full,
    }
}

/// Semaphore an actor signals on leaving.
fn release_sem(role: Role) -> SemKind {
    match role {
        Role::Producer => SemKind::Full,
        Role::Consumer => SemKind::Empty,
    }
}

pub struct ProducerConsumer {
    buffer: BoundedBuffer,
    mutex: Semaphore,
    empty: Semaphore,
    full: Semaphore,
    actors: Vec<Actor>,
    clock: ActorClock,
    pending: VecDeque<IpcEvent>,
    next_task: usize,
    next_item: u64,
    produced: u64,
    consumed: u64,
}

impl ProducerConsumer {
    pub fn new(capacity: i64, interleaving: Interleaving) -> Result<Self, SimError> {
        let buffer = BoundedBuffer::new(capacity)?;
        Ok(Self {
            mutex: Semaphore::new("mutex", 1)?,
            empty: Semaphore::new("empty", capacity)?,
            full: Semaphore::new("full", 0)?,
            buffer,
            actors: Vec::new(),
            clock: ActorClock::new(interleaving),
            pending: VecDeque::new(),
            next_task: 0,
            next_item: 0,
            produced: 0,
            consumed: 0,
        })
    }

    pub fn add_producer(&mut self, rate: i64) -> Result<TaskId, SimError> {
        self.add_actor(Role::Producer, rate)
    }

    pub fn add_consumer(&mut self, rate: i64) -> Result<TaskId, SimError> {
        self.add_actor(Role::Consumer, rate)
    }

    fn add_actor(&mut self, role: Role, rate: i64) -> Result<TaskId, SimError> {
        let rate = require_positive("rate", rate)?;
        let id = TaskId(self.next_task);
        self.next_task += 1;
        self.actors.push(Actor::new(id, role, rate, self.clock.now()));
        log::debug!("ipc: added {:?} {} (rate {})", role, id, rate);
        self.emit(IpcEventKind::ActorAdded { actor: id, role });
        Ok(id)
    }

    /// Changes how many ticks an actor pauses between attempts.
    pub fn set_rate(&mut self, actor: TaskId, rate: i64) -> Result<(), SimError> {
        let rate = require_positive("rate", rate)?;
        let index = self.index_of(actor)?;
        self.actors[index].rate = rate;
        Ok(())
    }

    /// Removes an actor, undoing its in-flight protocol position.
    ///
    /// A parked wait is cancelled and every held permit is signalled back, so
    /// the buffer and semaphore counts stay in agreement.
    pub fn remove_actor(&mut self, actor: TaskId) -> Result<(), SimError> {
        let index = self.index_of(actor)?;
        let removed = self.actors.remove(index);
        let now = self.clock.now();
        if let ActorPhase::Parked(kind) = removed.phase {
            self.sem_mut(kind).cancel(removed.id);
        }
        if removed.holds_mutex {
            self.release(SemKind::Mutex, removed.id, now);
        }
        if removed.holds_slot {
            self.release(slot_sem(removed.role), removed.id, now);
        }
        log::debug!("ipc: removed {:?} {}", removed.role, removed.id);
        self.emit(IpcEventKind::ActorRemoved {
            actor: removed.id,
            role: removed.role,
        });
        Ok(())
    }

    fn index_of(&self, actor: TaskId) -> Result<usize, SimError> {
        self.actors
            .iter()
            .position(|a| a.id == actor)
            .ok_or(SimError::invalid_param("actor", actor.0 as i64, "no such producer or consumer"))
    }

    fn sem_mut(&mut self, kind: SemKind) -> &mut Semaphore {
        match kind {
            SemKind::Mutex => &mut self.mutex,
            SemKind::Empty => &mut self.empty,
            SemKind::Full => &mut self.full,
        }
    }

    /// Produces the next event, or `None` when every actor is blocked or
    /// there are no actors.
    pub fn step(&mut self) -> Option<IpcEvent> {
        if self.pending.is_empty() {
            self.advance();
        }
        self.pending.pop_front()
    }

    pub fn run(&mut self, steps: usize) -> Vec<IpcEvent> {
        let mut events = Vec::new();
        for _ in 0..steps {
            match self.step() {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    fn advance(&mut self) {
        let ready: Vec<Option<Tick>> = self.actors.iter().map(|a| a.ready_at).collect();
        let Some(index) = self.clock.pick(&ready) else {
            return;
        };
        let now = self.clock.now();
        let (id, role) = (self.actors[index].id, self.actors[index].role);
        match self.actors[index].phase {
            ActorPhase::Pausing => {
                let actor = &mut self.actors[index];
                actor.phase = ActorPhase::Requesting(slot_sem(role));
                actor.ready_at = Some(now);
                self.advance_requesting(index, slot_sem(role), now);
            }
            ActorPhase::Requesting(kind) => self.advance_requesting(index, kind, now),
            ActorPhase::Critical => {
                match role {
                    Role::Producer => self.write(index, now),
                    Role::Consumer => self.read(index, now),
                }
                let actor = &mut self.actors[index];
                actor.holds_mutex = false;
                actor.holds_slot = false;
                actor.phase = ActorPhase::Pausing;
                actor.ready_at = Some(now + actor.rate);
                self.release(SemKind::Mutex, id, now);
                self.release(release_sem(role), id, now);
            }
            ActorPhase::Parked(_) => {}
        }
    }

    fn advance_requesting(&mut self, index: usize, kind: SemKind, now: Tick) {
        let id = self.actors[index].id;
        match self.sem_mut(kind).wait(id) {
            WaitOutcome::Acquired => {
                self.granted(index, kind, now);
                self.emit(IpcEventKind::Acquired {
                    actor: id,
                    semaphore: kind,
                });
            }
            WaitOutcome::Blocked => {
                let actor = &mut self.actors[index];
                actor.phase = ActorPhase::Parked(kind);
                actor.ready_at = None;
                self.emit(IpcEventKind::Blocked {
                    actor: id,
                    semaphore: kind,
                });
            }
        }
    }

    /// Moves an actor past a semaphore it now holds.
    fn granted(&mut self, index: usize, kind: SemKind, now: Tick) {
        let actor = &mut self.actors[index];
        if kind == SemKind::Mutex {
            actor.holds_mutex = true;
            actor.phase = ActorPhase::Critical;
        } else {
            actor.holds_slot = true;
            actor.phase = ActorPhase::Requesting(SemKind::Mutex);
        }
        actor.ready_at = Some(now);
    }

    /// Signals `kind` on behalf of `by`, handing the permit to the head
    /// waiter if there is one.
    fn release(&mut self, kind: SemKind, by: TaskId, now: Tick) {
        if let Some(woken) = self.sem_mut(kind).signal(by) {
            if let Some(index) = self.actors.iter().position(|a| a.id == woken) {
                self.granted(index, kind, now);
                self.emit(IpcEventKind::Woken {
                    actor: woken,
                    semaphore: kind,
                });
            }
        }
    }

    fn write(&mut self, index: usize, now: Tick) {
        let producer = self.actors[index].id;
        debug_assert!(
            !self.buffer.is_full(),
            "{} holds an empty permit but the buffer is full",
            producer
        );
        let item = Item {
            id: self.next_item,
            producer,
            produced_at: now,
        };
        match self.buffer.push(item) {
            Ok(slot) => {
                self.next_item += 1;
                self.produced += 1;
                self.actors[index].completed += 1;
                self.emit(IpcEventKind::Produced {
                    producer,
                    item: item.id,
                    slot,
                });
            }
            Err(e) => log::error!("ipc: {} holds an empty permit but {}", producer, e),
        }
    }

    fn read(&mut self, index: usize, _now: Tick) {
        let consumer = self.actors[index].id;
        debug_assert!(
            !self.buffer.is_empty(),
            "{} holds a full permit but the buffer is empty",
            consumer
        );
        match self.buffer.pop() {
            Some((slot, item)) => {
                self.consumed += 1;
                self.actors[index].completed += 1;
                self.emit(IpcEventKind::Consumed {
                    consumer,
                    item: item.id,
                    slot,
                });
            }
            None => log::error!("ipc: {} holds a full permit but the buffer is empty", consumer),
        }
    }

    fn emit(&mut self, kind: IpcEventKind) {
        self.pending.push_back(IpcEvent {
            at: self.clock.now(),
            kind,
        });
    }

    /// Empties the buffer, restores the semaphores and rewinds every
    /// registered actor to its first attempt at time zero.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.mutex.reset();
        self.empty.reset();
        self.full.reset();
        self.clock.reset();
        self.pending.clear();
        self.next_item = 0;
        self.produced = 0;
        self.consumed = 0;
        for actor in &mut self.actors {
            *actor = Actor::new(actor.id, actor.role, actor.rate, 0);
        }
    }

    pub fn status(&self) -> IpcStatus {
        IpcStatus {
            now: self.clock.now(),
            capacity: self.buffer.capacity(),
            count: self.buffer.len(),
            head: self.buffer.head(),
            tail: self.buffer.tail(),
            slots: self.buffer.slots().to_vec(),
            actors: self
                .actors
                .iter()
                .map(|a| ActorStatus {
                    id: a.id,
                    role: a.role,
                    rate: a.rate,
                    phase: a.phase,
                    completed: a.completed,
                })
                .collect(),
            mutex: self.mutex.value(),
            empty: self.empty.value(),
            full: self.full.value(),
            produced: self.produced,
            consumed: self.consumed,
        }
    }

    pub fn buffer(&self) -> &BoundedBuffer {
        &self.buffer
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Buffer and semaphores agree once in-flight permits are counted.
    pub fn is_consistent(&self) -> bool {
        let holding = |role: Role| {
            self.actors
                .iter()
                .filter(|a| a.role == role && a.holds_slot)
                .count() as i64
        };
        let mutex_holders = self.actors.iter().filter(|a| a.holds_mutex).count() as i64;
        let count = self.buffer.len() as i64;
        let capacity = self.buffer.capacity() as i64;
        self.buffer.is_consistent()
            && self.mutex.is_consistent()
            && self.empty.is_consistent()
            && self.full.is_consistent()
            && mutex_holders <= 1
            && self.mutex.count() + mutex_holders == 1
            && self.full.count() + holding(Role::Consumer) == count
            && self.empty.count() + holding(Role::Producer) == capacity - count
    }
}
