//! Dining Philosophers.
//!
//! N philosophers sit in a cycle with one fork between each neighbour pair.
//! Philosopher `i` has fork `i` on the left and fork `(i + 1) % N` on the
//! right. Every fork is a binary semaphore; when a holder puts a fork down and
//! somebody is parked on it, the fork passes straight to the head waiter.

use super::rag::ResourceGraph;
use super::semaphore::{Semaphore, WaitOutcome};
use crate::common::{SimError, TaskId, Tick};
use crate::sim::actor::{ActorClock, Interleaving};
use serde::Serialize;
use std::collections::VecDeque;

/// Fork acquisition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ForkPolicy {
    /// Left then right. Can deadlock.
    Naive,
    /// Even ids take their lower-numbered fork first, odd ids their
    /// higher-numbered fork first.
    Parity,
}

impl ForkPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ForkPolicy::Naive => "naive",
            ForkPolicy::Parity => "parity",
        }
    }

    /// Forks of philosopher `id` at a table of `n`, in acquisition order.
    pub fn order(&self, id: usize, n: usize) -> [usize; 2] {
        let left = id;
        let right = (id + 1) % n;
        match self {
            ForkPolicy::Naive => [left, right],
            ForkPolicy::Parity => {
                let (lower, higher) = (left.min(right), left.max(right));
                // With two seats both philosophers share one fork pair, so
                // opposite orders would close a cycle.
                if id % 2 == 0 || n == 2 {
                    [lower, higher]
                } else {
                    [higher, lower]
                }
            }
        }
    }
}

impl std::str::FromStr for ForkPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(ForkPolicy::Naive),
            "parity" | "prevention" => Ok(ForkPolicy::Parity),
            other => Err(SimError::config(format!("unknown fork policy '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhilosopherState {
    Thinking,
    Hungry,
    Eating,
}

/// Protocol position of one philosopher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Thinking until the actor's wakeup tick.
    Thinking,
    /// About to request fork `order[k]`.
    Acquire(usize),
    /// Parked on fork `order[k]`.
    Waiting(usize),
    /// Holds both forks, about to start eating.
    Ready,
    /// Eating until the actor's wakeup tick.
    Eating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ForkState {
    Free,
    Held(usize),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TableEventKind {
    Hungry { philosopher: usize },
    PickedUp { philosopher: usize, fork: usize },
    Blocked { philosopher: usize, fork: usize },
    PutDown { philosopher: usize, fork: usize },
    /// A released fork went directly to a parked philosopher.
    Handed { fork: usize, from: usize, to: usize },
    StartedEating { philosopher: usize },
    FinishedEating { philosopher: usize },
    DeadlockDetected { philosophers: Vec<usize> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableEvent {
    pub at: Tick,
    pub kind: TableEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub now: Tick,
    pub states: Vec<PhilosopherState>,
    pub forks: Vec<ForkState>,
    pub meals: Vec<u64>,
    pub deadlocked: Option<Vec<usize>>,
}

struct Philosopher {
    state: PhilosopherState,
    phase: Phase,
    order: [usize; 2],
    ready_at: Option<Tick>,
    meals: u64,
}

pub struct DiningTable {
    policy: ForkPolicy,
    think_ticks: Tick,
    eat_ticks: Tick,
    philosophers: Vec<Philosopher>,
    forks: Vec<ForkState>,
    semaphores: Vec<Semaphore>,
    clock: ActorClock,
    pending: VecDeque<TableEvent>,
    deadlock: Option<Vec<usize>>,
}

impl DiningTable {
    /// Seats `n` philosophers. `n < 2` or zero durations are rejected.
    pub fn new(
        n: i64,
        policy: ForkPolicy,
        think_ticks: i64,
        eat_ticks: i64,
        interleaving: Interleaving,
    ) -> Result<Self, SimError> {
        if n < 2 {
            return Err(SimError::invalid_param("philosophers", n, "must be >= 2"));
        }
        let think_ticks = crate::common::error::require_positive("think ticks", think_ticks)?;
        let eat_ticks = crate::common::error::require_positive("eat ticks", eat_ticks)?;
        let n = n as usize;
        let semaphores = (0..n)
            .map(|i| Semaphore::new(format!("fork{}", i), 1))
            .collect::<Result<Vec<_>, _>>()?;
        let mut table = Self {
            policy,
            think_ticks,
            eat_ticks,
            philosophers: Vec::with_capacity(n),
            forks: vec![ForkState::Free; n],
            semaphores,
            clock: ActorClock::new(interleaving),
            pending: VecDeque::new(),
            deadlock: None,
        };
        table.reset();
        Ok(table)
    }

    /// Every philosopher back to thinking, every fork free, time zero.
    pub fn reset(&mut self) {
        let n = self.forks.len();
        self.philosophers = (0..n)
            .map(|i| Philosopher {
                state: PhilosopherState::Thinking,
                phase: Phase::Thinking,
                order: self.policy.order(i, n),
                ready_at: Some(self.think_ticks),
                meals: 0,
            })
            .collect();
        self.forks.iter_mut().for_each(|f| *f = ForkState::Free);
        self.semaphores.iter_mut().for_each(Semaphore::reset);
        self.clock.reset();
        self.pending.clear();
        self.deadlock = None;
    }

    /// Produces the next event, or `None` once every philosopher is blocked.
    pub fn step(&mut self) -> Option<TableEvent> {
        if self.pending.is_empty() {
            self.advance();
        }
        self.pending.pop_front()
    }

    /// Runs up to `steps` events.
    pub fn run(&mut self, steps: usize) -> Vec<TableEvent> {
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
        let ready: Vec<Option<Tick>> = self.philosophers.iter().map(|p| p.ready_at).collect();
        let Some(id) = self.clock.pick(&ready) else {
            return;
        };
        let now = self.clock.now();
        match self.philosophers[id].phase {
            Phase::Thinking => {
                let p = &mut self.philosophers[id];
                p.state = PhilosopherState::Hungry;
                p.phase = Phase::Acquire(0);
                p.ready_at = Some(now);
                self.emit(TableEventKind::Hungry { philosopher: id });
            }
            Phase::Acquire(k) => {
                let fork = self.philosophers[id].order[k];
                match self.semaphores[fork].wait(TaskId(id)) {
                    WaitOutcome::Acquired => {
                        self.forks[fork] = ForkState::Held(id);
                        self.after_acquire(id, k, now);
                        self.emit(TableEventKind::PickedUp {
                            philosopher: id,
                            fork,
                        });
                    }
                    WaitOutcome::Blocked => {
                        let p = &mut self.philosophers[id];
                        p.phase = Phase::Waiting(k);
                        p.ready_at = None;
                        self.emit(TableEventKind::Blocked {
                            philosopher: id,
                            fork,
                        });
                    }
                }
            }
            Phase::Ready => {
                let p = &mut self.philosophers[id];
                p.state = PhilosopherState::Eating;
                p.phase = Phase::Eating;
                p.ready_at = Some(now + self.eat_ticks);
                self.emit(TableEventKind::StartedEating { philosopher: id });
            }
            Phase::Eating => {
                let order = self.philosophers[id].order;
                {
                    let p = &mut self.philosophers[id];
                    p.state = PhilosopherState::Thinking;
                    p.phase = Phase::Thinking;
                    p.ready_at = Some(now + self.think_ticks);
                    p.meals += 1;
                }
                self.emit(TableEventKind::FinishedEating { philosopher: id });
                for fork in order.into_iter().rev() {
                    self.put_down(id, fork, now);
                }
            }
            // Parked philosophers are never picked.
            Phase::Waiting(_) => {}
        }
        self.detect_deadlock();
    }

    fn after_acquire(&mut self, id: usize, k: usize, now: Tick) {
        let p = &mut self.philosophers[id];
        p.phase = if k == 0 { Phase::Acquire(1) } else { Phase::Ready };
        p.ready_at = Some(now);
    }

    fn put_down(&mut self, id: usize, fork: usize, now: Tick) {
        self.forks[fork] = ForkState::Free;
        self.emit(TableEventKind::PutDown {
            philosopher: id,
            fork,
        });
        if let Some(TaskId(next)) = self.semaphores[fork].signal(TaskId(id)) {
            self.forks[fork] = ForkState::Held(next);
            if let Phase::Waiting(k) = self.philosophers[next].phase {
                self.after_acquire(next, k, now);
            }
            self.emit(TableEventKind::Handed {
                fork,
                from: id,
                to: next,
            });
        }
    }

    fn emit(&mut self, kind: TableEventKind) {
        self.pending.push_back(TableEvent {
            at: self.clock.now(),
            kind,
        });
    }

    fn graph(&self) -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        for (fork, state) in self.forks.iter().enumerate() {
            if let ForkState::Held(holder) = state {
                graph.add_hold(fork, *holder);
            }
        }
        for (id, p) in self.philosophers.iter().enumerate() {
            if let Phase::Waiting(k) = p.phase {
                graph.add_wait(id, p.order[k]);
            }
        }
        graph
    }

    fn detect_deadlock(&mut self) {
        if self.deadlock.is_some() {
            return;
        }
        if let Some(cycle) = self.graph().find_cycle() {
            log::warn!("dining table: deadlock among philosophers {:?}", cycle);
            self.deadlock = Some(cycle.clone());
            self.emit(TableEventKind::DeadlockDetected {
                philosophers: cycle,
            });
        }
    }

    /// `Err(DeadlockDetected)` while the wait graph has a cycle.
    pub fn check_deadlock(&self) -> Result<(), SimError> {
        match self.graph().find_cycle() {
            Some(philosophers) => Err(SimError::DeadlockDetected { philosophers }),
            None => Ok(()),
        }
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            now: self.clock.now(),
            states: self.philosophers.iter().map(|p| p.state).collect(),
            forks: self.forks.clone(),
            meals: self.philosophers.iter().map(|p| p.meals).collect(),
            deadlocked: self.deadlock.clone(),
        }
    }

    pub fn policy(&self) -> ForkPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.philosophers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.philosophers.is_empty()
    }

    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    pub fn forks(&self) -> &[ForkState] {
        &self.forks
    }

    pub fn fork_semaphore(&self, fork: usize) -> Option<&Semaphore> {
        self.semaphores.get(fork)
    }

    /// Total meals eaten so far.
    pub fn meals(&self) -> u64 {
        self.philosophers.iter().map(|p| p.meals).sum()
    }

    /// Every eating philosopher holds both of its forks and no fork has two
    /// holders.
    pub fn is_consistent(&self) -> bool {
        let eating_ok = self.philosophers.iter().enumerate().all(|(id, p)| {
            p.state != PhilosopherState::Eating
                || p.order.iter().all(|&f| self.forks[f] == ForkState::Held(id))
        });
        let semaphores_ok = self.semaphores.iter().all(|s| s.is_consistent() && s.value() <= 1);
        let forks_ok = self.forks.iter().enumerate().all(|(f, state)| match state {
            ForkState::Free => self.semaphores[f].value() == 1,
            ForkState::Held(_) => self.semaphores[f].value() <= 0,
        });
        eating_ok && semaphores_ok && forks_ok
    }
}
