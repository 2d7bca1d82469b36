//! Exhaustive state-space search of the untimed dining-philosophers model.
//!
//! Durations and wait-queue order are abstracted away: any philosopher may
//! take any enabled move at any point. Every reachable state whose
//! resource-allocation graph has a cycle is reported.

use super::philosophers::ForkPolicy;
use super::rag::ResourceGraph;
use crate::common::SimError;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Largest table `explore` accepts.
pub const MAX_EXPLORE_PHILOSOPHERS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ExplorePhase {
    Thinking,
    /// Wants its first fork.
    Hungry,
    /// Holds its first fork, wants the second.
    HoldingFirst,
    Eating,
}

impl ExplorePhase {
    fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0 => ExplorePhase::Thinking,
            1 => ExplorePhase::Hungry,
            2 => ExplorePhase::HoldingFirst,
            _ => ExplorePhase::Eating,
        }
    }

    fn bits(self) -> u64 {
        match self {
            ExplorePhase::Thinking => 0,
            ExplorePhase::Hungry => 1,
            ExplorePhase::HoldingFirst => 2,
            ExplorePhase::Eating => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeadlockState {
    pub phases: Vec<ExplorePhase>,
    pub cycle: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExploreReport {
    pub philosophers: usize,
    pub policy: ForkPolicy,
    /// Distinct reachable states.
    pub states: usize,
    pub deadlocks: Vec<DeadlockState>,
}

impl ExploreReport {
    pub fn is_deadlock_free(&self) -> bool {
        self.deadlocks.is_empty()
    }
}

struct Model {
    n: usize,
    orders: Vec<[usize; 2]>,
}

impl Model {
    fn phase(&self, state: u64, id: usize) -> ExplorePhase {
        ExplorePhase::from_bits(state >> (2 * id))
    }

    fn with_phase(&self, state: u64, id: usize, phase: ExplorePhase) -> u64 {
        let shift = 2 * id;
        (state & !(0b11 << shift)) | (phase.bits() << shift)
    }

    fn holders(&self, state: u64) -> Vec<Option<usize>> {
        let mut forks = vec![None; self.n];
        for id in 0..self.n {
            let [first, second] = self.orders[id];
            match self.phase(state, id) {
                ExplorePhase::HoldingFirst => forks[first] = Some(id),
                ExplorePhase::Eating => {
                    forks[first] = Some(id);
                    forks[second] = Some(id);
                }
                _ => {}
            }
        }
        forks
    }

    fn successors(&self, state: u64) -> Vec<u64> {
        let forks = self.holders(state);
        let mut next = Vec::new();
        for id in 0..self.n {
            let [first, second] = self.orders[id];
            let to = match self.phase(state, id) {
                ExplorePhase::Thinking => Some(ExplorePhase::Hungry),
                ExplorePhase::Hungry if forks[first].is_none() => Some(ExplorePhase::HoldingFirst),
                ExplorePhase::HoldingFirst if forks[second].is_none() => Some(ExplorePhase::Eating),
                ExplorePhase::Eating => Some(ExplorePhase::Thinking),
                _ => None,
            };
            if let Some(phase) = to {
                next.push(self.with_phase(state, id, phase));
            }
        }
        next
    }

    fn cycle(&self, state: u64) -> Option<Vec<usize>> {
        let forks = self.holders(state);
        let mut graph = ResourceGraph::new();
        for (fork, holder) in forks.iter().enumerate() {
            if let Some(holder) = holder {
                graph.add_hold(fork, *holder);
            }
        }
        for id in 0..self.n {
            let [first, second] = self.orders[id];
            let wanted = match self.phase(state, id) {
                ExplorePhase::Hungry => first,
                ExplorePhase::HoldingFirst => second,
                _ => continue,
            };
            if forks[wanted].is_some() {
                graph.add_wait(id, wanted);
            }
        }
        graph.find_cycle()
    }
}

/// Breadth-first search from the all-thinking state.
pub fn explore(n: usize, policy: ForkPolicy) -> Result<ExploreReport, SimError> {
    if !(2..=MAX_EXPLORE_PHILOSOPHERS).contains(&n) {
        return Err(SimError::invalid_param(
            "philosophers",
            n as i64,
            "must be within 2..=16 for exploration",
        ));
    }
    let model = Model {
        n,
        orders: (0..n).map(|id| policy.order(id, n)).collect(),
    };

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    let mut deadlocks = Vec::new();
    seen.insert(0u64);
    queue.push_back(0u64);
    while let Some(state) = queue.pop_front() {
        if let Some(cycle) = model.cycle(state) {
            deadlocks.push(DeadlockState {
                phases: (0..n).map(|id| model.phase(state, id)).collect(),
                cycle,
            });
        }
        for next in model.successors(state) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    log::info!(
        "explore: {} philosophers ({}), {} states, {} deadlocked",
        n,
        policy.name(),
        seen.len(),
        deadlocks.len()
    );
    Ok(ExploreReport {
        philosophers: n,
        policy,
        states: seen.len(),
        deadlocks,
    })
}
