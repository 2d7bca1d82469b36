//! Scheduling algorithms.
//!
//! The set is closed: every algorithm is a variant of [`SchedulingAlgorithm`]
//! and selection is a `match`, not a trait object.

use crate::common::{Pid, SimError, Tick};
use crate::process::ProcessTable;
use serde::Serialize;

/// CPU scheduling algorithm, chosen at configuration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SchedulingAlgorithm {
    /// First-Come First-Served (non-preemptive).
    Fcfs,

    /// Round-Robin with a fixed time slice.
    RoundRobin { quantum: Tick },

    /// Shortest Job First. The preemptive variant is SRTF.
    Sjf { preemptive: bool },

    /// Priority scheduling; smaller value wins.
    Priority { preemptive: bool },
}

impl SchedulingAlgorithm {
    /// Builds a Round-Robin configuration from a raw quantum.
    pub fn round_robin(quantum: i64) -> Result<Self, SimError> {
        if quantum <= 0 {
            return Err(SimError::invalid_param("quantum", quantum, "must be > 0"));
        }
        Ok(SchedulingAlgorithm::RoundRobin {
            quantum: quantum as Tick,
        })
    }

    /// Parses an algorithm name as used in configuration files.
    ///
    /// `quantum` is only consulted for Round-Robin.
    pub fn parse(name: &str, quantum: i64) -> Result<Self, SimError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fcfs" | "fifo" => Ok(SchedulingAlgorithm::Fcfs),
            "rr" | "round-robin" | "roundrobin" => Self::round_robin(quantum),
            "sjf" => Ok(SchedulingAlgorithm::Sjf { preemptive: false }),
            "srtf" | "sjf-preemptive" => Ok(SchedulingAlgorithm::Sjf { preemptive: true }),
            "priority" => Ok(SchedulingAlgorithm::Priority { preemptive: false }),
            "priority-preemptive" => Ok(SchedulingAlgorithm::Priority { preemptive: true }),
            other => Err(SimError::config(format!(
                "unknown scheduling algorithm '{}'",
                other
            ))),
        }
    }

    /// Re-checks parameters of a directly constructed value.
    pub fn validate(&self) -> Result<(), SimError> {
        match self {
            SchedulingAlgorithm::RoundRobin { quantum: 0 } => {
                Err(SimError::invalid_param("quantum", 0, "must be > 0"))
            }
            _ => Ok(()),
        }
    }

    /// Returns `true` if arrivals may interrupt the running process.
    pub fn preempts_on_arrival(&self) -> bool {
        matches!(
            self,
            SchedulingAlgorithm::Sjf { preemptive: true }
                | SchedulingAlgorithm::Priority { preemptive: true }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchedulingAlgorithm::Fcfs => "FCFS",
            SchedulingAlgorithm::RoundRobin { .. } => "Round-Robin",
            SchedulingAlgorithm::Sjf { preemptive: false } => "SJF",
            SchedulingAlgorithm::Sjf { preemptive: true } => "SRTF",
            SchedulingAlgorithm::Priority { preemptive: false } => "Priority",
            SchedulingAlgorithm::Priority { preemptive: true } => "Priority (preemptive)",
        }
    }

    /// Picks the next process from the ready queue.
    ///
    /// Round-Robin takes the queue head; the others minimise a key whose last
    /// component is the pid, so ties are always broken deterministically.
    pub fn select(&self, table: &ProcessTable) -> Option<Pid> {
        let ready = table.ready_queue();
        let candidates = ready.iter().filter_map(|pid| table.get(*pid));
        match self {
            SchedulingAlgorithm::RoundRobin { .. } => ready.front().copied(),
            SchedulingAlgorithm::Fcfs => candidates
                .min_by_key(|p| (p.arrival, p.pid))
                .map(|p| p.pid),
            SchedulingAlgorithm::Sjf { .. } => candidates
                .min_by_key(|p| (p.remaining, p.arrival, p.pid))
                .map(|p| p.pid),
            SchedulingAlgorithm::Priority { .. } => candidates
                .min_by_key(|p| (p.priority, p.arrival, p.pid))
                .map(|p| p.pid),
        }
    }

    /// Length of the next slice for a process with `remaining` ticks left.
    ///
    /// `next_arrival` is the earliest pending arrival strictly after `now`.
    pub fn slice_len(&self, remaining: Tick, now: Tick, next_arrival: Option<Tick>) -> Tick {
        match self {
            SchedulingAlgorithm::RoundRobin { quantum } => remaining.min(*quantum),
            _ if self.preempts_on_arrival() => match next_arrival {
                Some(at) if at > now => remaining.min(at - now),
                _ => remaining,
            },
            _ => remaining,
        }
    }
}

impl std::fmt::Display for SchedulingAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingAlgorithm::RoundRobin { quantum } => {
                write!(f, "{} (q={})", self.name(), quantum)
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}
