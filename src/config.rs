use crate::common::error::require_positive;
use crate::common::{PageId, Pid, SimError};
use crate::mem::{FitStrategy, PageAlgorithm};
use crate::process::Process;
use crate::sched::SchedulingAlgorithm;
use crate::sim::actor::Interleaving;
use crate::sync::ForkPolicy;
use serde::{Deserialize, Serialize};

const DEFAULT_STEPS: usize = 200;
const DEFAULT_QUANTUM: i64 = 2;
const DEFAULT_MEMORY_SIZE: i64 = 1024;
const DEFAULT_FRAMES: i64 = 3;
const DEFAULT_PHILOSOPHERS: i64 = 5;
const DEFAULT_THINK_TICKS: i64 = 3;
const DEFAULT_EAT_TICKS: i64 = 2;
const DEFAULT_CAPACITY: i64 = 10;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub ipc: IpcConfig,
}

impl Config {
    /// Parses a TOML document. Missing sections and fields take defaults.
    pub fn from_toml(text: &str) -> Result<Self, SimError> {
        toml::from_str(text).map_err(|e| SimError::config(format!("invalid config: {}", e)))
    }

    /// Actor interleaving: seeded when `general.seed` is set.
    pub fn interleaving(&self) -> Interleaving {
        match self.general.seed {
            Some(seed) => Interleaving::Seeded(seed),
            None => Interleaving::RoundRobin,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Event budget for the open-ended components (sync, ipc).
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            seed: None,
            steps: default_steps(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_sched_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_quantum")]
    pub quantum: i64,
    #[serde(default = "default_workload")]
    pub processes: Vec<ProcessSpec>,
}

impl SchedulerConfig {
    pub fn algorithm_val(&self) -> Result<SchedulingAlgorithm, SimError> {
        SchedulingAlgorithm::parse(&self.algorithm, self.quantum)
    }

    /// Builds the workload. Pids follow list order starting at 1.
    pub fn workload(&self) -> Result<Vec<Process>, SimError> {
        self.processes
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let burst = require_positive("burst", spec.burst)?;
                Ok(Process::new(
                    Pid(i as u32 + 1),
                    spec.name.clone(),
                    spec.arrival,
                    burst,
                    spec.priority,
                ))
            })
            .collect()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            algorithm: default_sched_algorithm(),
            quantum: default_quantum(),
            processes: default_workload(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    #[serde(default)]
    pub arrival: u64,
    pub burst: i64,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_size")]
    pub total: i64,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_memory_ops")]
    pub ops: Vec<MemoryOp>,
}

impl MemoryConfig {
    pub fn strategy_val(&self) -> Result<FitStrategy, SimError> {
        self.strategy.parse()
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            total: default_memory_size(),
            strategy: default_strategy(),
            ops: default_memory_ops(),
        }
    }
}

/// One scripted allocator request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum MemoryOp {
    Alloc {
        size: i64,
        #[serde(default)]
        owner: Option<u32>,
    },
    /// Frees every block of `owner`.
    Free { owner: u32 },
    Compact,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_frames")]
    pub frames: i64,
    #[serde(default = "default_references")]
    pub references: Vec<u64>,
}

impl PagingConfig {
    pub fn algorithm_val(&self) -> Result<PageAlgorithm, SimError> {
        self.algorithm.parse()
    }

    pub fn references_val(&self) -> Vec<PageId> {
        self.references.iter().copied().map(PageId).collect()
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            algorithm: default_page_algorithm(),
            frames: default_frames(),
            references: default_references(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_philosophers")]
    pub philosophers: i64,
    #[serde(default = "default_fork_policy")]
    pub policy: String,
    #[serde(default = "default_think_ticks")]
    pub think_ticks: i64,
    #[serde(default = "default_eat_ticks")]
    pub eat_ticks: i64,
}

impl SyncConfig {
    pub fn policy_val(&self) -> Result<ForkPolicy, SimError> {
        self.policy.parse()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            philosophers: default_philosophers(),
            policy: default_fork_policy(),
            think_ticks: default_think_ticks(),
            eat_ticks: default_eat_ticks(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct IpcConfig {
    #[serde(default = "default_capacity")]
    pub capacity: i64,
    /// One entry per producer: ticks between attempts.
    #[serde(default = "default_producer_rates")]
    pub producers: Vec<i64>,
    #[serde(default = "default_consumer_rates")]
    pub consumers: Vec<i64>,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            producers: default_producer_rates(),
            consumers: default_consumer_rates(),
        }
    }
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

fn default_sched_algorithm() -> String {
    "fcfs".to_string()
}

fn default_quantum() -> i64 {
    DEFAULT_QUANTUM
}

fn default_priority() -> i32 {
    crate::process::model::DEFAULT_PRIORITY
}

fn default_workload() -> Vec<ProcessSpec> {
    [("P1", 0, 5, 3), ("P2", 1, 3, 1), ("P3", 2, 8, 4), ("P4", 3, 2, 2), ("P5", 4, 4, 5)]
        .into_iter()
        .map(|(name, arrival, burst, priority)| ProcessSpec {
            name: name.to_string(),
            arrival,
            burst,
            priority,
        })
        .collect()
}

fn default_memory_size() -> i64 {
    DEFAULT_MEMORY_SIZE
}

fn default_strategy() -> String {
    "first-fit".to_string()
}

fn default_memory_ops() -> Vec<MemoryOp> {
    vec![
        MemoryOp::Alloc { size: 100, owner: Some(1) },
        MemoryOp::Alloc { size: 200, owner: Some(2) },
        MemoryOp::Alloc { size: 50, owner: Some(3) },
        MemoryOp::Free { owner: 2 },
        MemoryOp::Alloc { size: 150, owner: Some(4) },
    ]
}

fn default_page_algorithm() -> String {
    "fifo".to_string()
}

fn default_frames() -> i64 {
    DEFAULT_FRAMES
}

fn default_references() -> Vec<u64> {
    vec![7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2]
}

fn default_philosophers() -> i64 {
    DEFAULT_PHILOSOPHERS
}

fn default_fork_policy() -> String {
    "parity".to_string()
}

fn default_think_ticks() -> i64 {
    DEFAULT_THINK_TICKS
}

fn default_eat_ticks() -> i64 {
    DEFAULT_EAT_TICKS
}

fn default_capacity() -> i64 {
    DEFAULT_CAPACITY
}

fn default_producer_rates() -> Vec<i64> {
    vec![2]
}

fn default_consumer_rates() -> Vec<i64> {
    vec![3]
}
