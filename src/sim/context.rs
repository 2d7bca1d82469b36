//! Per-run simulation context.
//!
//! Owns one instance of every engine, built and validated from a [`Config`].
//! Nothing is global, so any number of contexts can run side by side.

use crate::common::{BlockId, Pid, SimError};
use crate::config::{Config, MemoryOp};
use crate::ipc::{IpcEvent, IpcStatus, ProducerConsumer};
use crate::mem::{MemoryAllocator, MemoryBlock, PageReplacer, PagingReport};
use crate::sched::{ScheduleReport, Scheduler};
use crate::stats::{IpcStats, MemoryRunStats, PagingStats, SchedulerStats, SimStats, SyncStats};
use crate::sync::{DiningTable, TableEvent, TableSnapshot};
use serde::Serialize;

/// Outcome of one scripted allocator request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemoryStep {
    pub op: MemoryOp,
    pub block: Option<BlockId>,
    /// Blocks released by a free request.
    pub freed: usize,
    pub error: Option<String>,
    pub fragmentation: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemoryReport {
    pub steps: Vec<MemoryStep>,
    pub blocks: Vec<MemoryBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SyncReport {
    pub events: Vec<TableEvent>,
    pub snapshot: TableSnapshot,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IpcReport {
    pub events: Vec<IpcEvent>,
    pub status: IpcStatus,
}

/// Everything a CLI run produced, for the JSON export.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub scheduler: Option<ScheduleReport>,
    pub memory: Option<MemoryReport>,
    pub paging: Option<PagingReport>,
    pub sync: Option<SyncReport>,
    pub ipc: Option<IpcReport>,
}

pub struct SimContext {
    config: Config,
    pub scheduler: Scheduler,
    pub allocator: MemoryAllocator,
    pub pager: PageReplacer,
    pub table: DiningTable,
    pub exchange: ProducerConsumer,
    stats: SimStats,
}

impl SimContext {
    /// Builds every engine. Any invalid parameter or unknown name fails here,
    /// before a single step runs.
    pub fn from_config(config: Config) -> Result<Self, SimError> {
        let mut scheduler = Scheduler::new(config.scheduler.algorithm_val()?)?;
        scheduler.load(config.scheduler.workload()?)?;

        let allocator = MemoryAllocator::new(config.memory.total, config.memory.strategy_val()?)?;
        for op in &config.memory.ops {
            if let MemoryOp::Alloc { size, .. } = op {
                if *size <= 0 {
                    return Err(SimError::invalid_param("allocation size", *size, "must be > 0"));
                }
            }
        }

        let mut pager = PageReplacer::new(config.paging.algorithm_val()?, config.paging.frames)?;
        pager.load_references(config.paging.references_val());

        let interleaving = config.interleaving();
        let table = DiningTable::new(
            config.sync.philosophers,
            config.sync.policy_val()?,
            config.sync.think_ticks,
            config.sync.eat_ticks,
            interleaving,
        )?;

        let mut exchange = ProducerConsumer::new(config.ipc.capacity, interleaving)?;
        for &rate in &config.ipc.producers {
            exchange.add_producer(rate)?;
        }
        for &rate in &config.ipc.consumers {
            exchange.add_consumer(rate)?;
        }
        // Registration events belong to setup, not to the run.
        exchange.reset();

        Ok(Self {
            config,
            scheduler,
            allocator,
            pager,
            table,
            exchange,
            stats: SimStats::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Runs the workload from the start.
    pub fn run_scheduler(&mut self) -> Result<ScheduleReport, SimError> {
        self.scheduler.reset();
        let report = self.scheduler.run_to_completion()?;
        self.stats.scheduler = Some(SchedulerStats {
            algorithm: report.algorithm.to_string(),
            completion_order: report.completion_order.clone(),
            metrics: report.metrics.clone(),
        });
        Ok(report)
    }

    /// Replays the scripted allocator requests on an empty address space.
    ///
    /// Out-of-memory is recorded per request and does not stop the script.
    pub fn run_memory(&mut self) -> MemoryReport {
        self.allocator.reset();
        let mut steps = Vec::with_capacity(self.config.memory.ops.len());
        let mut failures = 0;
        let mut compactions = 0;
        for op in &self.config.memory.ops {
            let (block, freed, error) = match op {
                MemoryOp::Alloc { size, owner } => {
                    match self.allocator.allocate(*size, owner.map(Pid)) {
                        Ok(id) => (Some(id), 0, None),
                        Err(e) => {
                            failures += 1;
                            (None, 0, Some(e.to_string()))
                        }
                    }
                }
                MemoryOp::Free { owner } => (None, self.allocator.free_owner(Pid(*owner)), None),
                MemoryOp::Compact => {
                    compactions += 1;
                    self.allocator.compact();
                    (None, 0, None)
                }
            };
            steps.push(MemoryStep {
                op: op.clone(),
                block,
                freed,
                error,
                fragmentation: self.allocator.fragmentation(),
            });
        }
        self.stats.memory = Some(MemoryRunStats {
            strategy: self.allocator.strategy().name().to_string(),
            requests: steps.len(),
            failures,
            compactions,
            occupancy: self.allocator.stats(),
        });
        MemoryReport {
            steps,
            blocks: self.allocator.blocks().to_vec(),
        }
    }

    pub fn run_paging(&mut self) -> Result<PagingReport, SimError> {
        self.pager.reset();
        let report = self.pager.run()?;
        self.stats.paging = Some(PagingStats {
            algorithm: report.algorithm.to_string(),
            frames: report.frame_count,
            accesses: self.pager.accesses(),
            faults: report.faults,
            hits: report.hits,
            fault_rate: report.fault_rate,
        });
        Ok(report)
    }

    /// Runs the dining table for at most `steps` events.
    pub fn run_sync(&mut self, steps: usize) -> SyncReport {
        self.table.reset();
        let events = self.table.run(steps);
        let snapshot = self.table.snapshot();
        self.stats.sync = Some(SyncStats {
            philosophers: self.table.len(),
            policy: self.table.policy().name().to_string(),
            events: events.len(),
            meals: self.table.meals(),
            deadlock: snapshot.deadlocked.clone(),
        });
        SyncReport { events, snapshot }
    }

    /// Runs the producer/consumer exchange for at most `steps` events.
    pub fn run_ipc(&mut self, steps: usize) -> IpcReport {
        self.exchange.reset();
        let events = self.exchange.run(steps);
        let status = self.exchange.status();
        self.stats.ipc = Some(IpcStats {
            capacity: status.capacity,
            producers: self.config.ipc.producers.len(),
            consumers: self.config.ipc.consumers.len(),
            events: events.len(),
            produced: status.produced,
            consumed: status.consumed,
            in_buffer: status.count,
        });
        IpcReport { events, status }
    }
}
