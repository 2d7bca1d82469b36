//! Simulation statistics collection and reporting.
//!
//! Gathers the headline metrics of each component run and prints them as a
//! sectioned report. Serialisable for the JSON export.

use crate::common::Pid;
use crate::mem::MemoryStats;
use crate::sched::ScheduleMetrics;
use serde::Serialize;
use std::time::Instant;

#[derive(Clone, Debug, Serialize)]
pub struct SchedulerStats {
    pub algorithm: String,
    pub completion_order: Vec<Pid>,
    pub metrics: ScheduleMetrics,
}

#[derive(Clone, Debug, Serialize)]
pub struct MemoryRunStats {
    pub strategy: String,
    pub requests: usize,
    pub failures: usize,
    pub compactions: usize,
    pub occupancy: MemoryStats,
}

#[derive(Clone, Debug, Serialize)]
pub struct PagingStats {
    pub algorithm: String,
    pub frames: usize,
    pub accesses: u64,
    pub faults: u64,
    pub hits: u64,
    pub fault_rate: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SyncStats {
    pub philosophers: usize,
    pub policy: String,
    pub events: usize,
    pub meals: u64,
    pub deadlock: Option<Vec<usize>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct IpcStats {
    pub capacity: usize,
    pub producers: usize,
    pub consumers: usize,
    pub events: usize,
    pub produced: u64,
    pub consumed: u64,
    pub in_buffer: usize,
}

/// Simulation statistics structure, one optional section per component.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    pub scheduler: Option<SchedulerStats>,
    pub memory: Option<MemoryRunStats>,
    pub paging: Option<PagingStats>,
    pub sync: Option<SyncStats>,
    pub ipc: Option<IpcStats>,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            scheduler: None,
            memory: None,
            paging: None,
            sync: None,
            ipc: None,
        }
    }
}

impl SimStats {
    /// Prints a formatted summary of every component that ran.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();

        println!("\n==========================================================");
        println!("OS SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);

        if let Some(s) = &self.scheduler {
            let m = &s.metrics;
            println!("----------------------------------------------------------");
            println!("CPU SCHEDULER ({})", s.algorithm);
            println!("  processes              {} ({} completed)", m.process_count, m.completed);
            println!("  avg_waiting            {:.2}", m.avg_waiting);
            println!("  avg_turnaround         {:.2}", m.avg_turnaround);
            println!("  avg_response           {:.2}", m.avg_response);
            println!("  makespan               {}", m.makespan);
            println!(
                "  cpu_utilization        {:.2}% (busy {}, idle {})",
                m.cpu_utilization * 100.0,
                m.busy_time,
                m.idle_time
            );
            println!("  throughput             {:.4} /tick", m.throughput);
            let order: Vec<String> = s.completion_order.iter().map(|p| p.to_string()).collect();
            println!("  completion_order       {}", order.join(" "));
        }

        if let Some(s) = &self.memory {
            let o = &s.occupancy;
            println!("----------------------------------------------------------");
            println!("MEMORY ALLOCATOR ({})", s.strategy);
            println!("  requests               {} ({} failed)", s.requests, s.failures);
            println!("  compactions            {}", s.compactions);
            println!("  used                   {} / {} ({:.2}%)", o.used, o.total, o.usage_pct);
            println!("  free_blocks            {}", o.free_blocks);
            println!("  largest_free           {}", o.largest_free);
            println!("  fragmentation          {}", o.fragmentation);
        }

        if let Some(s) = &self.paging {
            println!("----------------------------------------------------------");
            println!("PAGE REPLACEMENT ({}, {} frames)", s.algorithm, s.frames);
            println!("  accesses               {}", s.accesses);
            println!("  faults                 {}", s.faults);
            println!("  hits                   {}", s.hits);
            println!("  fault_rate             {:.2}%", s.fault_rate * 100.0);
        }

        if let Some(s) = &self.sync {
            println!("----------------------------------------------------------");
            println!("DINING PHILOSOPHERS ({}, {} seats)", s.policy, s.philosophers);
            println!("  events                 {}", s.events);
            println!("  meals                  {}", s.meals);
            match &s.deadlock {
                Some(cycle) => println!("  deadlock               {:?}", cycle),
                None => println!("  deadlock               none"),
            }
        }

        if let Some(s) = &self.ipc {
            println!("----------------------------------------------------------");
            println!(
                "PRODUCER/CONSUMER (capacity {}, {}P/{}C)",
                s.capacity, s.producers, s.consumers
            );
            println!("  events                 {}", s.events);
            println!("  produced               {}", s.produced);
            println!("  consumed               {}", s.consumed);
            println!("  in_buffer              {}", s.in_buffer);
        }
        println!("==========================================================");
    }
}
