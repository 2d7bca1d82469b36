//! Per-process results and aggregate scheduling metrics.

use super::timeline::Timeline;
use crate::common::{Pid, Tick};
use crate::process::Process;
use serde::Serialize;

/// Outcome of one process in a schedule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessResult {
    pub pid: Pid,
    pub name: String,
    pub arrival: Tick,
    pub burst: Tick,
    pub priority: i32,
    pub start: Option<Tick>,
    pub completion: Option<Tick>,
    /// `completion - arrival - burst`.
    pub waiting: Option<Tick>,
    /// `completion - arrival`.
    pub turnaround: Option<Tick>,
    /// `start - arrival`.
    pub response: Option<Tick>,
}

impl From<&Process> for ProcessResult {
    fn from(p: &Process) -> Self {
        Self {
            pid: p.pid,
            name: p.name.clone(),
            arrival: p.arrival,
            burst: p.burst,
            priority: p.priority,
            start: p.start_time,
            completion: p.completion_time,
            waiting: p.waiting(),
            turnaround: p.turnaround(),
            response: p.start_time.map(|s| s - p.arrival),
        }
    }
}

/// Aggregate metrics over the completed processes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScheduleMetrics {
    pub process_count: usize,
    pub completed: usize,
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
    pub avg_response: f64,
    pub makespan: Tick,
    pub busy_time: Tick,
    pub idle_time: Tick,
    /// `busy_time / makespan`, 0 for an empty timeline.
    pub cpu_utilization: f64,
    /// Completed processes per tick of makespan.
    pub throughput: f64,
}

impl ScheduleMetrics {
    /// Computes metrics from the results and timeline gathered so far.
    pub fn compute(results: &[ProcessResult], timeline: &Timeline) -> Self {
        let done: Vec<&ProcessResult> = results.iter().filter(|r| r.completion.is_some()).collect();
        let n = done.len();
        let mean = |f: fn(&ProcessResult) -> Option<Tick>| -> f64 {
            if n == 0 {
                return 0.0;
            }
            done.iter().filter_map(|r| f(*r)).sum::<Tick>() as f64 / n as f64
        };

        let makespan = timeline.end();
        let busy_time = timeline.busy_time();
        let (cpu_utilization, throughput) = if makespan == 0 {
            (0.0, 0.0)
        } else {
            (
                busy_time as f64 / makespan as f64,
                n as f64 / makespan as f64,
            )
        };

        Self {
            process_count: results.len(),
            completed: n,
            avg_waiting: mean(|r| r.waiting),
            avg_turnaround: mean(|r| r.turnaround),
            avg_response: mean(|r| r.response),
            makespan,
            busy_time,
            idle_time: timeline.idle_time(),
            cpu_utilization,
            throughput,
        }
    }
}

/// Metric change caused by a single scheduling decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsDelta {
    pub busy: Tick,
    pub idle: Tick,
    pub completed: usize,
}
