//! CPU scheduling.
//!
//! * `algorithm`: the closed set of policies and their selection keys.
//! * `scheduler`: the stepping engine that drives processes through the table.
//! * `timeline`: Gantt-style record of CPU occupancy.
//! * `metrics`: per-process results and averages.

pub mod algorithm;
pub mod metrics;
pub mod scheduler;
pub mod timeline;

pub use algorithm::SchedulingAlgorithm;
pub use metrics::{MetricsDelta, ProcessResult, ScheduleMetrics};
pub use scheduler::{Decision, ScheduleReport, Scheduler, SchedulerSnapshot, SliceOutcome};
pub use timeline::{Slot, Timeline, TimelineEntry};
