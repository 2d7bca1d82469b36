//! Gantt-style execution timeline.

use crate::common::{Pid, Tick};
use serde::Serialize;

/// What occupied the CPU during an interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Slot {
    Process(Pid),
    Idle,
}

/// One half-open interval `[start, end)` of the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub slot: Slot,
    pub start: Tick,
    pub end: Tick,
}

impl TimelineEntry {
    pub fn len(&self) -> Tick {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn pid(&self) -> Option<Pid> {
        match self.slot {
            Slot::Process(pid) => Some(pid),
            Slot::Idle => None,
        }
    }
}

/// Ordered, gap-free sequence of timeline entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    ///
    /// With `coalesce`, an entry that continues the previous one for the same
    /// slot extends it instead of starting a new block.
    pub fn push(&mut self, entry: TimelineEntry, coalesce: bool) {
        if entry.is_empty() {
            return;
        }
        if coalesce {
            if let Some(last) = self.entries.last_mut() {
                if last.slot == entry.slot && last.end == entry.start {
                    last.end = entry.end;
                    return;
                }
            }
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn end(&self) -> Tick {
        self.entries.last().map(|e| e.end).unwrap_or(0)
    }

    /// Total non-idle time.
    pub fn busy_time(&self) -> Tick {
        self.entries
            .iter()
            .filter(|e| e.slot != Slot::Idle)
            .map(|e| e.len())
            .sum()
    }

    pub fn idle_time(&self) -> Tick {
        self.entries
            .iter()
            .filter(|e| e.slot == Slot::Idle)
            .map(|e| e.len())
            .sum()
    }

    /// CPU time given to `pid` across all of its slices.
    pub fn time_for(&self, pid: Pid) -> Tick {
        self.entries
            .iter()
            .filter(|e| e.pid() == Some(pid))
            .map(|e| e.len())
            .sum()
    }

    /// Returns `true` if entries start at 0 and each begins where the
    /// previous one ended.
    pub fn is_contiguous(&self) -> bool {
        let mut cursor = 0;
        for entry in &self.entries {
            if entry.start != cursor || entry.end <= entry.start {
                return false;
            }
            cursor = entry.end;
        }
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
