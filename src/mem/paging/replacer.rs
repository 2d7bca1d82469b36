//! Page Replacement Engine.
//!
//! Simulates demand paging over a fixed set of frames. Free frames are filled
//! lowest index first; only once every frame is occupied does the configured
//! policy choose a victim.

use super::frame::Frame;
use super::policies::{ClockPolicy, FifoPolicy, LruPolicy, OptPolicy, ReplacementPolicy};
use crate::common::{PageId, SimError, Tick};
use serde::Serialize;

/// Page replacement algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PageAlgorithm {
    Fifo,
    Lru,
    Opt,
    Clock,
}

impl PageAlgorithm {
    pub const ALL: [PageAlgorithm; 4] = [
        PageAlgorithm::Fifo,
        PageAlgorithm::Lru,
        PageAlgorithm::Opt,
        PageAlgorithm::Clock,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PageAlgorithm::Fifo => "FIFO",
            PageAlgorithm::Lru => "LRU",
            PageAlgorithm::Opt => "OPT",
            PageAlgorithm::Clock => "CLOCK",
        }
    }

    fn policy(&self, frames: usize) -> Box<dyn ReplacementPolicy> {
        match self {
            PageAlgorithm::Fifo => Box::new(FifoPolicy),
            PageAlgorithm::Lru => Box::new(LruPolicy::new(frames)),
            PageAlgorithm::Opt => Box::new(OptPolicy),
            PageAlgorithm::Clock => Box::new(ClockPolicy::new()),
        }
    }
}

impl std::str::FromStr for PageAlgorithm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(PageAlgorithm::Fifo),
            "lru" => Ok(PageAlgorithm::Lru),
            "opt" | "optimal" => Ok(PageAlgorithm::Opt),
            "clock" | "second-chance" => Ok(PageAlgorithm::Clock),
            other => Err(SimError::config(format!("unknown page algorithm '{}'", other))),
        }
    }
}

impl std::fmt::Display for PageAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single page reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccessEvent {
    /// 1-based access number.
    pub step: Tick,
    pub page: PageId,
    pub hit: bool,
    /// Frame now holding the page.
    pub frame: usize,
    /// Page evicted to make room, if any.
    pub evicted: Option<PageId>,
}

/// Full trace of a paging run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PagingReport {
    pub algorithm: PageAlgorithm,
    pub frame_count: usize,
    pub events: Vec<AccessEvent>,
    pub faults: u64,
    pub hits: u64,
    pub fault_rate: f64,
}

/// Point-in-time view of the frames.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PagingSnapshot {
    pub step: Tick,
    pub frames: Vec<Option<PageId>>,
    pub faults: u64,
    pub hits: u64,
    /// Next reference that `step()` would access.
    pub next: Option<PageId>,
}

pub struct PageReplacer {
    algorithm: PageAlgorithm,
    frames: Vec<Frame>,
    policy: Box<dyn ReplacementPolicy>,
    references: Vec<PageId>,
    /// Index of the next reference in `references`.
    cursor: usize,
    clock: Tick,
    faults: u64,
    hits: u64,
    events: Vec<AccessEvent>,
}

impl PageReplacer {
    pub fn new(algorithm: PageAlgorithm, frame_count: i64) -> Result<Self, SimError> {
        let n = Self::check_frames(frame_count)?;
        Ok(Self {
            algorithm,
            frames: (0..n).map(Frame::empty).collect(),
            policy: algorithm.policy(n),
            references: Vec::new(),
            cursor: 0,
            clock: 0,
            faults: 0,
            hits: 0,
            events: Vec::new(),
        })
    }

    fn check_frames(frame_count: i64) -> Result<usize, SimError> {
        if frame_count <= 0 {
            return Err(SimError::invalid_param("frame count", frame_count, "must be > 0"));
        }
        Ok(frame_count as usize)
    }

    /// Switches algorithm and frame count, keeping the loaded references.
    pub fn configure(
        &mut self,
        algorithm: PageAlgorithm,
        frame_count: i64,
    ) -> Result<(), SimError> {
        let n = Self::check_frames(frame_count)?;
        self.algorithm = algorithm;
        self.frames = (0..n).map(Frame::empty).collect();
        self.policy = algorithm.policy(n);
        self.reset();
        Ok(())
    }

    /// Loads the reference string consumed by `step` and `run`, and rewinds.
    pub fn load_references(&mut self, references: Vec<PageId>) {
        self.references = references;
        self.reset();
    }

    /// Empties every frame and rewinds the reference string.
    pub fn reset(&mut self) {
        for frame in &mut self.frames {
            *frame = Frame::empty(frame.index);
        }
        self.policy.reset();
        self.cursor = 0;
        self.clock = 0;
        self.faults = 0;
        self.hits = 0;
        self.events.clear();
    }

    /// References `page`.
    ///
    /// An access equal to the next loaded reference consumes it. OPT requires
    /// a loaded reference string and rejects accesses that diverge from it.
    pub fn access(&mut self, page: PageId) -> Result<AccessEvent, SimError> {
        let on_trace = self.references.get(self.cursor) == Some(&page);
        if self.algorithm == PageAlgorithm::Opt {
            if self.references.is_empty() {
                return Err(SimError::config("OPT requires the reference string up front"));
            }
            if !on_trace {
                return Err(SimError::config(format!(
                    "access to {} diverges from the loaded reference string",
                    page
                )));
            }
        }
        if on_trace {
            self.cursor += 1;
        }
        self.clock += 1;
        let now = self.clock;

        let event = if let Some(index) = self.frames.iter().position(|f| f.page == Some(page)) {
            self.frames[index].touch(now);
            self.policy.touch(index);
            self.hits += 1;
            AccessEvent {
                step: now,
                page,
                hit: true,
                frame: index,
                evicted: None,
            }
        } else {
            self.faults += 1;
            let (index, evicted) = match self.frames.iter().position(Frame::is_free) {
                Some(index) => (index, None),
                None => {
                    let upcoming = &self.references[self.cursor.min(self.references.len())..];
                    let index = self.policy.victim(&mut self.frames, upcoming);
                    (index, self.frames[index].page)
                }
            };
            self.frames[index].load(page, now);
            self.policy.touch(index);
            log::debug!(
                "paging: fault on {} -> frame {} (evicted {:?})",
                page,
                index,
                evicted
            );
            AccessEvent {
                step: now,
                page,
                hit: false,
                frame: index,
                evicted,
            }
        };
        self.events.push(event);
        Ok(event)
    }

    /// Accesses the next loaded reference. `Ok(None)` once exhausted.
    pub fn step(&mut self) -> Result<Option<AccessEvent>, SimError> {
        match self.references.get(self.cursor).copied() {
            Some(page) => self.access(page).map(Some),
            None => Ok(None),
        }
    }

    /// Accesses every remaining reference and returns the full trace.
    pub fn run(&mut self) -> Result<PagingReport, SimError> {
        if self.algorithm == PageAlgorithm::Opt && self.references.is_empty() {
            return Err(SimError::config("OPT requires the reference string up front"));
        }
        while self.step()?.is_some() {}
        Ok(self.report())
    }

    pub fn report(&self) -> PagingReport {
        PagingReport {
            algorithm: self.algorithm,
            frame_count: self.frames.len(),
            events: self.events.clone(),
            faults: self.faults,
            hits: self.hits,
            fault_rate: self.fault_rate(),
        }
    }

    pub fn snapshot(&self) -> PagingSnapshot {
        PagingSnapshot {
            step: self.clock,
            frames: self.frames.iter().map(|f| f.page).collect(),
            faults: self.faults,
            hits: self.hits,
            next: self.references.get(self.cursor).copied(),
        }
    }

    pub fn algorithm(&self) -> PageAlgorithm {
        self.algorithm
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn references(&self) -> &[PageId] {
        &self.references
    }

    pub fn events(&self) -> &[AccessEvent] {
        &self.events
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn accesses(&self) -> u64 {
        self.clock
    }

    /// Faults / accesses; 0 before the first access.
    pub fn fault_rate(&self) -> f64 {
        if self.clock == 0 {
            0.0
        } else {
            self.faults as f64 / self.clock as f64
        }
    }

    pub fn hit_rate(&self) -> f64 {
        if self.clock == 0 {
            0.0
        } else {
            self.hits as f64 / self.clock as f64
        }
    }

    /// Returns `true` when every loaded reference has been accessed.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.references.len()
    }
}

/// Convenience wrapper: page ids from raw numbers.
pub fn pages(raw: &[u64]) -> Vec<PageId> {
    raw.iter().copied().map(PageId).collect()
}
