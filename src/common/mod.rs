//! Common utilities and types used throughout the simulator.
//!
//! This module provides the identifier newtypes, the shared task lifecycle
//! state machine, and the error type returned by every engine.

/// Error type shared by all engines.
pub mod error;

/// Identifier newtypes (process, thread, block, page, actor).
pub mod ids;

/// Task lifecycle states and the legal transition graph.
pub mod state;

pub use error::SimError;
pub use ids::{BlockId, PageId, Pid, TaskId, Tid};
pub use state::{QueueKind, TaskState};

/// Simulated time, in abstract ticks.
pub type Tick = u64;
