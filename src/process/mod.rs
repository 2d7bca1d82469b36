//! Process and thread lifecycle model.
//!
//! Entities live in a [`ProcessTable`], which validates every state change
//! against the lifecycle graph in [`crate::common::state`] and keeps the ready
//! and blocked queues derived from entity states.

pub mod model;
pub mod table;

pub use model::{Entity, LifecycleEvent, Process, Thread, MAX_PRIORITY, MIN_PRIORITY};
pub use table::{validate_process, ProcessTable};
