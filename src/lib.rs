//! Operating-System Concepts Simulation Library.
//!
//! This crate implements a deterministic, step-driven model of classic OS
//! mechanisms: process lifecycles, CPU scheduling, variable-partition memory
//! allocation, demand paging, semaphores with the dining-philosophers problem,
//! and a bounded-buffer producer/consumer exchange. Every engine returns
//! structured events and snapshots and never renders.
//!
//! # Modules
//!
//! * `common`: Identifiers, lifecycle states, and the shared error type.
//! * `config`: Configuration loading and parsing.
//! * `process`: Process and thread table.
//! * `sched`: CPU scheduler.
//! * `mem`: Memory allocator and page replacement.
//! * `sync`: Semaphores, dining philosophers, deadlock analysis.
//! * `ipc`: Producer/consumer over a bounded buffer.
//! * `sim`: Simulation harness, live runner, and loaders.
//! * `stats`: Statistics collection and reporting.

/// Shared identifiers, lifecycle states and error handling.
///
/// Provides the id newtypes, the task state machine and the `SimError` type
/// returned by every fallible operation.
pub mod common;

/// Configuration system for every component.
///
/// Loads and parses TOML configuration files with per-field defaults.
pub mod config;

/// Inter-process communication engine.
pub mod ipc;

/// Memory management: dynamic allocation and page replacement.
pub mod mem;

/// Process and thread lifecycle model.
pub mod process;

/// CPU scheduling algorithms, timeline and metrics.
pub mod sched;

/// Simulation harness, per-run context and live threaded runner.
///
/// Coordinates the engines, drives cooperative actors and loads configuration
/// files.
pub mod sim;

/// Statistics collection and reporting.
pub mod stats;

/// Synchronisation primitives and the dining-philosophers table.
pub mod sync;
