//! Simulation harness.
//!
//! * `actor`: cooperative clock for philosophers, producers and consumers.
//! * `traits`: the `Steppable` interface shared by the engines.
//! * `context`: per-run bundle of engines built from a config.
//! * `live`: threaded runner with pause, resume and stop.
//! * `loader`: configuration file loading.

pub mod actor;
pub mod context;
pub mod live;
pub mod loader;
pub mod traits;

pub use actor::{ActorClock, Interleaving};
pub use context::{IpcReport, MemoryReport, MemoryStep, RunReport, SimContext, SyncReport};
pub use live::{Command, LiveRun};
pub use loader::load_config;
pub use traits::Steppable;
