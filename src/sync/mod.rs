//! Synchronisation: counting semaphores and the dining-philosophers table.
//!
//! * `semaphore`: signed-counter semaphore with a FIFO wait queue.
//! * `philosophers`: timed dining table driven by the actor clock.
//! * `rag`: resource-allocation graph used for deadlock detection.
//! * `explore`: exhaustive search of the untimed table.

pub mod explore;
pub mod philosophers;
pub mod rag;
pub mod semaphore;

pub use explore::{explore, DeadlockState, ExplorePhase, ExploreReport};
pub use philosophers::{
    DiningTable, ForkPolicy, ForkState, PhilosopherState, TableEvent, TableEventKind, TableSnapshot,
};
pub use rag::ResourceGraph;
pub use semaphore::{Semaphore, SemaphoreOp, SemaphoreOpKind, WaitOutcome};
