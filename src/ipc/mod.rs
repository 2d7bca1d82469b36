//! Inter-process communication: the bounded-buffer producer/consumer exchange.

pub mod buffer;
pub mod exchange;

pub use buffer::{BoundedBuffer, Item};
pub use exchange::{
    ActorPhase, ActorStatus, IpcEvent, IpcEventKind, IpcStatus, ProducerConsumer, Role, SemKind,
};
