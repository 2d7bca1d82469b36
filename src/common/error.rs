//! Simulation Error Types.
//!
//! Every fallible engine operation returns `Result<T, SimError>`. None of these
//! errors abort a run: the caller can inspect the component, fix its input and
//! keep stepping, or reset it.

use crate::common::state::TaskState;

/// Errors reported by the simulation engines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// A lifecycle move that is not an edge of the state graph.
    #[error("InvalidTransition: {entity} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Human-readable entity label, e.g. `process 3` or `thread 2.1`.
        entity: String,
        from: TaskState,
        to: TaskState,
    },

    /// A numeric parameter outside its allowed range.
    #[error("InvalidParameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: i64,
        reason: &'static str,
    },

    /// The allocator has no free block large enough.
    #[error("OutOfMemory: requested {requested}, largest free block {largest_free}")]
    OutOfMemory { requested: u64, largest_free: u64 },

    /// Advisory deadlock report for the listed philosophers.
    #[error("DeadlockDetected: philosophers {philosophers:?}")]
    DeadlockDetected { philosophers: Vec<usize> },

    /// Unknown algorithm name, empty workload or otherwise unusable setup.
    #[error("ConfigurationError: {0}")]
    ConfigurationError(String),
}

impl SimError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid_param(name: &'static str, value: i64, reason: &'static str) -> Self {
        SimError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Shorthand for a `ConfigurationError`.
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::ConfigurationError(msg.into())
    }

    /// Returns `true` for the kinds that must block a run from starting.
    pub fn blocks_start(&self) -> bool {
        matches!(
            self,
            SimError::InvalidParameter { .. } | SimError::ConfigurationError(_)
        )
    }
}

/// Checks that a raw caller-supplied value is strictly positive.
///
/// Returns the value as `u64` so callers can store it unsigned.
pub fn require_positive(name: &'static str, value: i64) -> Result<u64, SimError> {
    if value <= 0 {
        return Err(SimError::invalid_param(name, value, "must be > 0"));
    }
    Ok(value as u64)
}
