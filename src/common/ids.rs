//! Identifier newtypes.
//!
//! Each entity kind gets its own id type so a page number can never be passed
//! where a process id is expected.

use serde::Serialize;
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $inner:ty, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Returns the raw numeric id.
            pub const fn val(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Process identifier, unique within a process table or workload.
    Pid, u32, "P"
);

id_type!(
    /// Thread identifier, unique within its parent process.
    Tid, u32, "T"
);

id_type!(
    /// Allocator block identifier. Stable for the lifetime of the block.
    BlockId, u32, "B"
);

id_type!(
    /// Virtual page number.
    PageId, u64, "pg"
);

id_type!(
    /// Identifier of a simulated actor (philosopher, producer, consumer).
    TaskId, usize, "task"
);
