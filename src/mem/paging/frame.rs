//! Physical frame state.

use crate::common::{PageId, Tick};
use serde::Serialize;

/// One physical frame of the simulated memory.
///
/// Timestamps are access step numbers, so a frame loaded on the third
/// reference has `loaded_at == 3`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub index: usize,
    pub page: Option<PageId>,
    pub loaded_at: Tick,
    pub last_access: Tick,
    /// Reference bit used by CLOCK.
    pub use_bit: bool,
}

impl Frame {
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            page: None,
            loaded_at: 0,
            last_access: 0,
            use_bit: false,
        }
    }

    pub fn is_free(&self) -> bool {
        self.page.is_none()
    }

    /// Places `page` in the frame at step `now`.
    pub fn load(&mut self, page: PageId, now: Tick) {
        self.page = Some(page);
        self.loaded_at = now;
        self.last_access = now;
        self.use_bit = true;
    }

    /// Records a hit at step `now`.
    pub fn touch(&mut self, now: Tick) {
        self.last_access = now;
        self.use_bit = true;
    }
}
