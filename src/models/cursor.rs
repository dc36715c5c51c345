//! Resumption point of the harvest loop.

use serde::{Deserialize, Serialize};

/// Persisted `(after, index)` pair.
///
/// `index` is only meaningful for the batch fetched with the same `after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Inclusive lower bound of the current window, epoch seconds
    pub after: i64,

    /// Position already reached in the current window's batch
    pub index: usize,
}

impl Cursor {
    pub fn new(after: i64, index: usize) -> Self {
        Self { after, index }
    }

    /// Cursor at the start of the window beginning at `after`.
    pub fn at_window(after: i64) -> Self {
        Self::new(after, 0)
    }

    /// Whether the item at `position` was already handled by an earlier run.
    pub fn already_handled(&self, position: usize) -> bool {
        position < self.index
    }
}
