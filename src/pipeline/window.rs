// src/pipeline/window.rs

use std::fmt;

use crate::utils::format_epoch;

/// Half-open search window `[after, before)`, epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub after: i64,
    pub before: i64,
}

impl Window {
    /// Window of `step` seconds starting at `after`.
    pub fn starting_at(after: i64, step: i64) -> Self {
        Self {
            after,
            before: after.saturating_add(step),
        }
    }

    pub fn step(&self) -> i64 {
        self.before - self.after
    }

    /// The adjacent window that follows this one.
    pub fn next(&self) -> Self {
        Self::starting_at(self.before, self.step())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_epoch(self.after),
            format_epoch(self.before)
        )
    }
}
