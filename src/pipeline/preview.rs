// src/pipeline/preview.rs

//! Dry run of the current window.
//!
//! Fetches and classifies the window the cursor points at without writing
//! the cursor, publishing or cooling down.

use std::fmt;

use crate::models::{Cursor, SubmissionRecord};
use crate::pipeline::harvest::HarvestSettings;
use crate::pipeline::window::Window;
use crate::services::{
    Availability, AvailabilityCheck, EligibilityFilter, Rejection, SubmissionSource, Verdict,
};

/// How the harvest loop would treat a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Before the cursor index
    Resumed,
    Rejected(Rejection),
    Unavailable(Availability),
    /// Would be published; `verified` is false when availability was not checked
    Eligible { verified: bool },
}

impl fmt::Display for PreviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewOutcome::Resumed => write!(f, "already handled"),
            PreviewOutcome::Rejected(reason) => write!(f, "rejected: {reason}"),
            PreviewOutcome::Unavailable(availability) => write!(f, "unavailable: {availability}"),
            PreviewOutcome::Eligible { verified: true } => write!(f, "eligible"),
            PreviewOutcome::Eligible { verified: false } => write!(f, "eligible (unverified)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewItem {
    pub position: usize,
    pub record: SubmissionRecord,
    pub outcome: PreviewOutcome,
}

/// Classify every record of the cursor's window.
pub async fn run_preview(
    cursor: Cursor,
    settings: &HarvestSettings,
    source: &dyn SubmissionSource,
    filter: &EligibilityFilter,
    checker: Option<&dyn AvailabilityCheck>,
) -> (Window, Vec<PreviewItem>) {
    let window = Window::starting_at(cursor.after, settings.window_secs);
    let batch = source
        .fetch(&settings.source, window.after, window.before)
        .await;

    let mut items = Vec::with_capacity(batch.len());
    for (position, record) in batch.into_iter().enumerate() {
        let outcome = if cursor.already_handled(position) {
            PreviewOutcome::Resumed
        } else {
            classify(&record, filter, checker).await
        };
        items.push(PreviewItem {
            position,
            record,
            outcome,
        });
    }

    (window, items)
}

async fn classify(
    record: &SubmissionRecord,
    filter: &EligibilityFilter,
    checker: Option<&dyn AvailabilityCheck>,
) -> PreviewOutcome {
    if let Verdict::Rejected(reason) = filter.check(record) {
        return PreviewOutcome::Rejected(reason);
    }
    let Some(checker) = checker else {
        return PreviewOutcome::Eligible { verified: false };
    };
    match checker.check(record).await {
        Availability::Available => PreviewOutcome::Eligible { verified: true },
        other => PreviewOutcome::Unavailable(other),
    }
}
