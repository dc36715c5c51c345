//! Outcome of a republish attempt.

use std::fmt;

/// Result of submitting the new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// New post created
    Submitted { fullname: String },
    /// Nothing was created
    Failed { reason: String },
}

/// Result of attaching the attribution comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Posted { fullname: Option<String> },
    Failed { reason: String },
    /// Not attempted because the submit failed
    Skipped,
}

/// Overall classification of a [`PublishResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// Post and attribution comment both created
    Published,
    /// Post created, attribution comment missing
    Partial,
    /// No post created
    Failed,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PublishStatus::Published => "published",
            PublishStatus::Partial => "published without attribution",
            PublishStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Outcome of one republish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub submission: SubmitOutcome,
    pub comment: CommentOutcome,
}

impl PublishResult {
    /// Submit failed; the comment was never attempted.
    pub fn submit_failed(reason: impl Into<String>) -> Self {
        Self {
            submission: SubmitOutcome::Failed {
                reason: reason.into(),
            },
            comment: CommentOutcome::Skipped,
        }
    }

    pub fn status(&self) -> PublishStatus {
        match (&self.submission, &self.comment) {
            (SubmitOutcome::Failed { .. }, _) => PublishStatus::Failed,
            (SubmitOutcome::Submitted { .. }, CommentOutcome::Posted { .. }) => {
                PublishStatus::Published
            }
            (SubmitOutcome::Submitted { .. }, _) => PublishStatus::Partial,
        }
    }

    /// Fullname of the newly created post, if any.
    pub fn post_fullname(&self) -> Option<&str> {
        match &self.submission {
            SubmitOutcome::Submitted { fullname } => Some(fullname),
            SubmitOutcome::Failed { .. } => None,
        }
    }
}
