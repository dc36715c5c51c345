//! Submission data structure.

use serde::{Deserialize, Serialize};

use crate::utils::format_epoch;

/// Fullname prefix for submissions in the platform's identifier namespace.
pub const SUBMISSION_KIND: &str = "t3";

/// A historical submission returned by the search API.
///
/// Field names follow the search API payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// Linked URL (media or external page)
    pub url: String,

    /// Submission title
    pub title: String,

    /// Score at indexing time
    pub score: i64,

    /// Author username, without the `u/` prefix
    pub author: String,

    /// Domain of the linked URL
    pub domain: String,

    /// Text-only post
    pub is_self: bool,

    /// Marked as adult content
    pub over_18: bool,

    /// Absolute link to the original post
    #[serde(rename = "full_link")]
    pub permalink: String,

    /// Creation time, epoch seconds
    pub created_utc: i64,

    /// Raw platform id (base36, no kind prefix)
    pub id: String,
}

impl SubmissionRecord {
    /// Platform-wide identifier, e.g. `t3_abc123`.
    pub fn fullname(&self) -> String {
        format!("{}_{}", SUBMISSION_KIND, self.id)
    }

    /// Format the submission using a template.
    ///
    /// Supported placeholders:
    /// - `{author}`, `{date}`, `{permalink}`
    /// - `{title}`, `{score}`, `{fullname}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{author}", &self.author)
            .replace("{date}", &format_epoch(self.created_utc))
            .replace("{permalink}", &self.permalink)
            .replace("{title}", &self.title)
            .replace("{score}", &self.score.to_string())
            .replace("{fullname}", &self.fullname())
    }
}
