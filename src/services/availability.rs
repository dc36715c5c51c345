//! Availability checks for republish candidates.
//!
//! Best effort: only detects removal flagged by the platform itself and the
//! tombstone redirects configured in `endpoints.removed_media_urls`. Anything
//! that cannot be verified counts as removed.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::SubmissionRecord;
use crate::utils::http::{BodyMode, HttpClient};

/// JSON pointer to the removal classification in a post listing.
const REMOVAL_POINTER: &str = "/0/data/children/0/data/removed_by_category";
const POST_DATA_POINTER: &str = "/0/data/children/0/data";

/// Why the original post counts as removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRemoval {
    /// No usable metadata came back
    Unreachable,
    /// Platform removal category, e.g. `moderator` or `deleted`
    Classified(String),
}

/// Why the linked media counts as removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRemoval {
    Unreachable,
    Status(u16),
    /// Redirected to a known "image removed" placeholder
    Tombstone(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    SourceRemoved(SourceRemoval),
    MediaRemoved(MediaRemoval),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => f.write_str("available"),
            Availability::SourceRemoved(SourceRemoval::Unreachable) => {
                f.write_str("post metadata unavailable")
            }
            Availability::SourceRemoved(SourceRemoval::Classified(category)) => {
                write!(f, "post removed ({category})")
            }
            Availability::MediaRemoved(MediaRemoval::Unreachable) => {
                f.write_str("media unreachable")
            }
            Availability::MediaRemoved(MediaRemoval::Status(code)) => {
                write!(f, "media returned HTTP {code}")
            }
            Availability::MediaRemoved(MediaRemoval::Tombstone(url)) => {
                write!(f, "media replaced by {url}")
            }
        }
    }
}

/// Verifies a candidate and its media still exist.
#[async_trait]
pub trait AvailabilityCheck: Send + Sync {
    async fn check(&self, record: &SubmissionRecord) -> Availability;

    async fn is_unavailable(&self, record: &SubmissionRecord) -> bool {
        !self.check(record).await.is_available()
    }
}

/// Checks post metadata and media URLs over HTTP.
pub struct AvailabilityChecker {
    http: Arc<HttpClient>,
    browser_user_agent: String,
    removed_media_urls: Vec<String>,
}

impl AvailabilityChecker {
    pub fn new(
        http: Arc<HttpClient>,
        browser_user_agent: impl Into<String>,
        removed_media_urls: Vec<String>,
    ) -> Self {
        Self {
            http,
            browser_user_agent: browser_user_agent.into(),
            removed_media_urls,
        }
    }

    /// Metadata URL for a post permalink.
    pub fn metadata_url(permalink: &str) -> String {
        format!("{}.json", permalink.trim_end_matches('/'))
    }

    /// Interpret a post listing payload.
    ///
    /// Empty or unexpected payloads are treated as removed.
    pub fn source_removal(payload: Option<&Value>) -> Option<SourceRemoval> {
        let Some(payload) = payload else {
            return Some(SourceRemoval::Unreachable);
        };
        if payload.pointer(POST_DATA_POINTER).is_none() {
            return Some(SourceRemoval::Unreachable);
        }

        match payload.pointer(REMOVAL_POINTER) {
            None | Some(Value::Null) => None,
            Some(Value::String(category)) if category.is_empty() => None,
            Some(Value::String(category)) => Some(SourceRemoval::Classified(category.clone())),
            Some(other) => Some(SourceRemoval::Classified(other.to_string())),
        }
    }

    async fn check_source(&self, record: &SubmissionRecord) -> Option<SourceRemoval> {
        let url = Self::metadata_url(&record.permalink);
        let fetched = self
            .http
            .fetch(
                |client| {
                    client
                        .get(&url)
                        .header(reqwest::header::USER_AGENT, &self.browser_user_agent)
                },
                BodyMode::Read,
            )
            .await;

        Self::source_removal(fetched.json().as_ref())
    }

    async fn check_media(&self, record: &SubmissionRecord) -> Option<MediaRemoval> {
        let fetched = self.http.probe(&record.url).await;
        let Some(response) = fetched.response() else {
            return Some(MediaRemoval::Unreachable);
        };

        if !response.status.is_success() {
            return Some(MediaRemoval::Status(response.status.as_u16()));
        }
        if self
            .removed_media_urls
            .iter()
            .any(|tombstone| tombstone == &response.final_url)
        {
            return Some(MediaRemoval::Tombstone(response.final_url.clone()));
        }
        None
    }
}

#[async_trait]
impl AvailabilityCheck for AvailabilityChecker {
    /// The media check only runs when the post itself is still up.
    async fn check(&self, record: &SubmissionRecord) -> Availability {
        if let Some(removal) = self.check_source(record).await {
            return Availability::SourceRemoved(removal);
        }
        if let Some(removal) = self.check_media(record).await {
            return Availability::MediaRemoved(removal);
        }
        Availability::Available
    }
}
