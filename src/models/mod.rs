// src/models/mod.rs

//! Domain models for the republisher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod cursor;
mod publish;
mod submission;

// Re-export all public types
pub use config::{
    CommunityConfig, Config, EndpointConfig, FilterConfig, HarvestConfig, HttpConfig, PublishMode,
};
pub use cursor::Cursor;
pub use publish::{CommentOutcome, PublishResult, PublishStatus, SubmitOutcome};
pub use submission::{SUBMISSION_KIND, SubmissionRecord};
