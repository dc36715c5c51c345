//! Service layer for the republisher.
//!
//! This module contains the collaborators of the harvest loop:
//! - Window search (`SubmissionSearch`)
//! - Eligibility rules (`EligibilityFilter`)
//! - Availability verification (`AvailabilityChecker`)
//! - Authorization and publishing (`Authorizer`, `RedditPublisher`)

pub mod auth;
pub mod availability;
pub mod filter;
pub mod publisher;
pub mod search;

pub use auth::{AuthHeaders, Authorizer, Credentials};
pub use availability::{Availability, AvailabilityCheck, AvailabilityChecker};
pub use filter::{EligibilityFilter, Rejection, Verdict};
pub use publisher::{Publisher, RedditPublisher};
pub use search::{SubmissionSearch, SubmissionSource};
