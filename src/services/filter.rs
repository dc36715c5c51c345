//! Eligibility rules for republishing.
//!
//! A pure predicate chain evaluated cheapest-first. The order only affects
//! which reason is reported; the accept/reject verdict is the conjunction of
//! all predicates.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{FilterConfig, SubmissionRecord};
use crate::utils::get_domain;

/// Image/animation extension at the end of the path, optionally followed by
/// a query string.
static MEDIA_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(gifv?|jpe?g|png)($|\?)").expect("media extension pattern is valid")
});

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    AdultContent,
    SelfPost,
    BlockedTerm(String),
    /// Not on a trusted host and not a direct media link
    UntrustedMedia,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::AdultContent => f.write_str("adult content"),
            Rejection::SelfPost => f.write_str("text post"),
            Rejection::BlockedTerm(term) => write!(f, "title contains blocked term {term:?}"),
            Rejection::UntrustedMedia => f.write_str("untrusted domain without media extension"),
        }
    }
}

/// Verdict of the eligibility chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Verdict::Eligible)
    }
}

/// Whether a URL points directly at an image or animation file.
pub fn has_media_extension(url: &str) -> bool {
    MEDIA_EXTENSION.is_match(url)
}

/// Eligibility filter built from configured block and allow lists.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    allowed_domains: HashSet<String>,
    blocked_terms: Vec<String>,
}

impl EligibilityFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            allowed_domains: config
                .allowed_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .collect(),
            blocked_terms: config
                .blocked_terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Run the chain, stopping at the first failing predicate.
    pub fn check(&self, record: &SubmissionRecord) -> Verdict {
        if record.over_18 {
            return Verdict::Rejected(Rejection::AdultContent);
        }
        if record.is_self {
            return Verdict::Rejected(Rejection::SelfPost);
        }
        if let Some(term) = self.blocked_term(&record.title) {
            return Verdict::Rejected(Rejection::BlockedTerm(term.to_string()));
        }
        if !self.is_trusted_media(record) {
            return Verdict::Rejected(Rejection::UntrustedMedia);
        }
        Verdict::Eligible
    }

    /// First blocked term found anywhere in `title`, ignoring case.
    pub fn blocked_term(&self, title: &str) -> Option<&str> {
        let title = title.to_lowercase();
        self.blocked_terms
            .iter()
            .find(|term| title.contains(term.as_str()))
            .map(String::as_str)
    }

    /// Allowed host, or a direct media link on any host.
    pub fn is_trusted_media(&self, record: &SubmissionRecord) -> bool {
        let domain = if record.domain.is_empty() {
            get_domain(&record.url).unwrap_or_default()
        } else {
            record.domain.to_lowercase()
        };
        self.allowed_domains.contains(&domain) || has_media_extension(&record.url)
    }

    /// Each predicate's pass/fail, in chain order.
    pub fn predicates(&self, record: &SubmissionRecord) -> [bool; 4] {
        [
            !record.over_18,
            !record.is_self,
            self.blocked_term(&record.title).is_none(),
            self.is_trusted_media(record),
        ]
    }
}
