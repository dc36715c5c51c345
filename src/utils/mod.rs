//! Utility functions and helpers.

pub mod http;

use chrono::{DateTime, NaiveDate};
use url::Url;

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Render epoch seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_epoch(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

/// Parse a starting point given either as epoch seconds or as `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_epoch_or_date(input: &str) -> Option<i64> {
    let input = input.trim();
    if let Ok(epoch) = input.parse::<i64>() {
        return Some(epoch);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}
