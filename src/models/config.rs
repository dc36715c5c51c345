//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source and target communities
    #[serde(default)]
    pub communities: CommunityConfig,

    /// Window walking and publishing behavior
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Eligibility rules
    #[serde(default)]
    pub filter: FilterConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Remote API locations
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.communities.source.trim().is_empty() {
            return Err(AppError::validation("communities.source is empty"));
        }
        if self.communities.target.trim().is_empty() {
            return Err(AppError::validation("communities.target is empty"));
        }
        if self.harvest.window_secs <= 0 {
            return Err(AppError::validation("harvest.window_secs must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.max_attempts == 0 {
            return Err(AppError::validation("http.max_attempts must be > 0"));
        }
        if self.filter.allowed_domains.is_empty() {
            return Err(AppError::validation("No allowed domains defined"));
        }
        for (name, value) in [
            ("endpoints.search_url", &self.endpoints.search_url),
            ("endpoints.token_url", &self.endpoints.token_url),
            ("endpoints.api_base", &self.endpoints.api_base),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}

/// Where submissions are read from and republished to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Community whose history is harvested
    #[serde(default)]
    pub source: String,

    /// Community that receives the republished posts
    #[serde(default)]
    pub target: String,
}

/// How a candidate is republished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// New link post pointing at the original media URL
    #[default]
    Link,
    /// Crosspost of the original submission
    Crosspost,
}

/// Window walking and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Length of one search window in seconds
    #[serde(default = "defaults::window_secs")]
    pub window_secs: i64,

    /// Pause after every publish attempt, in seconds
    #[serde(default = "defaults::cooldown_secs")]
    pub cooldown_secs: u64,

    #[serde(default)]
    pub publish_mode: PublishMode,

    /// Comment body attached to every republished post.
    ///
    /// Placeholders: `{author}`, `{date}`, `{permalink}`, `{title}`,
    /// `{score}`, `{fullname}`.
    #[serde(default = "defaults::attribution_template")]
    pub attribution_template: String,
}

impl HarvestConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            window_secs: defaults::window_secs(),
            cooldown_secs: defaults::cooldown_secs(),
            publish_mode: PublishMode::default(),
            attribution_template: defaults::attribution_template(),
        }
    }
}

/// Eligibility rule data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Media hosts accepted regardless of URL extension (exact match)
    #[serde(default = "defaults::allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Title substrings that reject a submission (case-insensitive)
    #[serde(default = "defaults::blocked_terms")]
    pub blocked_terms: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_domains: defaults::allowed_domains(),
            blocked_terms: defaults::blocked_terms(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent sent to the authenticated API and the search API
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// User-Agent for public post metadata requests
    #[serde(default = "defaults::browser_user_agent")]
    pub browser_user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay before re-issuing a timed out request, in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,

    /// Attempts per request before giving up on timeouts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            browser_user_agent: defaults::browser_user_agent(),
            timeout_secs: defaults::timeout(),
            retry_delay_secs: defaults::retry_delay(),
            max_attempts: defaults::max_attempts(),
        }
    }
}

/// Remote API locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Submission search endpoint
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// OAuth token endpoint
    #[serde(default = "defaults::token_url")]
    pub token_url: String,

    /// Base URL of the authenticated API
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Final redirect targets that mean "this image was removed"
    #[serde(default = "defaults::removed_media_urls")]
    pub removed_media_urls: Vec<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            search_url: defaults::search_url(),
            token_url: defaults::token_url(),
            api_base: defaults::api_base(),
            removed_media_urls: defaults::removed_media_urls(),
        }
    }
}

mod defaults {
    const DAY: i64 = 24 * 60 * 60;

    // Harvest defaults
    pub fn window_secs() -> i64 {
        31 * DAY
    }
    pub fn cooldown_secs() -> u64 {
        2 * 60 * 60
    }
    pub fn attribution_template() -> String {
        "Submission made by u/{author} at {date} UTC. Link to original post: {permalink}".into()
    }

    // Filter defaults
    pub fn allowed_domains() -> Vec<String> {
        vec![
            "imgur.com".into(),
            "i.imgur.com".into(),
            "m.imgur.com".into(),
            "i.redd.it".into(),
            "i.reddituploads.com".into(),
            "24.media.tumblr.com".into(),
        ]
    }
    pub fn blocked_terms() -> Vec<String> {
        vec!["nigg".into(), "fag".into(), "cunt".into()]
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "reposter/0.1 (historical submission republisher)".into()
    }
    pub fn browser_user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn retry_delay() -> u64 {
        20
    }
    pub fn max_attempts() -> u32 {
        5
    }

    // Endpoint defaults
    pub fn search_url() -> String {
        "https://api.pushshift.io/reddit/submission/search".into()
    }
    pub fn token_url() -> String {
        "https://www.reddit.com/api/v1/access_token?duration=permanent".into()
    }
    pub fn api_base() -> String {
        "https://oauth.reddit.com".into()
    }
    pub fn removed_media_urls() -> Vec<String> {
        vec!["https://i.imgur.com/removed.png".into()]
    }
}
