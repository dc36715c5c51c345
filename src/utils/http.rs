// src/utils/http.rs

//! HTTP client utilities.
//!
//! Every call made while harvesting goes through [`HttpClient`], which turns
//! transport failures into [`Fetched::Absent`] instead of errors. Timeouts are
//! retried a bounded number of times with a fixed delay; any other failure is
//! final for that call.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::error::Result;
use crate::models::HttpConfig;

/// How often and how patiently a timed out request is re-issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause before re-issuing a timed out request
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Whether the response body is downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    Read,
    /// Only status and final URL are needed (media probes)
    Skip,
}

/// A response that made it back from the server, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    /// URL after following redirects
    pub final_url: String,
    /// Empty when fetched with [`BodyMode::Skip`]
    pub body: Vec<u8>,
}

/// Why no response is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// Every attempt timed out
    RetriesExhausted { attempts: u32 },
    /// Connection, TLS, decoding or request-building failure
    Transport(String),
}

/// Outcome of one logical HTTP call.
#[derive(Debug, Clone)]
pub enum Fetched {
    Response(FetchedResponse),
    Absent(AbsentReason),
}

impl Fetched {
    pub fn response(&self) -> Option<&FetchedResponse> {
        match self {
            Fetched::Response(response) => Some(response),
            Fetched::Absent(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Fetched::Absent(_))
    }

    /// Parse the body as JSON.
    ///
    /// `None` for absent responses, empty bodies and malformed payloads.
    pub fn json(&self) -> Option<Value> {
        let response = self.response()?;
        if response.body.is_empty() {
            return None;
        }
        match serde_json::from_slice(&response.body) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("Discarding malformed JSON from {}: {}", response.final_url, e);
                None
            }
        }
    }
}

/// HTTP client with a bounded retry-on-timeout discipline.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Create a configured HTTP client.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, RetryPolicy::from_config(config)))
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send the request produced by `build`, re-issuing it after timeouts.
    pub async fn fetch<F>(&self, build: F, body: BodyMode) -> Fetched
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=attempts {
            match Self::execute(build(&self.client), body).await {
                Ok(response) => return Fetched::Response(response),
                Err(e) if e.is_timeout() => {
                    log::warn!("Request timed out (attempt {attempt}/{attempts}): {e}");
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
                Err(e) => {
                    log::warn!("Request failed: {e}");
                    return Fetched::Absent(AbsentReason::Transport(e.to_string()));
                }
            }
        }

        Fetched::Absent(AbsentReason::RetriesExhausted { attempts })
    }

    /// Send a request exactly once, even if it times out.
    ///
    /// Used for calls with side effects where a re-issued request could
    /// duplicate the effect.
    pub async fn fetch_once(&self, request: RequestBuilder, body: BodyMode) -> Fetched {
        match Self::execute(request, body).await {
            Ok(response) => Fetched::Response(response),
            Err(e) => {
                log::warn!("Request failed: {e}");
                Fetched::Absent(AbsentReason::Transport(e.to_string()))
            }
        }
    }

    /// GET a URL and read its body.
    pub async fn get(&self, url: &str) -> Fetched {
        self.fetch(|client| client.get(url), BodyMode::Read).await
    }

    /// GET a URL for its status and final location only.
    pub async fn probe(&self, url: &str) -> Fetched {
        self.fetch(|client| client.get(url), BodyMode::Skip).await
    }

    async fn execute(request: RequestBuilder, body: BodyMode) -> reqwest::Result<FetchedResponse> {
        let response = request.send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        let body = match body {
            BodyMode::Read => response.bytes().await?.to_vec(),
            BodyMode::Skip => Vec::new(),
        };

        Ok(FetchedResponse {
            status,
            final_url,
            body,
        })
    }
}
