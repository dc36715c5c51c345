// src/services/publisher.rs

//! Republishing service.
//!
//! Submits a candidate to the target community, then attaches the
//! attribution comment to the new post. Neither call is retried, and a
//! failed comment is not compensated: the post stays up without attribution
//! and the result is reported as [`PublishStatus::Partial`].
//!
//! [`PublishStatus::Partial`]: crate::models::PublishStatus::Partial

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{CommentOutcome, PublishMode, PublishResult, SubmissionRecord, SubmitOutcome};
use crate::services::auth::{AuthHeaders, Authorizer};
use crate::utils::http::{BodyMode, Fetched, HttpClient};

/// Publishes candidates to a community.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, record: &SubmissionRecord, target: &str) -> PublishResult;
}

/// Publisher backed by the authenticated platform API.
pub struct RedditPublisher {
    http: Arc<HttpClient>,
    authorizer: Authorizer,
    api_base: String,
    mode: PublishMode,
    attribution_template: String,
}

impl RedditPublisher {
    pub fn new(
        http: Arc<HttpClient>,
        authorizer: Authorizer,
        api_base: impl Into<String>,
        mode: PublishMode,
        attribution_template: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authorizer,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            mode,
            attribution_template: attribution_template.into(),
        }
    }

    /// Form fields for the submit call.
    pub fn submit_form(
        &self,
        record: &SubmissionRecord,
        target: &str,
    ) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("sr", target.to_string()),
            ("title", record.title.clone()),
            ("api_type", "json".to_string()),
            ("nsfw", "false".to_string()),
            ("spoiler", "false".to_string()),
            ("resubmit", "true".to_string()),
            ("sendreplies", "true".to_string()),
            ("validate_on_submit", "true".to_string()),
        ];
        match self.mode {
            PublishMode::Link => {
                form.push(("kind", "link".to_string()));
                form.push(("url", record.url.clone()));
            }
            PublishMode::Crosspost => {
                form.push(("kind", "crosspost".to_string()));
                form.push(("crosspost_fullname", record.fullname()));
            }
        }
        form
    }

    async fn post_form(
        &self,
        endpoint: &str,
        headers: &AuthHeaders,
        form: &[(&str, String)],
    ) -> Fetched {
        let request = self
            .http
            .client()
            .post(format!("{}{}", self.api_base, endpoint))
            .header(reqwest::header::AUTHORIZATION, &headers.authorization)
            .header(reqwest::header::USER_AGENT, &headers.user_agent)
            .form(form);
        self.http.fetch_once(request, BodyMode::Read).await
    }

    async fn submit(
        &self,
        record: &SubmissionRecord,
        target: &str,
        headers: &AuthHeaders,
    ) -> SubmitOutcome {
        let fetched = self
            .post_form("/api/submit", headers, &self.submit_form(record, target))
            .await;

        if let Err(reason) = api_failure(&fetched) {
            return SubmitOutcome::Failed { reason };
        }
        match fetched
            .json()
            .as_ref()
            .and_then(|payload| payload.pointer("/json/data/name"))
            .and_then(Value::as_str)
        {
            Some(fullname) => SubmitOutcome::Submitted {
                fullname: fullname.to_string(),
            },
            None => SubmitOutcome::Failed {
                reason: "no post identifier in response".to_string(),
            },
        }
    }

    async fn comment(
        &self,
        record: &SubmissionRecord,
        post_fullname: &str,
        headers: &AuthHeaders,
    ) -> CommentOutcome {
        let form = [
            ("text", record.format(&self.attribution_template)),
            ("api_type", "json".to_string()),
            ("thing_id", post_fullname.to_string()),
            ("return_rtjson", "true".to_string()),
        ];
        let fetched = self.post_form("/api/comment", headers, &form).await;

        match api_failure(&fetched) {
            Err(reason) => CommentOutcome::Failed { reason },
            Ok(()) => CommentOutcome::Posted {
                fullname: fetched.json().and_then(|payload| {
                    payload
                        .get("name")
                        .and_then(Value::as_str)
                        .map(String::from)
                }),
            },
        }
    }
}

/// Transport, status and API-level errors of a form call.
fn api_failure(fetched: &Fetched) -> Result<(), String> {
    let Some(response) = fetched.response() else {
        return Err("no response from API".to_string());
    };
    if !response.status.is_success() {
        return Err(format!("HTTP {}", response.status));
    }
    let Some(payload) = fetched.json() else {
        return Err("unreadable API response".to_string());
    };
    match payload.pointer("/json/errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => Err(Value::Array(errors.clone()).to_string()),
        _ => Ok(()),
    }
}

#[async_trait]
impl Publisher for RedditPublisher {
    async fn publish(&self, record: &SubmissionRecord, target: &str) -> PublishResult {
        let headers = match self.authorizer.authorize().await {
            Ok(headers) => headers,
            Err(e) => return PublishResult::submit_failed(e.to_string()),
        };

        let submission = self.submit(record, target, &headers).await;
        let comment = match &submission {
            SubmitOutcome::Submitted { fullname } => self.comment(record, fullname, &headers).await,
            SubmitOutcome::Failed { .. } => CommentOutcome::Skipped,
        };

        PublishResult {
            submission,
            comment,
        }
    }
}
