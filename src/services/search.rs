// src/services/search.rs

//! Submission search service.
//!
//! Fetches one time window of submissions from the search API, best scored
//! first. Only the first page is requested: a window holding more than
//! [`PAGE_SIZE`] qualifying submissions silently loses the rest.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::models::SubmissionRecord;
use crate::utils::http::HttpClient;

/// Maximum submissions returned for one window.
pub const PAGE_SIZE: usize = 100;

/// Minimum score filter applied by the search API.
pub const MIN_SCORE_QUERY: &str = ">10";

/// Source of historical submissions for a time window.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Submissions created in `[after, before)`, ordered as returned.
    ///
    /// Missing or unusable data yields an empty batch, never an error.
    async fn fetch(&self, community: &str, after: i64, before: i64) -> Vec<SubmissionRecord>;
}

/// Search API client.
pub struct SubmissionSearch {
    http: Arc<HttpClient>,
    search_url: Url,
}

impl SubmissionSearch {
    pub fn new(http: Arc<HttpClient>, search_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            search_url: Url::parse(search_url)?,
        })
    }

    /// Build the query URL for one window.
    pub fn window_url(&self, community: &str, after: i64, before: i64) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("size", &PAGE_SIZE.to_string())
            .append_pair("sort", "desc")
            .append_pair("sort_type", "score")
            .append_pair("score", MIN_SCORE_QUERY)
            .append_pair("subreddit", community)
            .append_pair("after", &after.to_string())
            .append_pair("before", &before.to_string());
        url
    }

    /// Extract submission records from a search payload.
    ///
    /// Entries that do not deserialize are dropped with a warning.
    pub fn parse_batch(payload: &Value) -> Vec<SubmissionRecord> {
        let Some(items) = payload.get("data").and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!(
                        "Skipping malformed submission {}: {}",
                        item.get("id").and_then(Value::as_str).unwrap_or("<no id>"),
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl SubmissionSource for SubmissionSearch {
    async fn fetch(&self, community: &str, after: i64, before: i64) -> Vec<SubmissionRecord> {
        let url = self.window_url(community, after, before);
        log::debug!("Searching {}", url);

        let fetched = self.http.get(url.as_str()).await;
        let Some(payload) = fetched.json() else {
            log::warn!("No usable search data for r/{community} [{after}, {before})");
            return Vec::new();
        };

        let batch = Self::parse_batch(&payload);
        if batch.len() >= PAGE_SIZE {
            log::warn!(
                "Window [{after}, {before}) filled a whole page; submissions past {PAGE_SIZE} are not seen"
            );
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::utils::http::test_support;

    fn submission_json(id: &str) -> Value {
        json!({
            "url": format!("https://i.imgur.com/{id}.png"),
            "title": format!("Post {id}"),
            "score": 50,
            "author": "someone",
            "domain": "i.imgur.com",
            "is_self": false,
            "over_18": false,
            "full_link": format!("https://www.reddit.com/r/pics/comments/{id}/post/"),
            "created_utc": 1_609_500_000,
            "id": id
        })
    }

    fn search(server: &MockServer) -> SubmissionSearch {
        SubmissionSearch::new(
            Arc::new(test_support::quick_client()),
            &format!("{}/reddit/submission/search", server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_window_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reddit/submission/search"))
            .and(query_param("size", "100"))
            .and(query_param("sort", "desc"))
            .and(query_param("sort_type", "score"))
            .and(query_param("score", ">10"))
            .and(query_param("subreddit", "pics"))
            .and(query_param("after", "1609459200"))
            .and(query_param("before", "1612137600"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [submission_json("b"), submission_json("a")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = search(&server)
            .fetch("pics", 1_609_459_200, 1_612_137_600)
            .await;

        let ids: Vec<_> = batch.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_fetch_empty_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let batch = search(&server).fetch("pics", 0, 10).await;
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_empty_when_api_unreachable() {
        let search = SubmissionSearch::new(
            Arc::new(test_support::quick_client()),
            "http://127.0.0.1:1/reddit/submission/search",
        )
        .unwrap();

        let batch = search.fetch("pics", 0, 10).await;
        assert!(batch.is_empty());
    }

    #[test]
    fn test_parse_batch_without_data() {
        assert!(SubmissionSearch::parse_batch(&json!({})).is_empty());
        assert!(SubmissionSearch::parse_batch(&json!({"data": "nope"})).is_empty());
    }

    #[test]
    fn test_parse_batch_drops_malformed_entries() {
        let payload = json!({
            "data": [
                submission_json("a"),
                {"id": "broken", "title": "no url"},
                submission_json("c")
            ]
        });

        let batch = SubmissionSearch::parse_batch(&payload);
        let ids: Vec<_> = batch.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_window_url() {
        let search = SubmissionSearch::new(
            Arc::new(test_support::quick_client()),
            "https://api.pushshift.io/reddit/submission/search",
        )
        .unwrap();

        let url = search.window_url("OldSchoolCool", 1, 2);
        assert_eq!(
            url.as_str(),
            "https://api.pushshift.io/reddit/submission/search?size=100&sort=desc\
             &sort_type=score&score=%3E10&subreddit=OldSchoolCool&after=1&before=2"
        );
    }
}
