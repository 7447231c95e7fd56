// X (Twitter) API v2 recent-search poller.
//
// Each fetch calls `GET /2/tweets/search/recent` with an app-only bearer
// token and the configured query, asking only for tweets newer than the
// newest one already seen (`since_id`). The first request doubles as the
// connection check: bad credentials surface from `connect`, not from the
// middle of a running session.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{Batch, MalformedRecord, Record, RecordSource, SourceError};

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

/// Japanese posts, originals only.
pub const DEFAULT_QUERY: &str = "lang:ja -is:retweet";

/// The endpoint accepts 10..=100 results per page.
pub const MIN_RESULTS: u8 = 10;
pub const MAX_RESULTS: u8 = 100;

/// Poll source for the recent-search endpoint.
pub struct XSearchSource {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
    query: String,
    max_results: String,
    since_id: Option<String>,
    pending: Option<Batch>,
}

impl XSearchSource {
    /// Create a new poller. An empty bearer token is rejected up front with
    /// `SourceError::Auth` so the loop never starts without a credential.
    pub fn new(base_url: &str, bearer_token: &str, query: &str, max_results: u8) -> Result<Self> {
        if bearer_token.trim().is_empty() {
            return Err(SourceError::Auth("bearer token is empty".to_string()).into());
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("kotonami/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
            query: query.to_string(),
            max_results: max_results.clamp(MIN_RESULTS, MAX_RESULTS).to_string(),
            since_id: None,
            pending: None,
        })
    }

    /// Newest tweet id seen so far, if any.
    pub fn since_id(&self) -> Option<&str> {
        self.since_id.as_deref()
    }

    async fn search(&mut self) -> Result<Batch, SourceError> {
        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let mut params: Vec<(&str, &str)> = vec![
            ("query", self.query.as_str()),
            ("max_results", self.max_results.as_str()),
            ("tweet.fields", "lang,created_at,author_id"),
            ("expansions", "author_id"),
            ("user.fields", "name,username"),
        ];
        if let Some(ref id) = self.since_id {
            params.push(("since_id", id.as_str()));
        }

        debug!(query = %self.query, since_id = ?self.since_id, "Recent search request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_from_headers(response.headers(), Utc::now());
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after, &body));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Transient(format!("undecodable search response: {e}")))?;

        let (batch, newest_id) = parse_response(body, Utc::now());
        if newest_id.is_some() {
            self.since_id = newest_id;
        }
        Ok(batch)
    }
}

#[async_trait]
impl RecordSource for XSearchSource {
    fn name(&self) -> &str {
        "x-recent-search"
    }

    async fn connect(&mut self) -> Result<(), SourceError> {
        let batch = self.search().await?;
        self.pending = Some(batch);
        Ok(())
    }

    async fn fetch_batch(&mut self) -> Result<Batch, SourceError> {
        match self.pending.take() {
            Some(batch) => Ok(batch),
            None => self.search().await,
        }
    }
}

/// Map a non-success status to the error taxonomy.
pub fn error_for_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SourceError::Auth(format!("search returned {status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited { retry_after },
        _ => SourceError::Transient(format!("search returned {status}: {body}")),
    }
}

/// How long the API asked us to wait: `retry-after` seconds, or the
/// `x-rate-limit-reset` epoch timestamp relative to `now`.
pub fn retry_after_from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let header_int = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    if let Some(secs) = header_int("retry-after") {
        return Some(Duration::from_secs(secs.max(0) as u64));
    }
    header_int("x-rate-limit-reset").map(|reset| {
        let wait = reset - now.timestamp();
        Duration::from_secs(wait.max(0) as u64)
    })
}

/// Turn a search response into a batch plus the newest id it contained.
///
/// Each tweet is decoded on its own, so one bad entry becomes a
/// `MalformedRecord` instead of failing the whole page.
pub fn parse_response(body: SearchResponse, observed_at: DateTime<Utc>) -> (Batch, Option<String>) {
    let authors: HashMap<String, String> = body
        .includes
        .map(|inc| {
            inc.users
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        })
        .unwrap_or_default();

    let batch = body
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|value| -> Result<Record, MalformedRecord> {
            let id = value.get("id").and_then(|v| v.as_str()).map(str::to_string);
            let tweet: TweetPayload = serde_json::from_value(value).map_err(|e| MalformedRecord {
                id,
                reason: e.to_string(),
            })?;
            let author = tweet
                .author_id
                .as_ref()
                .and_then(|a| authors.get(a))
                .cloned();
            Ok(Record {
                id: tweet.id,
                text: tweet.text,
                language_tag: tweet.lang,
                observed_at,
                author,
                created_at: tweet.created_at,
            })
        })
        .collect();

    let newest_id = body.meta.and_then(|m| m.newest_id);
    (batch, newest_id)
}

// -- Serde types for /2/tweets/search/recent --

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Left untyped so each tweet can fail to decode independently.
    pub data: Option<Vec<serde_json::Value>>,
    pub includes: Option<Includes>,
    pub meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchMeta {
    pub newest_id: Option<String>,
    pub result_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TweetPayload {
    id: String,
    text: String,
    lang: Option<String>,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_empty_token_is_auth_error() {
        let err = XSearchSource::new(DEFAULT_API_URL, "  ", DEFAULT_QUERY, 10)
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Auth(_))
        ));
    }

    #[test]
    fn test_max_results_clamped() {
        let src = XSearchSource::new("https://example.test/", "t", DEFAULT_QUERY, 5).unwrap();
        assert_eq!(src.max_results, "10");
        assert_eq!(src.base_url, "https://example.test");
        let src = XSearchSource::new(DEFAULT_API_URL, "t", DEFAULT_QUERY, 250).unwrap();
        assert_eq!(src.max_results, "100");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, None, ""),
            SourceError::Auth(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, None, ""),
            SourceError::Auth(_)
        ));
        assert_eq!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(9)), ""),
            SourceError::RateLimited {
                retry_after: Some(Duration::from_secs(9))
            }
        );
        assert!(matches!(
            error_for_status(StatusCode::SERVICE_UNAVAILABLE, None, "busy"),
            SourceError::Transient(msg) if msg.contains("busy")
        ));
    }

    #[test]
    fn test_retry_after_headers() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_from_headers(&headers, now), None);

        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1045"));
        assert_eq!(
            retry_after_from_headers(&headers, now),
            Some(Duration::from_secs(45))
        );

        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(
            retry_after_from_headers(&headers, now),
            Some(Duration::from_secs(7))
        );

        let mut past = HeaderMap::new();
        past.insert("x-rate-limit-reset", HeaderValue::from_static("10"));
        assert_eq!(retry_after_from_headers(&past, now), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_response_with_authors_and_malformed_entry() {
        let json = r#"{
            "data": [
                {"id": "2", "text": "平和を祈る", "lang": "ja", "author_id": "u1",
                 "created_at": "2026-10-18T09:00:00.000Z"},
                {"id": "3", "lang": "ja"},
                {"id": "1", "text": "hello", "lang": "en"}
            ],
            "includes": {"users": [{"id": "u1", "name": "Yamada", "username": "yamada"}]},
            "meta": {"newest_id": "3", "oldest_id": "1", "result_count": 3}
        }"#;
        let body: SearchResponse = serde_json::from_str(json).unwrap();
        let now = Utc::now();
        let (batch, newest) = parse_response(body, now);

        assert_eq!(newest.as_deref(), Some("3"));
        assert_eq!(batch.len(), 3);

        let first = batch[0].as_ref().unwrap();
        assert_eq!(first.id, "2");
        assert_eq!(first.author.as_deref(), Some("yamada"));
        assert_eq!(first.language_tag.as_deref(), Some("ja"));
        assert_eq!(first.observed_at, now);
        assert!(first.created_at.is_some());

        let bad = batch[1].as_ref().unwrap_err();
        assert_eq!(bad.id.as_deref(), Some("3"));

        let third = batch[2].as_ref().unwrap();
        assert!(third.author.is_none());
    }

    #[test]
    fn test_parse_empty_response() {
        let body: SearchResponse = serde_json::from_str(r#"{"meta": {"result_count": 0}}"#).unwrap();
        let (batch, newest) = parse_response(body, Utc::now());
        assert!(batch.is_empty());
        assert!(newest.is_none());
    }
}
