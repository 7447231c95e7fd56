// Record sources: the boundary between the ingestion loop and whatever
// service supplies posts.
//
// A source either polls (hand back a batch, then the loop waits out the
// poll interval) or streams (each fetch waits for the next deliveries).
// Both look the same to the loop: connect, then fetch batches until
// something fails.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub mod x_search;

/// One ingested post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub text: String,
    /// Language reported by the source, if it reports one.
    pub language_tag: Option<String>,
    /// When we received it (not when it was written).
    pub observed_at: DateTime<Utc>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A single entry in a batch that could not be turned into a Record.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed record {}: {reason}", .id.as_deref().unwrap_or("<no id>"))]
pub struct MalformedRecord {
    pub id: Option<String>,
    pub reason: String,
}

/// Batch-level failures. Everything except `Auth` is retried with backoff.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("transient source error: {0}")]
    Transient(String),

    #[error("rate limited by source")]
    RateLimited { retry_after: Option<Duration> },

    #[error("source request timed out after {0:?}")]
    Timeout(Duration),

    #[error("source rejected credentials: {0}")]
    Auth(String),
}

impl SourceError {
    /// Minimum wait the source asked for before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SourceError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Transient(format!("request timed out: {err}"))
        } else {
            SourceError::Transient(err.to_string())
        }
    }
}

/// What a single fetch hands back: records, plus any entries that failed to parse.
pub type Batch = Vec<Result<Record, MalformedRecord>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Fetch returns immediately; the loop sleeps between fetches.
    Poll,
    /// Fetch waits for the next deliveries; the loop fetches again right away.
    Stream,
}

/// Trait for anything that can supply posts to the ingestion loop.
#[async_trait]
pub trait RecordSource: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn mode(&self) -> SourceMode {
        SourceMode::Poll
    }

    /// Establish (or re-establish) a session. Poll sources may use this to
    /// validate credentials; the default does nothing.
    async fn connect(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Fetch the next batch of records.
    async fn fetch_batch(&mut self) -> Result<Batch, SourceError>;
}
