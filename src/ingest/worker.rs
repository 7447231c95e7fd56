// Ingestion loop: the long-running task that keeps trends fed.
//
// An explicit state machine:
//
//   Idle → Connecting → Active ⇄ (poll sleep)
//              ↑           │ failure
//              └─ Backoff ←┘
//   any state → Stopped (cancellation only)
//
// One cycle (fetch → filter → extract → aggregate → publish) always runs to
// completion before the next starts. Cancellation is checked at the top of
// every iteration and races every sleep and fetch, so shutdown is prompt and
// never interrupts a half-applied record.
//
// The failure streak only ends with a fetch that succeeds. A connect that
// returns Ok proves nothing for sources without a real handshake.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcast::{ConnectionEvent, ConnectionStatus, KeywordEvent, SinkEvent};
use crate::lexicon::traits::KeywordExtractor;
use crate::ranking::hub::TrendHub;
use crate::source::{Batch, Record, RecordSource, SourceError, SourceMode};

use super::backoff::BackoffPolicy;
use super::clock::Clock;

/// Log a progress line every this many processed records.
const PROGRESS_LOG_EVERY: u64 = 100;

/// Publish a stats event every this many processed records.
const STATS_EVENT_EVERY: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Idle,
    Connecting,
    Active,
    Backoff,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Pause between successful poll cycles.
    pub poll_interval: Duration,
    /// Upper bound on a connect, or on a poll-mode fetch. Stream fetches wait
    /// for deliveries and are not timed.
    pub fetch_timeout: Duration,
    pub backoff: BackoffPolicy,
    /// Records tagged with another language are dropped. None keeps everything.
    pub target_language: Option<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            target_language: Some("ja".to_string()),
        }
    }
}

pub struct IngestWorker<S> {
    source: S,
    hub: Arc<TrendHub>,
    extractor: Arc<dyn KeywordExtractor>,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
    state: IngestState,
    attempt_count: u32,
    ever_connected: bool,
    retry_hint: Option<Duration>,
}

impl<S: RecordSource> IngestWorker<S> {
    pub fn new(
        source: S,
        hub: Arc<TrendHub>,
        extractor: Arc<dyn KeywordExtractor>,
        clock: Arc<dyn Clock>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            source,
            hub,
            extractor,
            clock,
            settings,
            state: IngestState::Idle,
            attempt_count: 0,
            ever_connected: false,
            retry_hint: None,
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Consecutive failures since the last successful fetch.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until `cancel` fires.
    ///
    /// The only error is `SourceError::Auth` from a source that has never
    /// connected: bad credentials at startup are not something retrying fixes.
    /// After one successful session, auth failures are retried like any other.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), SourceError> {
        info!(source = self.source.name(), "Ingestion loop starting");
        self.transition(IngestState::Connecting);

        loop {
            if cancel.is_cancelled() {
                self.transition(IngestState::Stopped);
                info!(source = self.source.name(), "Ingestion loop stopped");
                return Ok(());
            }

            match self.state {
                IngestState::Idle | IngestState::Connecting => self.connect(&cancel).await?,
                IngestState::Active => self.cycle(&cancel).await,
                IngestState::Backoff => self.back_off(&cancel).await,
                IngestState::Stopped => return Ok(()),
            }
        }
    }

    async fn connect(&mut self, cancel: &CancellationToken) -> Result<(), SourceError> {
        let timeout = self.settings.fetch_timeout;
        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            r = tokio::time::timeout(timeout, self.source.connect()) => {
                r.unwrap_or(Err(SourceError::Timeout(timeout)))
            }
        };

        match result {
            Ok(()) => {
                info!(
                    source = self.source.name(),
                    after_attempts = self.attempt_count,
                    "Connected to source"
                );
                self.ever_connected = true;
                self.hub.publish(SinkEvent::Connection(ConnectionEvent {
                    status: ConnectionStatus::Connected,
                    message: format!("Connected to {}", self.source.name()),
                }));
                self.transition(IngestState::Active);
                Ok(())
            }
            Err(SourceError::Auth(msg)) if !self.ever_connected => {
                error!(source = self.source.name(), error = %msg, "Source rejected credentials");
                Err(SourceError::Auth(msg))
            }
            Err(e) => {
                self.fail(e);
                Ok(())
            }
        }
    }

    /// One Active cycle: fetch, process, then wait out the poll interval.
    async fn cycle(&mut self, cancel: &CancellationToken) {
        let mode = self.source.mode();
        let limit = (mode == SourceMode::Poll).then_some(self.settings.fetch_timeout);
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return,
            r = within(limit, self.source.fetch_batch()) => r,
        };

        match fetched {
            Ok(batch) => {
                if self.attempt_count > 0 {
                    debug!(after_attempts = self.attempt_count, "Source healthy again");
                    self.attempt_count = 0;
                    self.hub.set_attempt_count(0).await;
                }
                self.process_batch(batch).await;
                if mode == SourceMode::Poll {
                    self.sleep(self.settings.poll_interval, cancel).await;
                }
            }
            Err(e) => self.fail(e),
        }
    }

    async fn back_off(&mut self, cancel: &CancellationToken) {
        let delay = self
            .settings
            .backoff
            .delay_with_hint(self.attempt_count, self.retry_hint.take());
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.hub.set_attempt_count(self.attempt_count).await;

        info!(
            attempt = self.attempt_count,
            delay_secs = delay.as_secs_f64(),
            "Retrying source in {:.0}s",
            delay.as_secs_f64()
        );

        if self.sleep(delay, cancel).await {
            self.transition(IngestState::Connecting);
        }
    }

    fn fail(&mut self, err: SourceError) {
        warn!(source = self.source.name(), error = %err, "Source failure, backing off");
        self.retry_hint = err.retry_after();
        self.hub.publish(SinkEvent::Connection(ConnectionEvent {
            status: ConnectionStatus::Disconnected,
            message: err.to_string(),
        }));
        self.transition(IngestState::Backoff);
    }

    async fn process_batch(&mut self, batch: Batch) {
        let fetched = batch.len();
        let mut admitted = 0usize;

        for entry in batch {
            let record = match entry {
                Ok(record) => record,
                Err(malformed) => {
                    warn!(error = %malformed, "Dropping malformed record");
                    continue;
                }
            };

            if !self.language_matches(&record) {
                debug!(id = %record.id, lang = ?record.language_tag, "Skipping non-target language");
                continue;
            }

            let Some(done) = self.hub.process(&record, self.extractor.as_ref()).await else {
                continue;
            };
            admitted += 1;

            if done.processed_total % PROGRESS_LOG_EVERY == 0 {
                info!(processed_total = done.processed_total, "Processed {} records", done.processed_total);
            }

            let keywords = distinct(&done.record.keywords);
            if !keywords.is_empty() {
                self.hub.publish(SinkEvent::Keyword(KeywordEvent {
                    record_id: done.record.id,
                    author: done.record.author,
                    text: done.record.text,
                    keywords,
                    observed_at: done.record.observed_at,
                }));
            }

            if done.processed_total % STATS_EVENT_EVERY == 0 {
                self.hub.publish_stats().await;
            }
        }

        debug!(fetched, admitted, "Batch processed");
        if admitted > 0 {
            self.hub.publish_ranking().await;
        }
    }

    fn language_matches(&self, record: &Record) -> bool {
        match (&self.settings.target_language, &record.language_tag) {
            (Some(target), Some(tag)) => tag.eq_ignore_ascii_case(target),
            _ => true,
        }
    }

    /// Sleep unless cancelled first. Returns true if the full delay elapsed.
    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = self.clock.sleep(duration) => true,
        }
    }

    fn transition(&mut self, next: IngestState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Ingest state change");
            self.state = next;
        }
    }
}

/// Await `fut`, giving up after `limit` when one is set.
async fn within<F>(limit: Option<Duration>, fut: F) -> Result<Batch, SourceError>
where
    F: Future<Output = Result<Batch, SourceError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(SourceError::Timeout(limit))),
        None => fut.await,
    }
}

/// First occurrence of each keyword, order preserved.
fn distinct(keywords: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .iter()
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        let words: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(distinct(&words), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_default_settings() {
        let settings = WorkerSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_secs(120));
        assert_eq!(settings.target_language.as_deref(), Some("ja"));
    }
}
