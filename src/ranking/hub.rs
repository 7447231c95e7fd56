// Trend hub: the shared state between the ingestion task and viewers.
//
// The ledger, frequency table, history ring and session counters sit behind
// one RwLock. The ingestion loop takes the write lock once per record, so a
// reader calling `top` sees either none or all of a record's increments.
// Viewer-side reads (ranking, stats, history) take the read lock and never
// wait on the network: the loop holds no lock across a fetch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::broadcast::{BroadcastSink, RankingEvent, SinkEvent};
use crate::ingest::clock::Clock;
use crate::ingest::ledger::SeenLedger;
use crate::lexicon::traits::KeywordExtractor;
use crate::source::Record;

use super::frequency::{FrequencyTable, RankedWord};
use super::history::{ProcessedRecord, RecentHistory};

/// Read-only session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub processed_total: u64,
    pub uptime_seconds: u64,
    pub attempt_count: u32,
}

/// Sizes of the bounded structures and the ranking length.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    pub ledger_capacity: usize,
    pub history_capacity: usize,
    pub top_k: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            ledger_capacity: 1000,
            history_capacity: 100,
            top_k: 50,
        }
    }
}

/// Outcome of processing one admitted record.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub record: ProcessedRecord,
    /// `processed_total` right after this record was counted.
    pub processed_total: u64,
}

struct TrendState {
    ledger: SeenLedger,
    table: FrequencyTable,
    history: RecentHistory,
    processed_total: u64,
    started_at: DateTime<Utc>,
    attempt_count: u32,
}

pub struct TrendHub {
    state: RwLock<TrendState>,
    sink: Arc<dyn BroadcastSink>,
    clock: Arc<dyn Clock>,
    top_k: usize,
}

impl TrendHub {
    pub fn new(settings: HubSettings, sink: Arc<dyn BroadcastSink>, clock: Arc<dyn Clock>) -> Self {
        let state = TrendState {
            ledger: SeenLedger::new(settings.ledger_capacity),
            table: FrequencyTable::new(),
            history: RecentHistory::new(settings.history_capacity),
            processed_total: 0,
            started_at: clock.now(),
            attempt_count: 0,
        };
        Self {
            state: RwLock::new(state),
            sink,
            clock,
            top_k: settings.top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Admit, extract and count one record under a single write lock.
    ///
    /// Returns None when the id is already in the seen-ledger.
    pub async fn process(
        &self,
        record: &Record,
        extractor: &dyn KeywordExtractor,
    ) -> Option<Admitted> {
        let mut state = self.state.write().await;
        if !state.ledger.try_admit(&record.id) {
            return None;
        }

        let keywords = extractor.extract(&record.text);
        state.table.increment_all(&keywords);
        state.processed_total += 1;

        let processed = ProcessedRecord {
            id: record.id.clone(),
            author: record.author.clone(),
            text: record.text.clone(),
            keywords,
            observed_at: record.observed_at,
        };
        state.history.push(processed.clone());

        Some(Admitted {
            record: processed,
            processed_total: state.processed_total,
        })
    }

    /// Top `k` words right now.
    pub async fn top(&self, k: usize) -> Vec<RankedWord> {
        self.state.read().await.table.top(k)
    }

    /// The configured top-K snapshot.
    pub async fn ranking(&self) -> Vec<RankedWord> {
        self.top(self.top_k).await
    }

    pub async fn count(&self, word: &str) -> u64 {
        self.state.read().await.table.count(word)
    }

    /// Recent records, oldest first.
    pub async fn recent(&self) -> Vec<ProcessedRecord> {
        self.state.read().await.history.snapshot()
    }

    pub async fn is_seen(&self, id: &str) -> bool {
        self.state.read().await.ledger.contains(id)
    }

    pub async fn stats(&self) -> Stats {
        let state = self.state.read().await;
        let uptime = (self.clock.now() - state.started_at).num_seconds().max(0);
        Stats {
            processed_total: state.processed_total,
            uptime_seconds: uptime as u64,
            attempt_count: state.attempt_count,
        }
    }

    pub async fn set_attempt_count(&self, attempt_count: u32) {
        self.state.write().await.attempt_count = attempt_count;
    }

    /// Publish the current top-K ranking.
    pub async fn publish_ranking(&self) {
        let entries = self.ranking().await;
        self.sink.publish(SinkEvent::Ranking(RankingEvent { entries }));
    }

    pub async fn publish_stats(&self) {
        let stats = self.stats().await;
        self.sink.publish(SinkEvent::Stats(stats));
    }

    pub fn publish(&self, event: SinkEvent) {
        self.sink.publish(event);
    }

    /// Clear counts, history and session counters, then tell viewers.
    ///
    /// The seen-ledger is kept: records processed before the reset are still
    /// not processed twice.
    pub async fn reset(&self) {
        {
            let mut state = self.state.write().await;
            state.table.reset();
            state.history.clear();
            state.processed_total = 0;
            state.started_at = self.clock.now();
        }
        info!("Trend state reset");

        self.sink
            .publish(SinkEvent::Ranking(RankingEvent { entries: vec![] }));
        self.publish_stats().await;
    }
}
