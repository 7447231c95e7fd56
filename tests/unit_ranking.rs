// Ranking tests: frequency table ordering, the recent-history ring and the
// hub's single-lock record processing.

use std::sync::Arc;

use chrono::Utc;

use kotonami::broadcast::{ChannelSink, SinkEvent};
use kotonami::ingest::clock::TokioClock;
use kotonami::lexicon::heuristic::HeuristicExtractor;
use kotonami::ranking::frequency::{FrequencyTable, RankedWord};
use kotonami::ranking::history::{ProcessedRecord, RecentHistory};
use kotonami::ranking::hub::{HubSettings, TrendHub};
use kotonami::source::Record;

fn ranked(word: &str, count: u64) -> RankedWord {
    RankedWord {
        word: word.to_string(),
        count,
    }
}

fn record(id: &str, text: &str) -> Record {
    Record {
        id: id.to_string(),
        text: text.to_string(),
        language_tag: Some("ja".to_string()),
        observed_at: Utc::now(),
        author: None,
        created_at: None,
    }
}

fn hub(settings: HubSettings) -> (TrendHub, Arc<ChannelSink>) {
    let sink = Arc::new(ChannelSink::new(64));
    let hub = TrendHub::new(settings, sink.clone(), Arc::new(TokioClock));
    (hub, sink)
}

// ============================================================
// FrequencyTable
// ============================================================

#[test]
fn two_records_mentioning_heiwa() {
    let mut table = FrequencyTable::new();
    table.increment_all(["平和", "祈"]);
    table.increment_all(["平和", "朝"]);

    assert_eq!(table.count("平和"), 2);
    assert_eq!(table.top(1), vec![ranked("平和", 2)]);
}

#[test]
fn counts_only_grow_between_resets() {
    let mut table = FrequencyTable::new();
    let words = ["東京", "平和", "東京", "朝", "東京", "平和"];
    let mut last = 0;
    for word in words {
        table.increment(word);
        let now = table.count("東京");
        assert!(now >= last);
        last = now;
    }
    assert_eq!(table.count("東京"), 3);
    assert_eq!(table.total(), words.len() as u64);
}

#[test]
fn top_is_sorted_descending_and_ties_keep_first_seen_order() {
    let mut table = FrequencyTable::new();
    table.increment_all(["夜", "朝", "昼", "朝", "昼", "朝"]);

    assert_eq!(
        table.top(10),
        vec![ranked("朝", 3), ranked("昼", 2), ranked("夜", 1)]
    );

    let mut tied = FrequencyTable::new();
    tied.increment_all(["b", "a", "c"]);
    let words: Vec<String> = tied.top(3).into_iter().map(|r| r.word).collect();
    assert_eq!(words, vec!["b", "a", "c"]);
}

#[test]
fn top_k_larger_than_table_returns_everything() {
    let mut table = FrequencyTable::new();
    table.increment_all(["朝"]);
    assert_eq!(table.top(50).len(), 1);
    assert!(table.top(0).is_empty());
    assert!(FrequencyTable::new().top(5).is_empty());
}

// ============================================================
// RecentHistory
// ============================================================

#[test]
fn history_keeps_the_newest_entries() {
    let mut history = RecentHistory::new(3);
    for i in 0..5 {
        history.push(ProcessedRecord {
            id: i.to_string(),
            author: None,
            text: String::new(),
            keywords: vec![],
            observed_at: Utc::now(),
        });
    }
    let ids: Vec<String> = history.snapshot().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["2", "3", "4"]);
}

// ============================================================
// TrendHub
// ============================================================

#[tokio::test]
async fn hub_counts_each_keyword_occurrence() {
    let (hub, _sink) = hub(HubSettings::default());
    let extractor = HeuristicExtractor::default();

    hub.process(&record("1", "平和を祈る"), &extractor).await;
    hub.process(&record("2", "平和と平和"), &extractor).await;

    assert_eq!(hub.count("平和").await, 3);
    assert_eq!(hub.top(1).await, vec![ranked("平和", 3)]);
}

#[tokio::test]
async fn hub_ledger_window_is_bounded() {
    let settings = HubSettings {
        ledger_capacity: 3,
        ..HubSettings::default()
    };
    let (hub, _sink) = hub(settings);
    let extractor = HeuristicExtractor::default();

    for id in ["a", "b", "c", "d"] {
        assert!(hub.process(&record(id, "朝"), &extractor).await.is_some());
    }
    // "a" fell out of the window, so it is admitted again.
    assert!(!hub.is_seen("a").await);
    assert!(hub.process(&record("a", "朝"), &extractor).await.is_some());
    assert!(hub.process(&record("d", "朝"), &extractor).await.is_none());
    assert_eq!(hub.count("朝").await, 5);
}

#[tokio::test]
async fn hub_ranking_uses_configured_top_k() {
    let settings = HubSettings {
        top_k: 2,
        ..HubSettings::default()
    };
    let (hub, _sink) = hub(settings);
    let extractor = HeuristicExtractor::default();
    hub.process(&record("1", "朝 昼 夜 東京"), &extractor).await;

    assert_eq!(hub.top_k(), 2);
    assert_eq!(hub.ranking().await.len(), 2);
}

#[tokio::test]
async fn hub_admitted_record_carries_keywords_and_total() {
    let (hub, _sink) = hub(HubSettings::default());
    let extractor = HeuristicExtractor::default();

    let first = hub.process(&record("1", "東京タワー"), &extractor).await.unwrap();
    let second = hub.process(&record("2", "朝"), &extractor).await.unwrap();

    assert_eq!(first.record.keywords, vec!["東京", "タワー"]);
    assert_eq!(first.processed_total, 1);
    assert_eq!(second.processed_total, 2);
}

#[tokio::test]
async fn reset_starts_a_fresh_session() {
    let (hub, sink) = hub(HubSettings::default());
    let extractor = HeuristicExtractor::default();
    hub.process(&record("1", "平和"), &extractor).await;
    hub.set_attempt_count(2).await;

    let mut rx = sink.subscribe();
    hub.reset().await;

    assert!(hub.ranking().await.is_empty());
    assert_eq!(hub.stats().await.processed_total, 0);
    assert!(matches!(rx.recv().await.unwrap(), SinkEvent::Ranking(r) if r.entries.is_empty()));
    assert!(matches!(rx.recv().await.unwrap(), SinkEvent::Stats(_)));

    // Already-seen ids stay seen.
    assert!(hub.process(&record("1", "平和"), &extractor).await.is_none());
    assert!(hub.process(&record("2", "平和"), &extractor).await.is_some());
    assert_eq!(hub.count("平和").await, 1);
}

#[tokio::test]
async fn concurrent_readers_see_whole_records() {
    let (hub, _sink) = hub(HubSettings::default());
    let hub = Arc::new(hub);
    let extractor = Arc::new(HeuristicExtractor::default());

    let writer = {
        let hub = hub.clone();
        let extractor = extractor.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                hub.process(&record(&i.to_string(), "東京 東京"), extractor.as_ref())
                    .await;
            }
        })
    };

    // Each record adds two, so a torn read would show an odd count.
    for _ in 0..200 {
        let count = hub.count("東京").await;
        assert_eq!(count % 2, 0, "saw half-applied record: {count}");
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
    assert_eq!(hub.count("東京").await, 400);
}
