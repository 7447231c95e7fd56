// Broadcast sink: the events the ingestion loop produces for viewers.
//
// The loop never talks to viewers directly. It publishes `SinkEvent`s into a
// `BroadcastSink`; the web layer (or the terminal printer) decides how they
// reach anyone. Events serialize as `{"type": ..., "data": ...}`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::ranking::frequency::RankedWord;
use crate::ranking::hub::Stats;

/// Keywords extracted from one admitted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordEvent {
    pub record_id: String,
    pub author: Option<String>,
    pub text: String,
    /// Distinct keywords in order of first appearance.
    pub keywords: Vec<String>,
    pub observed_at: DateTime<Utc>,
}

/// Current top-K ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEvent {
    pub entries: Vec<RankedWord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Source connectivity change, so viewers can explain gaps in delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionEvent {
    pub status: ConnectionStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SinkEvent {
    Keyword(KeywordEvent),
    Ranking(RankingEvent),
    Connection(ConnectionEvent),
    Stats(Stats),
}

impl SinkEvent {
    /// Event name used for the SSE `event:` field.
    pub fn kind(&self) -> &'static str {
        match self {
            SinkEvent::Keyword(_) => "keyword",
            SinkEvent::Ranking(_) => "ranking",
            SinkEvent::Connection(_) => "connection",
            SinkEvent::Stats(_) => "stats",
        }
    }
}

/// Anything that can accept events from the ingestion loop.
///
/// `publish` must not block: the loop calls it between fetches and a slow
/// viewer must never stall ingestion.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, event: SinkEvent);
}

/// Fan-out over a tokio broadcast channel.
///
/// Receivers that fall more than `capacity` events behind skip ahead
/// (`RecvError::Lagged`) rather than slowing the sender down.
pub struct ChannelSink {
    tx: broadcast::Sender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl BroadcastSink for ChannelSink {
    fn publish(&self, event: SinkEvent) {
        let kind = event.kind();
        // Err only means nobody is listening right now.
        if self.tx.send(event).is_err() {
            trace!(kind, "No subscribers for event");
        }
    }
}
