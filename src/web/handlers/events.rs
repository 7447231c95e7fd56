// GET /api/events: server-sent event stream of live trend updates.
//
// A new viewer gets the current ranking first, then every event the
// ingestion loop publishes. Viewers that fall too far behind skip the
// events they missed instead of slowing ingestion down.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::broadcast::{RankingEvent, SinkEvent};
use crate::web::AppState;

pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before taking the snapshot so nothing published in between is lost.
    let rx = state.sink.subscribe();
    let snapshot = SinkEvent::Ranking(RankingEvent {
        entries: state.hub.ranking().await,
    });
    debug!(viewers = state.sink.receiver_count(), "SSE viewer connected");

    let live = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((event, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "SSE viewer lagged, skipping ahead");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let events = stream::once(async move { snapshot })
        .chain(live)
        .take_until(state.shutdown.clone().cancelled_owned())
        .map(|event| Ok(to_sse(&event)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// One SSE frame: `event:` is the event kind, `data:` the tagged JSON.
pub fn to_sse(event: &SinkEvent) -> Event {
    Event::default()
        .event(event.kind())
        .json_data(event)
        .unwrap_or_else(|_| Event::default().comment("unserializable event"))
}
