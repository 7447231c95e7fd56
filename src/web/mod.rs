// Web server: Axum backend for live trend viewers.
//
// Viewers subscribe to GET /api/events (server-sent events) and can read
// the ranking, recent records and session counters as plain JSON. The
// server shares the TrendHub with the ingestion task; handlers only ever
// take its read lock, except POST /api/reset.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::broadcast::ChannelSink;
use crate::ranking::hub::TrendHub;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<TrendHub>,
    pub sink: Arc<ChannelSink>,
    /// Fires on shutdown; open event streams end when it does.
    pub shutdown: CancellationToken,
}

/// Start the Axum web server and block until `state.shutdown` fires.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Kotonami listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("Web server stopped");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/events", get(handlers::events::stream_events))
        .route("/api/keywords", get(handlers::keywords::list_keywords))
        .route("/api/records", get(handlers::records::list_records))
        .route("/api/stats", get(handlers::stats::get_stats))
        .route("/api/reset", post(handlers::stats::reset));

    Router::new()
        .merge(api)
        .route("/health", get(health))
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe. Always 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "Not found")
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
