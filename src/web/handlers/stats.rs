// Session counters and the reset action.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.stats().await)
}

/// POST /api/reset: clear counts and history. Connected viewers receive
/// an empty ranking right away.
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.hub.reset().await;
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Trend state reset" })),
    )
}
