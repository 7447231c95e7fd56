// GET /api/records: recently processed records, newest first.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

pub async fn list_records(State(state): State<AppState>) -> impl IntoResponse {
    let mut records = state.hub.recent().await;
    records.reverse();
    Json(serde_json::json!({ "records": records }))
}
