// GET /api/keywords: the current ranking.
//
// Optional ?limit= parameter (default 50, max 500).

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::web::AppState;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

#[derive(Deserialize, Default)]
pub struct KeywordsQuery {
    pub limit: Option<usize>,
}

pub async fn list_keywords(
    State(state): State<AppState>,
    Query(params): Query<KeywordsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let keywords = state.hub.top(limit).await;
    Json(serde_json::json!({ "keywords": keywords }))
}
