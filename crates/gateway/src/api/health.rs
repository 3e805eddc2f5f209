use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use super::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "d_history_limit")]
    pub limit: usize,
}

fn d_history_limit() -> usize {
    50
}

/// `GET /api/v1/health`
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /api/v1/health/providers`
pub async fn statistics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.health.statistics().await?))
}

/// `GET /api/v1/health/providers/:id/history`
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let records = state.health.history(&id, q.limit).await?;
    Ok(Json(serde_json::json!({
        "provider_id": id,
        "count": records.len(),
        "history": records,
    })))
}

/// `POST /api/v1/health/check`
pub async fn check_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.health.check_all().await?))
}
