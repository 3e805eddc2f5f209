//! Read-only views of the routing plan as it would be built right now.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use ul_routing::engine::PlanStats;

use super::ApiResult;
use crate::state::AppState;

/// `GET /api/v1/mappings`
pub async fn plan(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let plan = state.engine.build().await?;
    Ok(Json(serde_json::json!({
        "stats": PlanStats::from(&plan),
        "plan": plan,
    })))
}

/// `GET /api/v1/mappings/groups`
pub async fn groups(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let groups = state.engine.build().await?.groups_by_name();
    Ok(Json(serde_json::json!({
        "count": groups.len(),
        "groups": groups,
    })))
}

/// `GET /api/v1/mappings/splits`
pub async fn splits(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let splits = state.engine.build().await?.splits();
    Ok(Json(serde_json::json!({
        "count": splits.len(),
        "providers": splits,
    })))
}
