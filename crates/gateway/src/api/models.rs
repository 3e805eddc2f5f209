use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use ul_domain::records::ModelRecord;
use ul_domain::Error;
use ul_store::manager::RenameRequest;
use ul_store::{ModelFilter, ModelRepository};

use super::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModelQuery {
    pub provider_id: Option<String>,
    #[serde(default = "d_true")]
    pub enabled_only: bool,
}

fn d_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RenameBody {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRenameBody {
    pub renames: Vec<RenameRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteBody {
    pub model_ids: Vec<String>,
}

/// `GET /api/v1/models`
pub async fn list_models(
    State(state): State<AppState>,
    Query(q): Query<ModelQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = ModelFilter {
        provider_id: q.provider_id.filter(|p| !p.is_empty()),
        enabled_only: q.enabled_only,
    };
    let models = state.store.list_models(&filter).await?;
    Ok(Json(serde_json::json!({
        "count": models.len(),
        "models": models,
    })))
}

/// `GET /api/v1/models/stats`
pub async fn statistics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.models.statistics().await?))
}

/// `GET /api/v1/models/:id`
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ModelRecord>> {
    let model = state
        .store
        .get_model(&id)
        .await?
        .ok_or_else(|| Error::not_found("model", id))?;
    Ok(Json(model))
}

/// `PUT /api/v1/models/:id/rename`
pub async fn rename_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RenameBody>,
) -> ApiResult<Json<ModelRecord>> {
    Ok(Json(state.models.rename(&id, &body.display_name).await?))
}

/// `POST /api/v1/models/batch-rename`
pub async fn batch_rename(
    State(state): State<AppState>,
    Json(body): Json<BatchRenameBody>,
) -> impl IntoResponse {
    Json(state.models.batch_rename(body.renames).await)
}

/// `DELETE /api/v1/models/:id`
pub async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.models.delete(&id).await?;
    Ok(Json(serde_json::json!({ "id": id, "enabled": false })))
}

/// `POST /api/v1/models/batch-delete`
pub async fn batch_delete(
    State(state): State<AppState>,
    Json(body): Json<BatchDeleteBody>,
) -> impl IntoResponse {
    Json(state.models.batch_delete(body.model_ids).await)
}
