use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use ul_domain::Error;
use ul_routing::{validate_document, DocumentKind};

use super::ApiResult;
use crate::state::AppState;

/// Body of `POST /api/v1/config/validate`. The document is given either as
/// parsed JSON or as raw YAML text.
#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    pub kind: DocumentKind,
    #[serde(default)]
    pub document: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Option<String>,
}

/// `POST /api/v1/config/generate`
pub async fn generate(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.engine.generate().await?))
}

/// `GET /api/v1/config/preview`
pub async fn preview(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.engine.preview().await?))
}

/// `POST /api/v1/config/validate`
pub async fn validate(Json(body): Json<ValidateBody>) -> ApiResult<impl IntoResponse> {
    let doc = match (body.document, body.content) {
        (Some(doc), _) => doc,
        (None, Some(text)) => serde_yaml::from_str::<serde_json::Value>(&text)
            .map_err(|e| Error::validation(format!("content is not valid YAML: {e}")))?,
        (None, None) => {
            return Err(Error::validation("either 'document' or 'content' is required").into())
        }
    };
    Ok(Json(validate_document(&doc, body.kind)))
}

/// `POST /api/v1/config/apply`
pub async fn apply(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.downstream.apply().await)
}
