use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use ul_domain::records::{HealthStatus, Provider};
use ul_domain::Error;
use ul_store::ProviderRepository;

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// Provider as returned by the admin API. The credential is never echoed
/// back in full.
#[derive(Debug, Serialize)]
pub struct ProviderView {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub enabled: bool,
    pub priority: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Provider> for ProviderView {
    fn from(p: Provider) -> Self {
        Self {
            api_key: mask_key(&p.api_key),
            id: p.id,
            name: p.name,
            base_url: p.base_url,
            enabled: p.enabled,
            priority: p.priority,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{tail}", chars[..3].iter().collect::<String>())
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub enabled_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProviderRequest {
    /// Generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
}

fn require_non_empty(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} must not be empty"));
    }
}

fn check_provider(p: &Provider) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    require_non_empty(&mut errors, "id", &p.id);
    require_non_empty(&mut errors, "name", &p.name);
    require_non_empty(&mut errors, "base_url", &p.base_url);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors).into())
    }
}

async fn load(state: &AppState, id: &str) -> ApiResult<Provider> {
    state
        .store
        .get_provider(id)
        .await?
        .ok_or_else(|| Error::not_found("provider", id).into())
}

/// `GET /api/v1/providers`
pub async fn list_providers(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let providers: Vec<ProviderView> = state
        .store
        .list_providers(q.enabled_only)
        .await?
        .into_iter()
        .map(ProviderView::from)
        .collect();
    Ok(Json(serde_json::json!({
        "count": providers.len(),
        "providers": providers,
    })))
}

/// `POST /api/v1/providers`
///
/// Creates the provider, or replaces it when `id` names an existing one.
pub async fn upsert_provider(
    State(state): State<AppState>,
    Json(req): Json<ProviderRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = req
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let existed = state.store.get_provider(&id).await?.is_some();

    let mut provider = Provider::new(id, req.name.trim(), req.base_url.trim(), req.api_key);
    if let Some(enabled) = req.enabled {
        provider.enabled = enabled;
    }
    if let Some(priority) = req.priority {
        provider.priority = priority;
    }
    check_provider(&provider)?;

    let saved = state.store.upsert_provider(provider).await?;
    tracing::info!(provider_id = %saved.id, created = !existed, "provider saved");
    let status = if existed { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(ProviderView::from(saved))))
}

/// `GET /api/v1/providers/:id`
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProviderView>> {
    Ok(Json(load(&state, &id).await?.into()))
}

/// `PUT /api/v1/providers/:id`
pub async fn update_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ProviderUpdate>,
) -> ApiResult<Json<ProviderView>> {
    let mut provider = load(&state, &id).await?;
    if let Some(name) = update.name {
        provider.name = name.trim().to_string();
    }
    if let Some(base_url) = update.base_url {
        provider.base_url = base_url.trim().to_string();
    }
    if let Some(api_key) = update.api_key {
        provider.api_key = api_key;
    }
    if let Some(enabled) = update.enabled {
        provider.enabled = enabled;
    }
    if let Some(priority) = update.priority {
        provider.priority = priority;
    }
    check_provider(&provider)?;

    let saved = state.store.upsert_provider(provider).await?;
    tracing::info!(provider_id = %saved.id, "provider updated");
    Ok(Json(saved.into()))
}

/// `DELETE /api/v1/providers/:id`
///
/// Soft delete: the provider is disabled and drops out of routing.
pub async fn delete_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !state.store.soft_delete_provider(&id).await? {
        return Err(Error::not_found("provider", id).into());
    }
    tracing::info!(provider_id = %id, "provider disabled");
    Ok(Json(serde_json::json!({ "id": id, "enabled": false })))
}

/// `POST /api/v1/providers/:id/test`
pub async fn test_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.health.check_provider(&id).await;
    match outcome.status {
        HealthStatus::NotFound => Err(Error::not_found("provider", id).into()),
        HealthStatus::Error => Err(Error::Other(outcome.error.unwrap_or_default()).into()),
        _ => Ok(Json(outcome)),
    }
}

/// `POST /api/v1/providers/:id/refresh`
pub async fn refresh_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = state
        .discovery
        .refresh(Some(std::slice::from_ref(&id)))
        .await?;
    Ok(Json(report))
}

/// `POST /api/v1/discovery`
pub async fn run_discovery(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = state.discovery.refresh(None).await?;
    Ok(Json(report))
}
